//! Record store plumbing: paths, snapshots and subscriptions.
//!
//! Two [`RecordStore`](crate::traits::RecordStore) implementations live here:
//! an in-process [`MemoryStore`](memory_store::MemoryStore), and a [`RestStore`](rest_store::RestStore) that talks to a realtime database over HTTP.

pub mod memory_store;
pub mod rest_store;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;

/// Characters a key of a realtime database cannot contain
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '$', '#', '[', ']', '/'];

/// A hierarchical location in the store, e.g. `ServiceSync/1678912345000`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the store
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parse a slash-separated path. Leading, trailing and repeated slashes are ignored.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| s.is_empty() == false) {
            if segment.contains(FORBIDDEN_KEY_CHARS) {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Build the path of a direct child
    pub fn child(&self, key: &str) -> Result<Self, StoreError> {
        if key.is_empty() || key.contains(FORBIDDEN_KEY_CHARS) {
            return Err(StoreError::InvalidPath(format!("{}/{}", self, key)));
        }
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is `other`, or one of its ancestors
    pub fn contains(&self, other: &StorePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether a change at one of these paths is visible from the other one
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl Display for StorePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}



/// A point-in-time read of a store location
#[derive(Clone, Debug, PartialEq)]
pub enum Snapshot {
    /// Nothing is stored at this location
    Missing,
    /// The whole value stored at this location
    Present(Value),
}

impl Snapshot {
    /// A `null` value means the location does not exist
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Snapshot::Missing,
            value => Snapshot::Present(value),
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, Snapshot::Present(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Snapshot::Missing => None,
            Snapshot::Present(v) => Some(v),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Snapshot::Missing => Value::Null,
            Snapshot::Present(v) => v,
        }
    }
}



/// Called with the whole value at the subscribed location, every time it changes
pub type OnValue = Arc<dyn Fn(Snapshot) + Send + Sync>;
/// Called when the subscription cannot deliver values
pub type OnError = Arc<dyn Fn(StoreError) + Send + Sync>;

/// A live listener on a store location.
///
/// Dropping it detaches the listener. [`Subscription::unsubscribe`] can be called any number of times.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { detach: Some(Box::new(detach)) }
    }

    /// A subscription that never delivers anything (e.g. when it could not be set up)
    pub fn inactive() -> Self {
        Self { detach: None }
    }

    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn paths() {
        let path = StorePath::parse("/ServiceSync//1678912345000/").unwrap();
        assert_eq!(path.to_string(), "ServiceSync/1678912345000");
        assert_eq!(path.segments().len(), 2);

        let collection = StorePath::parse("ServiceSync").unwrap();
        assert!(collection.contains(&path));
        assert!(path.contains(&collection) == false);
        assert!(path.overlaps(&collection));
        assert!(StorePath::root().contains(&path));
        assert!(StorePath::parse("jobs").unwrap().overlaps(&path) == false);

        assert!(StorePath::parse("jobs/a.b").is_err());
        assert!(collection.child("x#y").is_err());
        assert!(collection.child("").is_err());
    }

    #[test]
    fn snapshots() {
        assert!(Snapshot::from_value(Value::Null).exists() == false);
        let snap = Snapshot::from_value(serde_json::json!({"a": 1}));
        assert!(snap.exists());
        assert_eq!(snap.value(), Some(&serde_json::json!({"a": 1})));
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut sub = Subscription::new(move || { counter.fetch_add(1, Ordering::SeqCst); });
        assert!(sub.is_active());
        sub.unsubscribe();
        sub.unsubscribe();
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
