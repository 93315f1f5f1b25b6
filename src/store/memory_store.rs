//! An in-process record store

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::mock_behaviour::MockBehaviour;
use crate::store::{OnError, OnValue, Snapshot, StorePath, Subscription};
use crate::traits::RecordStore;

/// A call received by a [`MemoryStore`], as recorded in its journal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    Read(String),
    Write(String),
    Patch(String),
    Delete(String),
    Increment(String),
}

struct Listener {
    path: StorePath,
    on_value: OnValue,
}

#[derive(Default)]
struct Inner {
    root: Value,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
    behaviour: MockBehaviour,
    journal: Vec<StoreCall>,
}

/// A [`RecordStore`] that keeps its whole tree in memory.
///
/// It follows the semantics of a realtime database: writing `null` removes a node, empty objects are pruned,
/// and listeners receive the whole value at their path whenever something under (or above) it changes.
/// Clones share the same tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose root holds `root`
    pub fn with_root(root: Value) -> Self {
        let store = Self::new();
        store.lock().root = root;
        store
    }

    /// Change how this store behaves (e.g. to make the next calls fail)
    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.lock().behaviour = behaviour;
    }

    /// Every call received so far
    pub fn journal(&self) -> Vec<StoreCall> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// The current value at `path`, bypassing the journal and the mock behaviour
    pub fn peek(&self, path: &StorePath) -> Value {
        value_at(&self.lock().root, path).cloned().unwrap_or(Value::Null)
    }

    /// How many listeners are currently attached
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Run a mutation, then notify the listeners that can see it
    fn mutate<F>(&self, path: &StorePath, call: StoreCall, check: fn(&mut MockBehaviour) -> Result<(), StoreError>, mutation: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Value) -> Result<(), StoreError>,
    {
        let notifications = {
            let mut inner = self.lock();
            inner.journal.push(call);
            check(&mut inner.behaviour)?;
            mutation(&mut inner.root)?;
            prune(&mut inner.root);
            pending_notifications(&inner, path)
        };
        // Listeners are called without holding the lock, so that they can use the store themselves
        for (on_value, snapshot) in notifications {
            on_value(snapshot);
        }
        Ok(())
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn pending_notifications(inner: &Inner, changed: &StorePath) -> Vec<(OnValue, Snapshot)> {
    inner.listeners
        .values()
        .filter(|listener| listener.path.overlaps(changed))
        .map(|listener| {
            let value = value_at(&inner.root, &listener.path).cloned().unwrap_or(Value::Null);
            (Arc::clone(&listener.on_value), Snapshot::from_value(value))
        })
        .collect()
}

fn value_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    match current {
        Value::Null => None,
        v => Some(v),
    }
}

/// Get a mutable reference to the value at `path`, creating intermediate objects (and replacing scalars) on the way
fn value_at_mut<'a>(root: &'a mut Value, path: &StorePath) -> &'a mut Value {
    let mut current = root;
    for segment in path.segments() {
        if current.is_object() == false {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            _ => unreachable!("we have just made sure this is an object"),
        };
    }
    current
}

/// Remove nulls and empty objects, the way a realtime database never stores them
fn prune(value: &mut Value) {
    if let Value::Object(map) = value {
        for child in map.values_mut() {
            prune(child);
        }
        map.retain(|_, child| match child {
            Value::Null => false,
            Value::Object(m) => m.is_empty() == false,
            _ => true,
        });
        if map.is_empty() {
            *value = Value::Null;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Snapshot, StoreError> {
        let mut inner = self.lock();
        inner.journal.push(StoreCall::Read(path.to_string()));
        inner.behaviour.can_read()?;
        let value = value_at(&inner.root, path).cloned().unwrap_or(Value::Null);
        Ok(Snapshot::from_value(value))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.mutate(path, StoreCall::Write(path.to_string()), MockBehaviour::can_write, |root| {
            *value_at_mut(root, path) = value;
            Ok(())
        })
    }

    async fn patch(&self, path: &StorePath, partial: Map<String, Value>) -> Result<(), StoreError> {
        self.mutate(path, StoreCall::Patch(path.to_string()), MockBehaviour::can_patch, |root| {
            let target = value_at_mut(root, path);
            if target.is_object() == false {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                for (key, value) in partial {
                    if value.is_null() {
                        map.remove(&key);
                    } else {
                        map.insert(key, value);
                    }
                }
            }
            Ok(())
        })
    }

    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        self.mutate(path, StoreCall::Delete(path.to_string()), MockBehaviour::can_delete, |root| {
            if path.is_root() {
                *root = Value::Null;
            } else if let Some(target) = existing_value_mut(root, path) {
                *target = Value::Null;
            }
            Ok(())
        })
    }

    async fn increment(&self, path: &StorePath) -> Result<u64, StoreError> {
        let mut new_value = 0;
        self.mutate(path, StoreCall::Increment(path.to_string()), MockBehaviour::can_increment, |root| {
            let target = value_at_mut(root, path);
            let current = match target {
                Value::Null => 0,
                Value::Number(n) => n.as_u64().ok_or_else(|| StoreError::NotACounter { path: path.to_string() })?,
                _ => return Err(StoreError::NotACounter { path: path.to_string() }),
            };
            new_value = current + 1;
            *target = Value::from(new_value);
            Ok(())
        })?;
        Ok(new_value)
    }

    fn subscribe(&self, path: &StorePath, on_value: OnValue, on_error: OnError) -> Subscription {
        let (listener_id, initial) = {
            let mut inner = self.lock();
            if let Err(err) = inner.behaviour.can_subscribe() {
                drop(inner);
                on_error(err);
                return Subscription::inactive();
            }
            let listener_id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.insert(listener_id, Listener {
                path: path.clone(),
                on_value: Arc::clone(&on_value),
            });
            let value = value_at(&inner.root, path).cloned().unwrap_or(Value::Null);
            (listener_id, Snapshot::from_value(value))
        };
        on_value(initial);

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_inner(&inner).listeners.remove(&listener_id);
            }
        })
    }
}

/// Like `value_at_mut`, but without creating anything
fn existing_value_mut<'a>(root: &'a mut Value, path: &StorePath) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn path(p: &str) -> StorePath {
        StorePath::parse(p).unwrap()
    }

    #[tokio::test]
    async fn write_read_and_prune() {
        let store = MemoryStore::new();
        assert!(store.read(&path("ServiceSync")).await.unwrap().exists() == false);

        store.write(&path("ServiceSync/1"), json!({"title": "Fix sink"})).await.unwrap();
        let snap = store.read(&path("ServiceSync")).await.unwrap();
        assert_eq!(snap.value(), Some(&json!({"1": {"title": "Fix sink"}})));

        store.delete(&path("ServiceSync/1")).await.unwrap();
        assert!(store.read(&path("ServiceSync")).await.unwrap().exists() == false);
        assert_eq!(store.peek(&StorePath::root()), Value::Null);
    }

    #[tokio::test]
    async fn patch_merges_and_removes_nulls() {
        let store = MemoryStore::with_root(json!({"jobs": {"001": {"status": "Pending", "end": "x"}}}));
        let mut partial = Map::new();
        partial.insert("status".into(), json!("Completed"));
        partial.insert("end".into(), Value::Null);
        store.patch(&path("jobs/001"), partial).await.unwrap();
        assert_eq!(store.peek(&path("jobs/001")), json!({"status": "Completed"}));
    }

    #[tokio::test]
    async fn counters() {
        let store = MemoryStore::new();
        assert_eq!(store.increment(&path("counters/jobs")).await.unwrap(), 1);
        assert_eq!(store.increment(&path("counters/jobs")).await.unwrap(), 2);
        store.write(&path("counters/bad"), json!("three")).await.unwrap();
        assert!(store.increment(&path("counters/bad")).await.is_err());
    }

    #[tokio::test]
    async fn journal_and_failures() {
        let store = MemoryStore::new();
        store.set_behaviour(MockBehaviour { write_behaviour: (0, 1), ..MockBehaviour::default() });
        assert!(store.write(&path("jobs/1"), json!({"a": 1})).await.is_err());
        assert_eq!(store.peek(&path("jobs")), Value::Null);
        store.write(&path("jobs/1"), json!({"a": 1})).await.unwrap();
        assert_eq!(store.journal(), vec![
            StoreCall::Write("jobs/1".to_string()),
            StoreCall::Write("jobs/1".to_string()),
        ]);
    }

    #[tokio::test]
    async fn listeners_receive_whole_values() {
        let store = MemoryStore::new();
        let received = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let mut sub = store.subscribe(
            &path("jobs"),
            Arc::new(move |snap: Snapshot| sink.lock().unwrap().push(snap)),
            Arc::new(|_err: StoreError| {}),
        );
        store.write(&path("jobs/1"), json!({"a": 1})).await.unwrap();
        store.write(&path("employees/1"), json!({"name": "Bob"})).await.unwrap();
        store.write(&path("jobs/2"), json!({"a": 2})).await.unwrap();
        sub.unsubscribe();
        sub.unsubscribe();
        store.write(&path("jobs/3"), json!({"a": 3})).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0], Snapshot::Missing);
        assert_eq!(received[2], Snapshot::Present(json!({"1": {"a": 1}, "2": {"a": 2}})));
        assert_eq!(store.listener_count(), 0);
    }
}
