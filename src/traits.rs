use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, ValidationError};
use crate::record::RecordId;
use crate::store::{OnError, OnValue, Snapshot, StorePath, Subscription};

/// A realtime key-value store, organised as a tree of JSON values addressed by [`StorePath`]s.
///
/// Handles to a store are constructed explicitly and shared (e.g. in an `Arc`) by whatever needs them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the whole value at `path`
    async fn read(&self, path: &StorePath) -> Result<Snapshot, StoreError>;
    /// Replace the value at `path`. Writing `null` removes it.
    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;
    /// Merge the given keys into the object at `path`. Keys set to `null` are removed.
    async fn patch(&self, path: &StorePath, partial: Map<String, Value>) -> Result<(), StoreError>;
    /// Remove the value at `path`
    async fn delete(&self, path: &StorePath) -> Result<(), StoreError>;
    /// Atomically increment the counter at `path` (a missing counter counts as 0) and return its new value
    async fn increment(&self, path: &StorePath) -> Result<u64, StoreError>;

    /// Start listening to `path`.
    ///
    /// `on_value` receives the whole value at `path` once the listener is attached, and then after every change.
    /// It never receives deltas.
    fn subscribe(&self, path: &StorePath, on_value: OnValue, on_error: OnError) -> Subscription;
}

/// A typed record living in a collection of the store, keyed by its [`RecordId`].
///
/// The id is the key of the record in its collection and is not part of its serialized body.
pub trait Record: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The user-editable fields of this record
    type Draft: Clone + Debug + Send + Sync;

    /// A short name of this kind of record, used in log messages
    const KIND: &'static str;

    fn id(&self) -> &RecordId;
    /// Used when decoding a record, whose body does not contain its key
    fn set_id(&mut self, id: RecordId);

    /// Check a draft can be submitted
    fn validate(draft: &Self::Draft) -> Result<(), ValidationError>;
    /// Build a brand new record. This is the only place creation dates are set.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    /// Apply the editable fields of `draft`, keeping the identity (id, creation date) of `self`
    fn apply_draft(&self, draft: Self::Draft) -> Self;
}
