//! This module turns store snapshots into typed, normalized collections.
//!
//! A snapshot of a collection is a mapping from record id to record body. Decoding it never fails:
//! a missing snapshot is an empty collection, and bodies that are not objects are skipped (and logged).
//! Fields of the wrong type are read leniently, so a record is never dropped because of one of its fields.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::record::RecordId;
use crate::store::Snapshot;
use crate::traits::Record;

pub mod changes;
pub mod live;

pub use changes::{change_channel, ChangeEvent, ChangeLog, ChangeReceiver, ChangeSender};
pub use live::LiveCollection;

/// Records of one kind, keyed by id (in id order)
#[derive(Clone, Debug, PartialEq)]
pub struct Collection<R: Record> {
    items: BTreeMap<RecordId, R>,
}

impl<R: Record> Default for Collection<R> {
    fn default() -> Self {
        Self { items: BTreeMap::new() }
    }
}

impl<R: Record> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.items.keys()
    }

    /// Insert a record, replacing the one that had the same id (if any)
    pub fn insert(&mut self, record: R) -> Option<R> {
        self.items.insert(record.id().clone(), record)
    }

    pub fn remove(&mut self, id: &RecordId) -> Option<R> {
        self.items.remove(id)
    }

    /// Compares two collections to check they have the same records
    pub fn has_same_contents_as(&self, other: &Self) -> bool {
        if crate::utils::keys_are_the_same(&self.items, &other.items) == false {
            return false;
        }
        for (id, item) in &self.items {
            if other.items.get(id) != Some(item) {
                log::debug!("{} {} differs", R::KIND, id);
                return false;
            }
        }
        true
    }
}

impl<R: Record> std::iter::FromIterator<R> for Collection<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut collection = Self::new();
        for record in iter {
            collection.insert(record);
        }
        collection
    }
}

impl<'a, R: Record> IntoIterator for &'a Collection<R> {
    type Item = &'a R;
    type IntoIter = std::collections::btree_map::Values<'a, RecordId, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}



/// Decode a single record body. The key is authoritative for the id, whatever the body says.
pub fn decode_record<R: Record>(id: RecordId, body: Value) -> Result<R, serde_json::Error> {
    let mut record: R = serde_json::from_value(body)?;
    record.set_id(id);
    Ok(record)
}

/// The body of a record, as it is written to the store (without its id)
pub fn encode_record<R: Record>(record: &R) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Unavailable(format!("{} {} does not encode to an object: {}", R::KIND, record.id(), other))),
    }
}

/// Decode a snapshot of a whole collection
pub fn decode_snapshot<R: Record>(snapshot: &Snapshot) -> Collection<R> {
    let mut collection = Collection::new();
    let value = match snapshot.value() {
        None => {
            log::debug!("No {} collection in the store", R::KIND);
            return collection;
        },
        Some(value) => value,
    };

    let entries: Vec<(RecordId, &Value)> = match value {
        Value::Object(map) => map.iter()
            .map(|(key, body)| (RecordId::from(key.as_str()), body))
            .collect(),
        // Collections keyed by small integers may be delivered as arrays, with holes as nulls
        Value::Array(list) => list.iter()
            .enumerate()
            .filter(|(_, body)| body.is_null() == false)
            .map(|(index, body)| (RecordId::from(index.to_string()), body))
            .collect(),
        other => {
            log::warn!("Expected a {} collection, got {}. Ignoring it", R::KIND, other);
            return collection;
        },
    };

    for (id, body) in entries {
        if body.is_object() == false {
            log::warn!("{} {} is not an object: {}. Skipping it", R::KIND, id, body);
            continue;
        }
        match decode_record::<R>(id.clone(), body.clone()) {
            Ok(record) => { collection.insert(record); },
            Err(err) => {
                log::warn!("Unable to decode {} {}: {}. Skipping it", R::KIND, id, err);
            },
        }
    }
    log::trace!("Decoded {} {} records", collection.len(), R::KIND);
    collection
}
