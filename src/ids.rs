//! How new records get their id

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::record::RecordId;
use crate::store::StorePath;
use crate::traits::RecordStore;

/// Generates timestamp tokens: the number of milliseconds since the Unix epoch.
///
/// Two tokens generated during the same millisecond (or while the clock goes backwards) are still distinct and increasing.
#[derive(Clone, Debug, Default)]
pub struct TimestampIds {
    last: i64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> RecordId {
        let millis = now.timestamp_millis();
        self.last = if millis > self.last { millis } else { self.last + 1 };
        RecordId::from(self.last.to_string())
    }
}

/// The way a repository allocates ids for the records it creates
#[derive(Clone, Debug)]
pub enum IdStrategy {
    /// Timestamp tokens, e.g. `"1678912345000"`
    Timestamp(TimestampIds),
    /// A counter kept in the store, zero-padded to `width` digits, e.g. `"003"`
    Counter { path: StorePath, width: usize },
    /// Random UUIDs
    Random,
}

impl IdStrategy {
    pub fn timestamp() -> Self {
        IdStrategy::Timestamp(TimestampIds::new())
    }

    pub fn counter(path: StorePath, width: usize) -> Self {
        IdStrategy::Counter { path, width }
    }

    /// Allocate an id. Only counters need to talk to the store.
    pub async fn next_id<S>(&mut self, store: &S, now: DateTime<Utc>) -> Result<RecordId, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        match self {
            IdStrategy::Timestamp(ids) => Ok(ids.next(now)),
            IdStrategy::Counter { path, width } => {
                let value = store.increment(path).await?;
                Ok(RecordId::from(format!("{:0width$}", value, width = *width)))
            },
            IdStrategy::Random => {
                Ok(RecordId::from(uuid::Uuid::new_v4().to_hyphenated().to_string()))
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::store::memory_store::MemoryStore;

    #[test]
    fn timestamp_tokens_are_increasing() {
        let mut ids = TimestampIds::new();
        let now = Utc.timestamp_millis_opt(1678912345000).unwrap();
        assert_eq!(ids.next(now).as_str(), "1678912345000");
        assert_eq!(ids.next(now).as_str(), "1678912345001");
        let earlier = Utc.timestamp_millis_opt(1678912344000).unwrap();
        assert_eq!(ids.next(earlier).as_str(), "1678912345002");
    }

    #[tokio::test]
    async fn counters_are_padded() {
        let store = MemoryStore::new();
        let mut ids = IdStrategy::counter(StorePath::parse("counters/jobs").unwrap(), 3);
        let now = Utc::now();
        assert_eq!(ids.next_id(&store, now).await.unwrap().as_str(), "001");
        assert_eq!(ids.next_id(&store, now).await.unwrap().as_str(), "002");

        let mut random = IdStrategy::Random;
        let a = random.next_id(&store, now).await.unwrap();
        let b = random.next_id(&store, now).await.unwrap();
        assert!(a != b);
    }
}
