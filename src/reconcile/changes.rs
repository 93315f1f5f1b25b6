//! Utilities to tell watchers what happened to a collection

use std::fmt::{Display, Error, Formatter};

use crate::record::RecordId;

/// The last thing that happened to a collection
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// Nothing happened yet
    Idle,
    /// The collection has been (re)loaded from the store
    Loaded { count: usize },
    /// A subscription delivered a new value for the whole collection
    Replaced { count: usize },
    Created(RecordId),
    Updated(RecordId),
    Deleted(RecordId),
    /// An operation failed. The collection is unchanged
    Failed { reason: String },
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            ChangeEvent::Idle => write!(f, "Idle"),
            ChangeEvent::Loaded{count} => write!(f, "Loaded {} records", count),
            ChangeEvent::Replaced{count} => write!(f, "Received {} records", count),
            ChangeEvent::Created(id) => write!(f, "Created {}", id),
            ChangeEvent::Updated(id) => write!(f, "Updated {}", id),
            ChangeEvent::Deleted(id) => write!(f, "Deleted {}", id),
            ChangeEvent::Failed{reason} => write!(f, "Operation failed: {}", reason),
        }
    }
}

impl Default for ChangeEvent {
    fn default() -> Self {
        Self::Idle
    }
}



/// See [`change_channel`]
pub type ChangeSender = tokio::sync::watch::Sender<ChangeEvent>;
/// See [`change_channel`]
pub type ChangeReceiver = tokio::sync::watch::Receiver<ChangeEvent>;

/// Create a change channel, that can be used to follow the last change of a collection
pub fn change_channel() -> (ChangeSender, ChangeReceiver) {
    tokio::sync::watch::channel(ChangeEvent::default())
}



/// Logs what happens to a collection, and publishes it to the watchers of the collection
#[derive(Debug)]
pub struct ChangeLog {
    n_failures: u32,
    sender: ChangeSender,
    /// Kept so that the channel stays open even when nobody watches it
    receiver: ChangeReceiver,
}

impl ChangeLog {
    pub fn new() -> Self {
        let (sender, receiver) = change_channel();
        Self { n_failures: 0, sender, receiver }
    }

    /// A new receiver, that sees the last event and every further one
    pub fn subscribe(&self) -> ChangeReceiver {
        self.receiver.clone()
    }

    /// The number of failures logged so far
    pub fn failures(&self) -> u32 {
        self.n_failures
    }

    /// Log a failure as a warning, and publish it
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.n_failures += 1;
        self.feedback(ChangeEvent::Failed { reason: text.to_string() });
    }
    /// Log an info
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
    /// Send an event to the watchers.
    pub fn feedback(&mut self, event: ChangeEvent) {
        // This cannot fail, since `self.receiver` is alive
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchers_see_the_last_event() {
        let mut log = ChangeLog::new();
        let watcher = log.subscribe();
        assert_eq!(*watcher.borrow(), ChangeEvent::Idle);

        log.feedback(ChangeEvent::Loaded { count: 2 });
        log.feedback(ChangeEvent::Deleted(RecordId::from("1678912345001")));
        assert_eq!(*watcher.borrow(), ChangeEvent::Deleted(RecordId::from("1678912345001")));
        assert_eq!(log.failures(), 0);

        log.warn("Unable to reach the store");
        assert_eq!(log.failures(), 1);
        assert!(matches!(&*watcher.borrow(), ChangeEvent::Failed { .. }));
        assert_eq!(watcher.borrow().to_string(), "Operation failed: Unable to reach the store");
    }
}
