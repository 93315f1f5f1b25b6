//! Collections kept up to date by a store subscription

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::error::StoreError;
use crate::reconcile::{decode_snapshot, ChangeEvent, ChangeLog, ChangeReceiver, Collection};
use crate::store::{OnError, OnValue, Snapshot, StorePath, Subscription};
use crate::traits::{Record, RecordStore};

struct Shared<R: Record> {
    collection: Collection<R>,
    log: ChangeLog,
    detached: bool,
}

fn lock<R: Record>(state: &Mutex<Shared<R>>) -> MutexGuard<'_, Shared<R>> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A collection that mirrors a store location.
///
/// Every value delivered by the subscription replaces the whole collection.
/// Values delivered after [`LiveCollection::detach`] (or after this is dropped) are ignored.
///
/// Do not write to a synchronous store (e.g. a [`MemoryStore`](crate::store::memory_store::MemoryStore)) from within [`LiveCollection::with`]:
/// the store would call back into this collection while it is locked.
pub struct LiveCollection<R: Record> {
    path: StorePath,
    state: Arc<Mutex<Shared<R>>>,
    subscription: Subscription,
    receiver: ChangeReceiver,
}

impl<R: Record> LiveCollection<R> {
    /// Subscribe to `path`
    pub fn attach<S>(store: &S, path: &StorePath) -> Self
    where
        S: RecordStore + ?Sized,
    {
        let log = ChangeLog::new();
        let receiver = log.subscribe();
        let state = Arc::new(Mutex::new(Shared {
            collection: Collection::new(),
            log,
            detached: false,
        }));

        let weak = Arc::downgrade(&state);
        let on_value: OnValue = Arc::new(move |snapshot: Snapshot| replace_collection(&weak, &snapshot));
        let weak = Arc::downgrade(&state);
        let value_path = path.clone();
        let on_error: OnError = Arc::new(move |err: StoreError| report_error(&weak, &value_path, err));

        log::debug!("Attaching a live {} collection to {}", R::KIND, path);
        let subscription = store.subscribe(path, on_value, on_error);
        Self { path: path.clone(), state, subscription, receiver }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// A copy of the current content
    pub fn current(&self) -> Collection<R> {
        lock(&self.state).collection.clone()
    }

    /// Run `f` on the current content, without copying it
    pub fn with<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Collection<R>) -> T,
    {
        f(&lock(&self.state).collection)
    }

    /// Follow the changes of this collection
    pub fn changes(&self) -> ChangeReceiver {
        self.receiver.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_active() && lock(&self.state).detached == false
    }

    /// Stop following the store. This can safely be called several times.
    pub fn detach(&mut self) {
        if self.subscription.is_active() {
            log::debug!("Detaching the live {} collection from {}", R::KIND, self.path);
        }
        lock(&self.state).detached = true;
        self.subscription.unsubscribe();
    }
}

impl<R: Record> Drop for LiveCollection<R> {
    fn drop(&mut self) {
        self.detach();
    }
}

fn replace_collection<R: Record>(state: &Weak<Mutex<Shared<R>>>, snapshot: &Snapshot) {
    let state = match state.upgrade() {
        None => return,
        Some(state) => state,
    };
    let collection = decode_snapshot::<R>(snapshot);
    let mut shared = lock(&state);
    if shared.detached {
        log::trace!("Ignoring a {} snapshot delivered after detaching", R::KIND);
        return;
    }
    let count = collection.len();
    shared.collection = collection;
    shared.log.feedback(ChangeEvent::Replaced { count });
}

fn report_error<R: Record>(state: &Weak<Mutex<Shared<R>>>, path: &StorePath, err: StoreError) {
    match state.upgrade() {
        None => log::debug!("Ignoring an error from a detached {} subscription: {}", R::KIND, err),
        Some(state) => {
            let mut shared = lock(&state);
            if shared.detached == false {
                shared.log.warn(&format!("Unable to follow {} collection {}: {}", R::KIND, path, err));
            }
        },
    }
}
