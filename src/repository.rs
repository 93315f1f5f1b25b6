//! Repositories own a normalized collection and keep it in line with the store.
//!
//! Local state is only changed once the store has confirmed a mutation, so that a failed write
//! never leaves the local collection diverged from the store.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::employee::Employee;
use crate::error::{RepositoryError, StoreError};
use crate::ids::IdStrategy;
use crate::job::Job;
use crate::reconcile::{decode_snapshot, encode_record, ChangeEvent, ChangeLog, ChangeReceiver, Collection};
use crate::record::RecordId;
use crate::store::StorePath;
use crate::task::Task;
use crate::traits::{Record, RecordStore};

/// A repository of calendar tasks
pub type TaskRepository<S> = Repository<Task, S>;
/// A repository of jobs
pub type JobRepository<S> = Repository<Job, S>;
/// A repository of employees
pub type EmployeeRepository<S> = Repository<Employee, S>;

/// How many ids a creation may try before giving up, when generated ids collide with existing records
const MAX_ID_ATTEMPTS: usize = 16;

/// The records of one collection of the store (e.g. every task under `ServiceSync/`)
pub struct Repository<R, S>
where
    R: Record,
    S: RecordStore + ?Sized,
{
    store: Arc<S>,
    path: StorePath,
    ids: IdStrategy,
    items: Collection<R>,
    log: ChangeLog,
}

impl<R, S> Repository<R, S>
where
    R: Record,
    S: RecordStore + ?Sized,
{
    /// Create an empty repository. Call [`Self::load`] to populate it.
    pub fn new(store: Arc<S>, path: StorePath, ids: IdStrategy) -> Self {
        Self {
            store,
            path,
            ids,
            items: Collection::new(),
            log: ChangeLog::new(),
        }
    }

    pub fn path(&self) -> &StorePath    { &self.path }
    pub fn store(&self) -> &Arc<S>      { &self.store }
    pub fn items(&self) -> &Collection<R> { &self.items }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.items.get(id)
    }

    /// Follow what happens to this repository
    pub fn changes(&self) -> ChangeReceiver {
        self.log.subscribe()
    }

    /// The number of store failures this repository has run into
    pub fn failures(&self) -> u32 {
        self.log.failures()
    }

    /// Fetch the whole collection from the store, and replace the local state with it.
    ///
    /// In case the store cannot be read, the local state is left untouched, a warning is logged and `false` is returned.
    pub async fn load(&mut self) -> bool {
        let snapshot = match self.store.read(&self.path).await {
            Err(err) => {
                self.log.warn(&format!("Unable to load the {} collection at {}: {}. Keeping the current state", R::KIND, self.path, err));
                return false;
            },
            Ok(snapshot) => snapshot,
        };

        self.items = decode_snapshot(&snapshot);
        let count = self.items.len();
        self.log.info(&format!("Loaded {} {} records from {}", count, R::KIND, self.path));
        self.log.feedback(ChangeEvent::Loaded { count });
        true
    }

    /// Create a new record.
    ///
    /// Drafts that do not validate are rejected before anything is sent to the store (and no id is allocated).
    pub async fn create(&mut self, draft: R::Draft) -> Result<R, RepositoryError> {
        R::validate(&draft)?;

        let result = self.create_inner(draft).await;
        if let Err(err) = &result {
            self.log.warn(&format!("Unable to create a {} in {}: {}", R::KIND, self.path, err));
        }
        let record = result?;

        let id = record.id().clone();
        self.items.insert(record.clone());
        self.log.debug(&format!("Created {} {}", R::KIND, id));
        self.log.feedback(ChangeEvent::Created(id));
        Ok(record)
    }

    async fn create_inner(&mut self, draft: R::Draft) -> Result<R, StoreError> {
        let now = Utc::now();
        let id = self.unused_id(now).await?;
        let record = R::from_draft(id, draft, now);
        let body = encode_record(&record)?;
        self.store.write(&self.path.child(record.id().as_str())?, Value::Object(body)).await?;
        Ok(record)
    }

    async fn unused_id(&mut self, now: chrono::DateTime<Utc>) -> Result<RecordId, StoreError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id(self.store.as_ref(), now).await?;
            if self.items.contains(&id) == false {
                return Ok(id);
            }
            log::debug!("{} id {} is already taken in {}, trying another one", R::KIND, id, self.path);
        }
        Err(StoreError::Conflict { path: self.path.to_string() })
    }

    /// Apply the fields of `draft` to an existing record.
    ///
    /// Only the fields that actually changed are sent to the store. The id and creation date are kept.
    /// Updating a record that does not exist locally does nothing, and returns `Ok(None)`.
    pub async fn update(&mut self, id: &RecordId, draft: R::Draft) -> Result<Option<R>, RepositoryError> {
        R::validate(&draft)?;

        let current = match self.items.get(id) {
            None => {
                self.log.debug(&format!("Not updating {} {}, which does not exist", R::KIND, id));
                return Ok(None);
            },
            Some(current) => current,
        };
        let updated = current.apply_draft(draft);

        let result = match changed_fields(current, &updated) {
            Err(err) => Err(err),
            Ok(changes) if changes.is_empty() => {
                log::debug!("{} {} is unchanged, nothing to send", R::KIND, id);
                Ok(())
            },
            Ok(changes) => match self.path.child(id.as_str()) {
                Err(err) => Err(err),
                Ok(path) => self.store.patch(&path, changes).await,
            },
        };
        if let Err(err) = result {
            self.log.warn(&format!("Unable to update {} {}: {}", R::KIND, id, err));
            return Err(err.into());
        }

        self.items.insert(updated.clone());
        self.log.feedback(ChangeEvent::Updated(id.clone()));
        Ok(Some(updated))
    }

    /// Remove a record, from the store first, then locally.
    ///
    /// Deleting a record that does not exist locally does nothing, and returns `Ok(false)`.
    pub async fn delete(&mut self, id: &RecordId) -> Result<bool, RepositoryError> {
        if self.items.contains(id) == false {
            self.log.debug(&format!("Not deleting {} {}, which does not exist", R::KIND, id));
            return Ok(false);
        }

        let result = match self.path.child(id.as_str()) {
            Err(err) => Err(err),
            Ok(path) => self.store.delete(&path).await,
        };
        if let Err(err) = result {
            self.log.warn(&format!("Unable to delete {} {}: {}", R::KIND, id, err));
            return Err(err.into());
        }

        self.items.remove(id);
        self.log.feedback(ChangeEvent::Deleted(id.clone()));
        Ok(true)
    }
}

impl<S> Repository<Task, S>
where
    S: RecordStore + ?Sized,
{
    /// The calendar tasks, with timestamp ids
    pub fn tasks(store: Arc<S>, config: &Config) -> Result<Self, StoreError> {
        Ok(Self::new(store, config.tasks_path()?, IdStrategy::timestamp()))
    }
}

impl<S> Repository<Job, S>
where
    S: RecordStore + ?Sized,
{
    /// The jobs table, with ids allocated from a counter of the store
    pub fn jobs(store: Arc<S>, config: &Config) -> Result<Self, StoreError> {
        let ids = IdStrategy::counter(config.job_counter_path()?, config.job_id_width);
        Ok(Self::new(store, config.jobs_path()?, ids))
    }
}

impl<S> Repository<Employee, S>
where
    S: RecordStore + ?Sized,
{
    /// The employees, with random ids
    pub fn employees(store: Arc<S>, config: &Config) -> Result<Self, StoreError> {
        Ok(Self::new(store, config.employees_path()?, IdStrategy::Random))
    }
}

/// The fields of `updated` that differ from `current`. Fields that have been cleared are set to `null`.
fn changed_fields<R: Record>(current: &R, updated: &R) -> Result<Map<String, Value>, StoreError> {
    let before = encode_record(current)?;
    let after = encode_record(updated)?;

    let mut changes = Map::new();
    for (key, value) in &after {
        if before.get(key).unwrap_or(&Value::Null) != value {
            changes.insert(key.clone(), value.clone());
        }
    }
    for key in before.keys() {
        if after.contains_key(key) == false {
            changes.insert(key.clone(), Value::Null);
        }
    }
    Ok(changes)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Timestamp;
    use crate::task::{TaskDraft, TaskState};

    #[test]
    fn only_changed_fields_are_sent() {
        let now = Utc::now();
        let draft = TaskDraft {
            end: Some(Timestamp::parse("2025-03-24T11:00")),
            ..TaskDraft::new("Fix sink", Timestamp::parse("2025-03-24T09:00"))
        };
        let task = Task::from_draft(RecordId::from("1"), draft, now);
        let updated = task.apply_draft(TaskDraft {
            status: TaskState::InProgress.into(),
            ..TaskDraft::new("Fix sink", Timestamp::parse("2025-03-24T09:00"))
        });

        let changes = changed_fields(&task, &updated).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["status"], "in-progress");
        assert_eq!(changes["end"], Value::Null);
        assert!(changed_fields(&task, &task).unwrap().is_empty());
    }
}
