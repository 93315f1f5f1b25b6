//! This crate keeps the jobs, calendar tasks and employees of a plumbing dashboard in line with a realtime record store.
//!
//! Records live in flat collections of a [`RecordStore`](traits::RecordStore) (a tree of JSON values, such as a realtime database).
//! A [`Repository`](repository::Repository) loads a collection, and performs creations, updates and deletions against the store.
//! Its local state only changes once the store has confirmed a mutation.
//!
//! Snapshots of the store are turned into typed collections by the [`reconcile`] module, which also provides
//! [`LiveCollection`](reconcile::LiveCollection)s, that follow a store subscription. \
//! The [`projection`] module derives read-only views from these collections (status histograms, per-day counts, today's agenda),
//! and the [`form`] module stages the edition of a task until it is submitted.
//!
//! Two stores are provided: an in-process [`MemoryStore`](store::memory_store::MemoryStore), and a [`RestStore`](store::rest_store::RestStore)
//! that talks to the REST API of a realtime database.

pub mod traits;
pub mod error;
pub mod config;

pub mod store;
pub mod mock_behaviour;

pub mod record;
pub use record::{RecordId, State, Status, Timestamp};
pub mod task;
pub use task::{Task, TaskDraft, TaskState, TaskStatus};
pub mod job;
pub use job::{Job, JobDraft, JobState, JobStatus};
pub mod employee;
pub use employee::{Employee, EmployeeDraft};
pub mod ids;

pub mod reconcile;
pub mod repository;
pub use repository::Repository;
pub mod projection;
pub mod form;
pub use form::SchedulingForm;
pub mod status;

pub mod utils;
