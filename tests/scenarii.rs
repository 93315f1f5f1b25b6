//! Data shared by the integration tests: a plumbing company with a few jobs, calendar tasks and employees
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use service_sync::config::Config;
use service_sync::repository::{JobRepository, TaskRepository};
use service_sync::store::memory_store::MemoryStore;

pub const KITCHEN_SINK_ID: &str = "1678912345000";
pub const BATHROOM_DRAIN_ID: &str = "1678912345001";

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The calendar tasks, as the store holds them
pub fn calendar() -> Value {
    json!({
        KITCHEN_SINK_ID: {
            "title": "Fix Kitchen Sink Clog",
            "description": "Customer reports slow drainage",
            "start": "2025-03-24T09:00:00.000Z",
            "status": "pending",
            "createdAt": "2025-03-20T10:15:00.000Z",
        },
        BATHROOM_DRAIN_ID: {
            "title": "Repair Bathroom Drain",
            "start": "2025-03-25T14:00:00.000Z",
            "end": null,
            "status": "in-progress",
        },
    })
}

/// A few jobs around March 24th, 2025
pub fn jobs() -> Value {
    json!({
        "001": {
            "jobType": "Cleaning",
            "assignedTo": "Alice Moreau",
            "address": "123 Main St",
            "dateTime": "2025-03-24T09:00:00.000Z",
            "phoneNumber": "1234567890",
            "description": "Descale the boiler",
            "status": "Completed",
        },
        "002": {
            "jobType": "Delivery",
            "assignedTo": "Bob Tran",
            "address": "456 Elm St",
            "dateTime": "2025-03-24T15:30:00.000Z",
            "phoneNumber": "0987654321",
            "description": "Deliver a water heater",
            "status": "Assigned",
        },
        "003": {
            "jobType": "Repair",
            "assignedTo": "Alice Moreau",
            "address": "789 Oak Ave",
            "dateTime": "2025-03-10T08:00",
            "status": "In Progress",
        },
        "004": {
            "jobType": "Inspection",
            "assignedTo": "Former Employee",
            "address": "12 Pine Rd",
            "dateTime": "2024-12-01T10:00:00.000Z",
            "status": "Completed",
        },
        "005": {
            "jobType": "Install",
            "address": "5 Birch Ln",
            "dateTime": "2025-03-23T11:00:00.000Z",
            "status": "Pending",
        },
    })
}

pub fn employees() -> Value {
    json!({
        "e-alice": { "name": "Alice Moreau", "email": "alice@plumbing.example.com", "phone": "555-0101" },
        "e-bob": { "name": "Bob Tran", "email": "bob@plumbing.example.com" },
    })
}

/// A store holding every collection, whose job counter is at 5
pub fn populated_store() -> Arc<MemoryStore> {
    let config = Config::default();
    let mut root = serde_json::Map::new();
    root.insert(config.tasks_path.clone(), calendar());
    root.insert(config.jobs_path.clone(), jobs());
    root.insert(config.employees_path.clone(), employees());
    root.insert("counters".to_string(), json!({ "jobs": 5 }));
    Arc::new(MemoryStore::with_root(Value::Object(root)))
}

pub fn task_repository(store: &Arc<MemoryStore>) -> TaskRepository<MemoryStore> {
    TaskRepository::tasks(Arc::clone(store), &Config::default()).unwrap()
}

pub fn job_repository(store: &Arc<MemoryStore>) -> JobRepository<MemoryStore> {
    JobRepository::jobs(Arc::clone(store), &Config::default()).unwrap()
}
