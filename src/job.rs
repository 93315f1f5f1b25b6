//! Jobs (dispatch-style work orders assigned to an employee)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::{RecordId, State, Status, Timestamp};
use crate::traits::Record;

/// The progress of a job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Pending
    }
}

impl State for JobState {
    fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "Pending",
            JobState::Assigned => "Assigned",
            JobState::InProgress => "In Progress",
            JobState::Completed => "Completed",
            JobState::Cancelled => "Cancelled",
        }
    }

    fn recognize(normalized: &str) -> Option<Self> {
        match normalized {
            "pending" => Some(JobState::Pending),
            "assigned" => Some(JobState::Assigned),
            "in-progress" | "inprogress" => Some(JobState::InProgress),
            "completed" | "complete" | "done" => Some(JobState::Completed),
            "cancelled" | "canceled" => Some(JobState::Cancelled),
            _ => None,
        }
    }
}

/// The status of a job.
///
/// Labels are recognized case-insensitively, but always written back the way they were read.
pub type JobStatus = Status<JobState>;

impl Status<JobState> {
    /// Whether no more work is expected for this job
    pub fn is_closed(&self) -> bool {
        matches!(self.state(), Some(JobState::Completed) | Some(JobState::Cancelled))
    }
}

/// A work order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(skip)]
    id: RecordId,

    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    job_type: String,
    /// The employee this job is assigned to, by name (or id). This is not checked against the employee list.
    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    assigned_to: String,
    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    address: String,
    #[serde(default)]
    date_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    phone_number: String,
    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    description: String,
    #[serde(default)]
    status: JobStatus,
}

impl Job {
    pub fn id(&self) -> &RecordId                   { &self.id }
    pub fn job_type(&self) -> &str                  { &self.job_type }
    pub fn assigned_to(&self) -> &str               { &self.assigned_to }
    pub fn address(&self) -> &str                   { &self.address }
    pub fn date_time(&self) -> Option<&Timestamp>   { self.date_time.as_ref() }
    pub fn phone_number(&self) -> &str              { &self.phone_number }
    pub fn description(&self) -> &str               { &self.description }
    pub fn status(&self) -> &JobStatus              { &self.status }
}

/// The fields of a job a user can edit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobDraft {
    pub job_type: String,
    pub assigned_to: String,
    pub address: String,
    pub date_time: Option<Timestamp>,
    pub phone_number: String,
    pub description: String,
    pub status: JobStatus,
}

/// A draft holding the current fields of a job, to be edited
impl From<&Job> for JobDraft {
    fn from(job: &Job) -> Self {
        Self {
            job_type: job.job_type.clone(),
            assigned_to: job.assigned_to.clone(),
            address: job.address.clone(),
            date_time: job.date_time.clone(),
            phone_number: job.phone_number.clone(),
            description: job.description.clone(),
            status: job.status.clone(),
        }
    }
}

impl JobDraft {
    fn into_job(self, id: RecordId) -> Job {
        Job {
            id,
            job_type: self.job_type.trim().to_string(),
            assigned_to: self.assigned_to.trim().to_string(),
            address: self.address.trim().to_string(),
            date_time: self.date_time,
            phone_number: self.phone_number.trim().to_string(),
            description: self.description.trim().to_string(),
            status: self.status,
        }
    }
}

impl Record for Job {
    type Draft = JobDraft;
    const KIND: &'static str = "job";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(draft: &JobDraft) -> Result<(), ValidationError> {
        if draft.job_type.trim().is_empty() {
            return Err(ValidationError::Blank("jobType"));
        }
        match &draft.date_time {
            None => Err(ValidationError::MissingStart),
            Some(dt) if dt.as_str().trim().is_empty() => Err(ValidationError::MissingStart),
            Some(dt) if dt.is_valid() == false => Err(ValidationError::InvalidTimestamp {
                field: "dateTime",
                value: dt.as_str().to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn from_draft(id: RecordId, draft: JobDraft, _now: DateTime<Utc>) -> Self {
        draft.into_job(id)
    }

    fn apply_draft(&self, draft: JobDraft) -> Self {
        draft.into_job(self.id.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(JobStatus::parse("Completed"), JobStatus::from(JobState::Completed));
        assert_eq!(JobStatus::parse("in progress").state(), Some(JobState::InProgress));
        assert_eq!(JobStatus::parse("IN_PROGRESS").state(), Some(JobState::InProgress));
        assert_eq!(JobStatus::parse("IN_PROGRESS").label(), "IN_PROGRESS");
        assert_eq!(JobStatus::parse("Active").state(), None);
        assert_eq!(JobStatus::parse("Active").label(), "Active");
        assert!(JobStatus::parse("done").is_closed());
        assert!(JobStatus::from(JobState::Cancelled).is_closed());
        assert!(JobStatus::from(JobState::Assigned).is_closed() == false);
        assert!(JobStatus::parse("Active").is_closed() == false);
    }

    #[test]
    fn decode_a_stored_job() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "001",
            "jobType": "Cleaning",
            "assignedTo": "Alice",
            "address": "123 Main St",
            "dateTime": "2025-03-24T09:00:00.000Z",
            "phoneNumber": "1234567890",
            "description": "Test job completed",
            "status": "Completed",
        })).unwrap();
        assert_eq!(job.assigned_to(), "Alice");
        assert_eq!(job.status().state(), Some(JobState::Completed));

        let body = serde_json::to_value(&job).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["status"], "Completed");
        assert_eq!(body["jobType"], "Cleaning");
    }

    #[test]
    fn loosely_typed_fields() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "jobType": "Repair",
            "assignedTo": null,
            "phoneNumber": 5550101,
            "status": "done",
        })).unwrap();
        assert_eq!(job.phone_number(), "5550101");
        assert_eq!(job.assigned_to(), "");
        assert_eq!(job.status().label(), "done");

        let draft = JobDraft::from(&job);
        assert_eq!(job.apply_draft(draft), job);
    }

    #[test]
    fn validation() {
        let mut draft = JobDraft {
            job_type: "Drain cleaning".to_string(),
            ..JobDraft::default()
        };
        assert_eq!(Job::validate(&draft), Err(ValidationError::MissingStart));
        draft.date_time = Some(Timestamp::parse("tomorrow"));
        assert!(matches!(Job::validate(&draft), Err(ValidationError::InvalidTimestamp { .. })));
        draft.date_time = Some(Timestamp::parse("2025-03-24T09:00"));
        assert!(Job::validate(&draft).is_ok());
        draft.job_type = " ".to_string();
        assert_eq!(Job::validate(&draft), Err(ValidationError::Blank("jobType")));
    }
}
