//! Calendar tasks (scheduled service visits)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::{RecordId, State, Status, Timestamp};
use crate::traits::Record;

/// How far along a task is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Pending
    }
}

impl State for TaskState {
    fn label(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::InProgress => "in-progress",
            TaskState::Completed => "completed",
        }
    }

    fn recognize(normalized: &str) -> Option<Self> {
        match normalized {
            "pending" => Some(TaskState::Pending),
            "in-progress" | "inprogress" => Some(TaskState::InProgress),
            "completed" | "complete" | "done" => Some(TaskState::Completed),
            _ => None,
        }
    }
}

/// The status of a task, spelled the way the store spells it
pub type TaskStatus = Status<TaskState>;

/// A calendar task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// The key of this task in its collection
    #[serde(skip)]
    id: RecordId,

    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    description: String,
    #[serde(default)]
    status: TaskStatus,

    /// The scheduled start. Tasks created by this crate always have one, but tasks coming from the store may not
    #[serde(default)]
    start: Option<Timestamp>,
    /// The scheduled end, for tasks that are not open-ended
    #[serde(default)]
    end: Option<Timestamp>,

    /// The time this task was created.
    /// This will be populated in tasks created by this crate, but can be None for tasks coming from the store
    #[serde(default)]
    created_at: Option<Timestamp>,
}

impl Task {
    pub fn id(&self) -> &RecordId               { &self.id          }
    pub fn title(&self) -> &str                 { &self.title       }
    pub fn description(&self) -> &str           { &self.description }
    pub fn status(&self) -> &TaskStatus         { &self.status      }
    pub fn start(&self) -> Option<&Timestamp>   { self.start.as_ref() }
    pub fn end(&self) -> Option<&Timestamp>     { self.end.as_ref() }
    pub fn created_at(&self) -> Option<&Timestamp> { self.created_at.as_ref() }
}

/// The fields of a task a user can edit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl TaskDraft {
    pub fn new(title: &str, start: Timestamp) -> Self {
        Self {
            title: title.to_string(),
            start: Some(start),
            ..Self::default()
        }
    }

    /// Trim the text fields, and replace blank ones with placeholders
    fn normalized(mut self) -> Self {
        self.title = non_blank_or(&self.title, crate::config::untitled_placeholder);
        self.description = non_blank_or(&self.description, crate::config::no_description_placeholder);
        self
    }
}

fn non_blank_or(text: &str, placeholder: fn() -> String) -> String {
    match text.trim() {
        "" => placeholder(),
        trimmed => trimmed.to_string(),
    }
}

/// Check the scheduled range of a draft.
///
/// `start` is required and must be a date; `end`, when set, must be a date that does not precede `start`
pub(crate) fn validate_schedule(start: Option<&Timestamp>, end: Option<&Timestamp>) -> Result<(), ValidationError> {
    let start = start.ok_or(ValidationError::MissingStart)?;
    if start.as_str().trim().is_empty() {
        return Err(ValidationError::MissingStart);
    }
    let start_instant = start.in_timezone(&Utc).ok_or_else(|| ValidationError::InvalidTimestamp {
        field: "start",
        value: start.as_str().to_string(),
    })?;

    if let Some(end) = end {
        let end_instant = end.in_timezone(&Utc).ok_or_else(|| ValidationError::InvalidTimestamp {
            field: "end",
            value: end.as_str().to_string(),
        })?;
        // Comparing a floating time with an instant only makes sense in a given zone, so only compare like with like
        if start.is_absolute() == end.is_absolute() && end_instant < start_instant {
            return Err(ValidationError::EndBeforeStart);
        }
    }
    Ok(())
}

impl Record for Task {
    type Draft = TaskDraft;
    const KIND: &'static str = "task";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(draft: &TaskDraft) -> Result<(), ValidationError> {
        validate_schedule(draft.start.as_ref(), draft.end.as_ref())
    }

    fn from_draft(id: RecordId, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        let draft = draft.normalized();
        Self {
            id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            start: draft.start,
            end: draft.end,
            created_at: Some(Timestamp::from_utc(now)),
        }
    }

    fn apply_draft(&self, draft: TaskDraft) -> Self {
        let draft = draft.normalized();
        Self {
            id: self.id.clone(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            start: draft.start,
            end: draft.end,
            created_at: self.created_at.clone(),
        }
    }
}
