//! The scheduling form: stages the fields of a task until they are submitted to a [`TaskRepository`].
//!
//! ```text
//! Idle --open_create--> Editing(create) --submit--> Submitting --> Idle | Failed
//! Idle --open_update--> Editing(update) --submit--> Submitting --> Idle | Failed
//!                       Editing(update) --request_delete--> ConfirmingDelete --confirm_delete--> Deleting --> Idle | Failed
//! ```
//!
//! Cancelling (from any state but `Idle`) discards the buffer without talking to the store.

use crate::error::FormError;
use crate::record::{RecordId, Timestamp};
use crate::repository::TaskRepository;
use crate::task::{Task, TaskDraft, TaskStatus};
use crate::traits::RecordStore;

/// The fields of the form, as typed by the user
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub start: String,
    /// Leave empty for an open-ended task
    pub end: String,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title().to_string(),
            description: task.description().to_string(),
            status: task.status().clone(),
            start: task.start().map(|s| s.as_str().to_string()).unwrap_or_default(),
            end: task.end().map(|e| e.as_str().to_string()).unwrap_or_default(),
        }
    }

    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            start: non_blank_timestamp(&self.start),
            end: non_blank_timestamp(&self.end),
        }
    }
}

fn non_blank_timestamp(text: &str) -> Option<Timestamp> {
    match text.trim() {
        "" => None,
        _ => Some(Timestamp::parse(text.trim())),
    }
}

/// What a submission does
#[derive(Clone, Debug, PartialEq)]
pub enum FormMode {
    Create,
    Update(RecordId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormState {
    Idle,
    Editing { mode: FormMode, buffer: TaskForm },
    /// The user asked to delete the task being edited, and has to confirm
    ConfirmingDelete { id: RecordId, buffer: TaskForm },
    Submitting { mode: FormMode },
    Deleting { id: RecordId },
    /// The store rejected the last submission or deletion. The buffer is kept, so that it can be submitted again
    Failed { mode: FormMode, buffer: TaskForm, reason: String },
}

impl FormState {
    pub fn name(&self) -> &'static str {
        match self {
            FormState::Idle => "idle",
            FormState::Editing { .. } => "editing",
            FormState::ConfirmingDelete { .. } => "confirming a deletion",
            FormState::Submitting { .. } => "submitting",
            FormState::Deleting { .. } => "deleting",
            FormState::Failed { .. } => "failed",
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Idle
    }
}

#[derive(Debug, Default)]
pub struct SchedulingForm {
    state: FormState,
}

impl SchedulingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == FormState::Idle
    }

    /// The fields being edited, if any
    pub fn buffer(&self) -> Option<&TaskForm> {
        match &self.state {
            FormState::Editing { buffer, .. }
            | FormState::ConfirmingDelete { buffer, .. }
            | FormState::Failed { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Start editing a new task, whose start is pre-filled (e.g. with the calendar slot that was clicked)
    pub fn open_create(&mut self, start: Option<&str>) -> Result<(), FormError> {
        self.ensure_idle("open a new task")?;
        let buffer = TaskForm {
            start: start.unwrap_or_default().to_string(),
            ..TaskForm::default()
        };
        self.state = FormState::Editing { mode: FormMode::Create, buffer };
        Ok(())
    }

    /// Start editing an existing task
    pub fn open_update(&mut self, task: &Task) -> Result<(), FormError> {
        self.ensure_idle("edit a task")?;
        self.state = FormState::Editing {
            mode: FormMode::Update(task.id().clone()),
            buffer: TaskForm::from_task(task),
        };
        Ok(())
    }

    /// Edit the buffered fields. Editing a failed form resumes editing.
    pub fn buffer_mut(&mut self) -> Result<&mut TaskForm, FormError> {
        if let FormState::Failed { .. } = self.state {
            if let FormState::Failed { mode, buffer, .. } = std::mem::take(&mut self.state) {
                self.state = FormState::Editing { mode, buffer };
            }
        }
        match &mut self.state {
            FormState::Editing { buffer, .. } => Ok(buffer),
            other => Err(FormError::InvalidTransition { action: "edit fields", state: other.name() }),
        }
    }

    /// Close the form, discarding the buffer
    pub fn cancel(&mut self) {
        if self.state != FormState::Idle {
            log::debug!("Discarding the scheduling form ({})", self.state.name());
        }
        self.state = FormState::Idle;
    }

    /// Submit the buffer to the repository.
    ///
    /// A buffer that does not validate keeps the form in the editing state, and nothing is sent to the store.
    /// In case the store fails, the form goes to [`FormState::Failed`], keeping the buffer.
    /// On success, the form is closed and the created (or updated) task is returned. Updating a task that has disappeared in the meantime returns `Ok(None)`.
    pub async fn submit<S>(&mut self, repository: &mut TaskRepository<S>) -> Result<Option<Task>, FormError>
    where
        S: RecordStore + ?Sized,
    {
        let (mode, buffer) = match std::mem::take(&mut self.state) {
            FormState::Editing { mode, buffer } | FormState::Failed { mode, buffer, .. } => (mode, buffer),
            other => {
                let state = other.name();
                self.state = other;
                return Err(FormError::InvalidTransition { action: "submit", state });
            },
        };

        let draft = buffer.to_draft();
        if let Err(err) = <Task as crate::traits::Record>::validate(&draft) {
            log::debug!("Not submitting the scheduling form: {}", err);
            self.state = FormState::Editing { mode, buffer };
            return Err(err.into());
        }

        self.state = FormState::Submitting { mode: mode.clone() };
        let result = match &mode {
            FormMode::Create => repository.create(draft).await.map(Some),
            FormMode::Update(id) => repository.update(id, draft).await,
        };

        match result {
            Ok(task) => {
                self.state = FormState::Idle;
                Ok(task)
            },
            Err(err) => {
                self.state = FormState::Failed { mode, buffer, reason: err.to_string() };
                Err(err.into())
            },
        }
    }

    /// Ask to delete the task being edited. This has to be confirmed with [`Self::confirm_delete`]
    pub fn request_delete(&mut self) -> Result<(), FormError> {
        match std::mem::take(&mut self.state) {
            FormState::Editing { mode: FormMode::Update(id), buffer }
            | FormState::Failed { mode: FormMode::Update(id), buffer, .. } => {
                self.state = FormState::ConfirmingDelete { id, buffer };
                Ok(())
            },
            other => {
                let state = other.name();
                self.state = other;
                Err(FormError::InvalidTransition { action: "delete", state })
            },
        }
    }

    /// Go back to editing, without deleting anything
    pub fn cancel_delete(&mut self) -> Result<(), FormError> {
        match std::mem::take(&mut self.state) {
            FormState::ConfirmingDelete { id, buffer } => {
                self.state = FormState::Editing { mode: FormMode::Update(id), buffer };
                Ok(())
            },
            other => {
                let state = other.name();
                self.state = other;
                Err(FormError::InvalidTransition { action: "cancel a deletion", state })
            },
        }
    }

    /// Delete the task. On success, both the confirmation and the form are closed.
    ///
    /// Returns whether a task was actually deleted (it may have disappeared in the meantime).
    pub async fn confirm_delete<S>(&mut self, repository: &mut TaskRepository<S>) -> Result<bool, FormError>
    where
        S: RecordStore + ?Sized,
    {
        let (id, buffer) = match std::mem::take(&mut self.state) {
            FormState::ConfirmingDelete { id, buffer } => (id, buffer),
            other => {
                let state = other.name();
                self.state = other;
                return Err(FormError::InvalidTransition { action: "confirm a deletion", state });
            },
        };

        self.state = FormState::Deleting { id: id.clone() };
        match repository.delete(&id).await {
            Ok(deleted) => {
                self.state = FormState::Idle;
                Ok(deleted)
            },
            Err(err) => {
                self.state = FormState::Failed { mode: FormMode::Update(id), buffer, reason: err.to_string() };
                Err(err.into())
            },
        }
    }

    fn ensure_idle(&self, action: &'static str) -> Result<(), FormError> {
        match self.state {
            FormState::Idle => Ok(()),
            _ => Err(FormError::InvalidTransition { action, state: self.state.name() }),
        }
    }
}
