//! Employees, as referenced by [`Job::assigned_to`](crate::job::Job::assigned_to)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::RecordId;
use crate::traits::Record;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(skip)]
    id: RecordId,

    #[serde(default, deserialize_with = "crate::record::lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "crate::record::lenient_optional_string")]
    email: Option<String>,
    #[serde(default, deserialize_with = "crate::record::lenient_optional_string")]
    phone: Option<String>,
}

impl Employee {
    pub fn id(&self) -> &RecordId       { &self.id }
    pub fn name(&self) -> &str          { &self.name }
    pub fn email(&self) -> Option<&str> { self.email.as_deref() }
    pub fn phone(&self) -> Option<&str> { self.phone.as_deref() }

    /// Whether a job assignee label designates this employee
    pub fn is_designated_by(&self, label: &str) -> bool {
        let label = label.trim();
        self.name == label || self.id.as_str() == label
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeeDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl EmployeeDraft {
    fn into_employee(self, id: RecordId) -> Employee {
        Employee {
            id,
            name: self.name.trim().to_string(),
            email: non_blank(self.email),
            phone: non_blank(self.phone),
        }
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field
        .map(|f| f.trim().to_string())
        .filter(|f| f.is_empty() == false)
}

impl Record for Employee {
    type Draft = EmployeeDraft;
    const KIND: &'static str = "employee";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn validate(draft: &EmployeeDraft) -> Result<(), ValidationError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::Blank("name"));
        }
        Ok(())
    }

    fn from_draft(id: RecordId, draft: EmployeeDraft, _now: DateTime<Utc>) -> Self {
        draft.into_employee(id)
    }

    fn apply_draft(&self, draft: EmployeeDraft) -> Self {
        draft.into_employee(self.id.clone())
    }
}
