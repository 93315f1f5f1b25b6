//! Read-only views derived from a collection.
//!
//! These are pure functions: they never touch the store, and degrade to empty (or all-zero) results
//! on missing or malformed data.

use crate::job::Job;
use crate::record::Timestamp;
use crate::task::Task;

pub mod daily;
pub mod today;

pub use daily::{trailing_counts, DailySeries, DayCount, EmployeeSeries};
pub use today::{today_split, TodaySplit};

/// Records that can be grouped by status
pub trait StatusLabel {
    fn status_label(&self) -> &str;
}

/// Records that are scheduled at some point in time
pub trait Dated {
    /// When this record is scheduled, if it is
    fn scheduled_at(&self) -> Option<&Timestamp>;
}

/// Records that are assigned to someone
pub trait Assigned {
    /// The label of the assignee (usually an employee name). May be blank.
    fn assignee(&self) -> &str;
}

impl StatusLabel for Task {
    fn status_label(&self) -> &str {
        self.status().label()
    }
}

impl Dated for Task {
    fn scheduled_at(&self) -> Option<&Timestamp> {
        self.start()
    }
}

impl StatusLabel for Job {
    fn status_label(&self) -> &str {
        self.status().label()
    }
}

impl Dated for Job {
    fn scheduled_at(&self) -> Option<&Timestamp> {
        self.date_time()
    }
}

impl Assigned for Job {
    fn assignee(&self) -> &str {
        self.assigned_to()
    }
}



/// One bucket of a status histogram
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Count the records of each status.
///
/// Statuses are grouped by their label, exactly as it is spelled in the store.
/// Buckets come in the order statuses are first met, not in any fixed order.
pub fn status_histogram<'a, R, I>(items: I) -> Vec<StatusCount>
where
    R: StatusLabel + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut buckets: Vec<StatusCount> = Vec::new();
    for item in items {
        let label = item.status_label();
        match buckets.iter_mut().find(|bucket| bucket.status == label) {
            Some(bucket) => bucket.count += 1,
            None => buckets.push(StatusCount { status: label.to_string(), count: 1 }),
        }
    }
    buckets
}
