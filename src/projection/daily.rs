//! Per-day counts over trailing windows of calendar days

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

use crate::employee::Employee;
use crate::projection::{Assigned, Dated};
use crate::reconcile::Collection;

/// The number of records scheduled on a calendar day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    /// `month/day`, without leading zeros (e.g. `3/24`)
    pub label: String,
    pub count: usize,
}

/// Counts for each of the last N calendar days, oldest first. The last day is today.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DailySeries {
    days: Vec<DayCount>,
}

impl DailySeries {
    /// An all-zero series for the `n` days up to (and including) `today`
    pub fn zeroed(today: NaiveDate, n: usize) -> Self {
        let days = (0..n)
            .rev()
            .filter_map(|offset| today.checked_sub_signed(Duration::days(offset as i64)))
            .map(|date| DayCount {
                date,
                label: format!("{}/{}", date.month(), date.day()),
                count: 0,
            })
            .collect();
        Self { days }
    }

    pub fn days(&self) -> &[DayCount] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.days.iter().map(|day| day.count).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.days.iter().map(|day| day.label.as_str()).collect()
    }

    /// The most recent bucket
    pub fn today(&self) -> Option<&DayCount> {
        self.days.last()
    }

    pub fn total(&self) -> usize {
        self.days.iter().map(|day| day.count).sum()
    }

    /// How today compares to the average day of the window, in percent.
    ///
    /// Undefined for windows shorter than two days, and for windows without any record.
    pub fn growth_percent(&self) -> Option<f64> {
        if self.days.len() < 2 {
            return None;
        }
        let average = self.total() as f64 / self.days.len() as f64;
        if average == 0.0 {
            return None;
        }
        let today = self.today()?.count as f64;
        Some((today - average) / average * 100.0)
    }

    /// Count one more record on `date`. Returns false (and counts nothing) if `date` is outside the window.
    fn bump(&mut self, date: NaiveDate) -> bool {
        let first = match self.days.first() {
            None => return false,
            Some(first) => first.date,
        };
        let offset = (date - first).num_days();
        if offset < 0 {
            return false;
        }
        match self.days.get_mut(offset as usize) {
            None => false,
            Some(day) => {
                day.count += 1;
                true
            },
        }
    }
}

/// Count records per calendar day, over the `n` days up to (and including) the day of `now`.
///
/// Days are calendar days as seen from the time zone of `now`. Records outside the window, and records without a usable date, are ignored.
pub fn trailing_counts<'a, R, I, Tz>(items: I, now: &DateTime<Tz>, n: usize) -> DailySeries
where
    R: Dated + 'a,
    I: IntoIterator<Item = &'a R>,
    Tz: TimeZone,
{
    let tz = now.timezone();
    let mut series = DailySeries::zeroed(now.naive_local().date(), n);
    for item in items {
        if let Some(day) = item.scheduled_at().and_then(|at| at.calendar_day(&tz)) {
            series.bump(day);
        }
    }
    series
}



/// Per-day counts for each assignee, over a trailing window.
///
/// No assignee is selected at first: the selected series is then all zeros.
#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeSeries {
    window: DailySeries,
    /// In the order assignees are first met
    series: Vec<(String, DailySeries)>,
    selected: Option<String>,
}

impl EmployeeSeries {
    /// Only assignees that have at least a record inside the window get a series.
    /// Records assigned to nobody are counted under [`UNASSIGNED_PLACEHOLDER`](crate::config::UNASSIGNED_PLACEHOLDER),
    /// so that the series add up to the [`trailing_counts`] of the same records.
    pub fn build<'a, R, I, Tz>(items: I, now: &DateTime<Tz>, n: usize) -> Self
    where
        R: Dated + Assigned + 'a,
        I: IntoIterator<Item = &'a R>,
        Tz: TimeZone,
    {
        let tz = now.timezone();
        let window = DailySeries::zeroed(now.naive_local().date(), n);
        let unassigned = crate::config::unassigned_placeholder();
        let mut series: Vec<(String, DailySeries)> = Vec::new();

        for item in items {
            let label = match item.assignee().trim() {
                "" => unassigned.as_str(),
                label => label,
            };
            let day = match item.scheduled_at().and_then(|at| at.calendar_day(&tz)) {
                None => continue,
                Some(day) => day,
            };

            let position = match series.iter().position(|(l, _)| l == label) {
                Some(position) => position,
                None => {
                    let mut candidate = window.clone();
                    if candidate.bump(day) {
                        series.push((label.to_string(), candidate));
                    }
                    continue;
                },
            };
            series[position].1.bump(day);
        }

        Self { window, series, selected: None }
    }

    /// Assignees, in the order they were first met
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(label, _)| label.as_str())
    }

    /// The series of an assignee. Unknown (or no) assignees get an all-zero series.
    pub fn series(&self, label: Option<&str>) -> DailySeries {
        label
            .and_then(|label| self.series.iter().find(|(l, _)| l == label.trim()))
            .map(|(_, series)| series.clone())
            .unwrap_or_else(|| self.window.clone())
    }

    /// Select the series to display. Returns false (and keeps the current selection) for unknown assignees.
    pub fn select(&mut self, label: &str) -> bool {
        if self.labels().any(|l| l == label.trim()) == false {
            log::debug!("No jobs for {} in this window, not selecting it", label);
            return false;
        }
        self.selected = Some(label.trim().to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_series(&self) -> DailySeries {
        self.series(self.selected())
    }

    /// The employee an assignee label designates, by name or id. Dangling labels resolve to `None`.
    pub fn resolve<'e>(&self, label: &str, employees: &'e Collection<Employee>) -> Option<&'e Employee> {
        employees.iter().find(|employee| employee.is_designated_by(label))
    }
}
