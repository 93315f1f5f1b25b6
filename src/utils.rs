///! Some utility functions

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::job::Job;
use crate::projection::{DailySeries, StatusCount, TodaySplit};
use crate::status::ServiceReport;
use crate::task::{Task, TaskState};

/// A debug utility that pretty-prints a task
pub fn print_task(task: &Task) {
    let completion = match task.status().state() {
        Some(TaskState::Completed) => "✓",
        Some(TaskState::InProgress) => "~",
        Some(TaskState::Pending) => " ",
        None => "?",
    };
    let start = task.start().map(|s| s.as_str()).unwrap_or("?");
    let end = task.end().map(|e| e.as_str()).unwrap_or("");
    println!("    {} {}\t{} -> {}\t{}", completion, task.title(), start, end, task.id());
}

/// A debug utility that pretty-prints a job
pub fn print_job(job: &Job) {
    let date = job.date_time().map(|d| d.as_str()).unwrap_or("?");
    let unassigned = crate::config::unassigned_placeholder();
    let assignee = match job.assigned_to() {
        "" => unassigned.as_str(),
        a => a,
    };
    println!("    [{}] {} for {}\t{}\t{}", job.status(), job.job_type(), assignee, date, job.id());
}

pub fn print_histogram(histogram: &[StatusCount]) {
    for bucket in histogram {
        println!("    {:<12} {}", bucket.status, bucket.count);
    }
}

pub fn print_series(series: &DailySeries) {
    for day in series.days() {
        println!("    {:>5} {}", day.label, "#".repeat(day.count));
    }
    match series.growth_percent() {
        Some(growth) => println!("    total {}, today {:+.1}% vs. average", series.total(), growth),
        None => println!("    total {}", series.total()),
    }
}

pub fn print_today(split: &TodaySplit<'_, Task>) {
    println!("  Upcoming");
    for task in &split.upcoming {
        print_task(task);
    }
    println!("  Past");
    for task in &split.past {
        print_task(task);
    }
}

pub fn print_report(report: &ServiceReport) {
    for (check, state) in &report.entries {
        println!("    {:<20} {}\t({})", check.name, state, check.path);
    }
}


/// Compare keys of two maps for equality
pub fn keys_are_the_same<T, U, V>(left: &BTreeMap<T, U>, right: &BTreeMap<T, V>) -> bool
where
    T: Ord + Display,
{
    if left.len() != right.len() {
        log::debug!("Count of keys mismatch: {} and {}", left.len(), right.len());
        return false;
    }

    let keys_l: BTreeSet<&T> = left.keys().collect();
    let keys_r: BTreeSet<&T> = right.keys().collect();
    let result = keys_l == keys_r;
    if result == false {
        log::debug!("Keys of a map mismatch");
        for key in keys_l.difference(&keys_r) {
            log::debug!("   left only: {}", key);
        }
        for key in keys_r.difference(&keys_l) {
            log::debug!("  right only: {}", key);
        }
    }
    result
}
