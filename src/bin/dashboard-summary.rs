//! Prints a summary of the dashboard: job statuses, jobs per day, today's tasks and the state of the services.
//!
//! Usage: `dashboard-summary [config.json]`. The store can also be given with the `SERVICE_SYNC_URL` and `SERVICE_SYNC_TOKEN` environment variables.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;

use service_sync::config::Config;
use service_sync::projection::{status_histogram, today_split, trailing_counts};
use service_sync::repository::{JobRepository, TaskRepository};
use service_sync::status::{default_checks, probe};
use service_sync::store::rest_store::RestStore;
use service_sync::utils::{print_histogram, print_job, print_report, print_series, print_today};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(Path::new(&path))?,
        None => Config::default(),
    };
    let config = config.with_env_overrides()?;
    let rest_config = match &config.store {
        Some(rest_config) => rest_config,
        None => {
            log::error!("No store is configured. Set {} or provide a configuration file", service_sync::config::URL_ENV_VAR);
            std::process::exit(1);
        },
    };
    let store = Arc::new(RestStore::from_config(rest_config));
    log::info!("Using the store at {}", store.base_url());

    let mut jobs = JobRepository::jobs(Arc::clone(&store), &config)?;
    let mut tasks = TaskRepository::tasks(Arc::clone(&store), &config)?;
    let jobs_loaded = jobs.load().await;
    let tasks_loaded = tasks.load().await;
    if jobs_loaded == false || tasks_loaded == false {
        log::warn!("Some collections could not be loaded, the summary is incomplete");
    }
    let now = Local::now();

    println!("Jobs by status");
    print_histogram(&status_histogram(jobs.items()));
    println!("Jobs per day (last {} days)", config.jobs_window_days);
    print_series(&trailing_counts(jobs.items(), &now, config.jobs_window_days));
    println!("Open jobs");
    for job in jobs.items().iter().filter(|job| job.status().is_closed() == false) {
        print_job(job);
    }
    println!("Today's tasks");
    print_today(&today_split(tasks.items(), &now));

    println!("Services");
    let report = probe(store.as_ref(), &default_checks(&config)?).await;
    print_report(&report);

    Ok(())
}
