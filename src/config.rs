//! Support for library configuration options

use std::path::Path;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, StoreError};
use crate::store::StorePath;

/// Title given to tasks submitted with a blank title.
/// Feel free to override it when initing this library.
pub static UNTITLED_PLACEHOLDER: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("Untitled".to_string())));

/// Description given to tasks submitted with a blank description.
/// Feel free to override it when initing this library.
pub static NO_DESCRIPTION_PLACEHOLDER: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("No description".to_string())));

/// Label of the per-employee series of jobs assigned to nobody.
/// Feel free to override it when initing this library.
pub static UNASSIGNED_PLACEHOLDER: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("(unassigned)".to_string())));

pub(crate) fn untitled_placeholder() -> String {
    read_placeholder(&UNTITLED_PLACEHOLDER)
}

pub(crate) fn no_description_placeholder() -> String {
    read_placeholder(&NO_DESCRIPTION_PLACEHOLDER)
}

pub(crate) fn unassigned_placeholder() -> String {
    read_placeholder(&UNASSIGNED_PLACEHOLDER)
}

fn read_placeholder(placeholder: &Mutex<String>) -> String {
    placeholder.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

/// Environment variable that overrides [`RestConfig::base_url`]
pub const URL_ENV_VAR: &str = "SERVICE_SYNC_URL";
/// Environment variable that overrides [`RestConfig::auth_token`]
pub const TOKEN_ENV_VAR: &str = "SERVICE_SYNC_TOKEN";



/// Where the dashboard finds its data, and how it summarizes it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Collection of calendar tasks
    pub tasks_path: String,
    /// Collection of jobs (work orders)
    pub jobs_path: String,
    /// Collection of employees
    pub employees_path: String,
    /// Counter used to allocate job ids
    pub job_counter_path: String,
    /// Job ids are this counter, left-padded with zeros to this width
    pub job_id_width: usize,

    /// Length of the trailing window of the "jobs per day" view
    pub jobs_window_days: usize,
    /// Length of the trailing window of the "jobs per day, per employee" view
    pub employee_window_days: usize,

    /// The remote store to use, if any
    pub store: Option<RestConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_path: "ServiceSync".to_string(),
            jobs_path: "jobs".to_string(),
            employees_path: "employees".to_string(),
            job_counter_path: "counters/jobs".to_string(),
            job_id_width: 3,
            jobs_window_days: 30,
            employee_window_days: 28,
            store: None,
        }
    }
}

/// How to reach a [`RestStore`](crate::store::rest_store::RestStore)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    pub base_url: Url,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// How often subscriptions poll the store
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

impl Config {
    /// Read a configuration from a JSON file. Missing fields take their default values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Apply the `SERVICE_SYNC_URL` and `SERVICE_SYNC_TOKEN` environment variables, if set
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::var(URL_ENV_VAR).ok(), std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn with_overrides(mut self, url: Option<String>, token: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = url {
            let base_url = Url::parse(&url).map_err(|source| ConfigError::Url { value: url.clone(), source })?;
            match &mut self.store {
                Some(store) => store.base_url = base_url,
                None => {
                    self.store = Some(RestConfig {
                        base_url,
                        auth_token: None,
                        poll_interval_ms: default_poll_interval_ms(),
                    })
                },
            }
        }
        if let (Some(token), Some(store)) = (token, &mut self.store) {
            store.auth_token = Some(token);
        }
        Ok(self)
    }

    pub fn tasks_path(&self) -> Result<StorePath, StoreError> {
        StorePath::parse(&self.tasks_path)
    }
    pub fn jobs_path(&self) -> Result<StorePath, StoreError> {
        StorePath::parse(&self.jobs_path)
    }
    pub fn employees_path(&self) -> Result<StorePath, StoreError> {
        StorePath::parse(&self.employees_path)
    }
    pub fn job_counter_path(&self) -> Result<StorePath, StoreError> {
        StorePath::parse(&self.job_counter_path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_files_use_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "jobs_window_days": 14, "store": {{ "base_url": "https://plumbing.example.com/" }} }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.jobs_window_days, 14);
        assert_eq!(config.employee_window_days, 28);
        assert_eq!(config.tasks_path, "ServiceSync");
        let store = config.store.unwrap();
        assert_eq!(store.poll_interval_ms, 5_000);
        assert!(store.auth_token.is_none());
    }

    #[test]
    fn missing_and_invalid_files() {
        assert!(matches!(Config::from_file(Path::new("/nonexistent/service-sync.json")), Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(Config::from_file(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn overrides() {
        let config = Config::default()
            .with_overrides(Some("https://plumbing.example.com/".to_string()), Some("token".to_string()))
            .unwrap();
        let store = config.store.unwrap();
        assert_eq!(store.base_url.as_str(), "https://plumbing.example.com/");
        assert_eq!(store.auth_token.as_deref(), Some("token"));

        assert!(Config::default().with_overrides(Some("not a url".to_string()), None).is_err());
        assert!(Config::default().with_overrides(None, Some("token".to_string())).unwrap().store.is_none());
    }
}
