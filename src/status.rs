//! Checks whether the collections the dashboard relies on can be reached

use std::fmt::{Display, Formatter};

use crate::config::Config;
use crate::error::StoreError;
use crate::store::StorePath;
use crate::traits::RecordStore;

/// A service, and the store location that proves it works
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceCheck {
    pub name: String,
    pub path: StorePath,
}

impl ServiceCheck {
    pub fn new(name: &str, path: StorePath) -> Self {
        Self { name: name.to_string(), path }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServiceState {
    Online,
    /// The store answered, but there is nothing at this location
    NoData,
    Offline(String),
}

impl ServiceState {
    pub fn is_online(&self) -> bool {
        matches!(self, ServiceState::Online)
    }
}

impl Display for ServiceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Online => write!(f, "Online"),
            ServiceState::NoData => write!(f, "No data"),
            ServiceState::Offline(reason) => write!(f, "Offline ({})", reason),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceReport {
    pub entries: Vec<(ServiceCheck, ServiceState)>,
}

impl ServiceReport {
    pub fn all_online(&self) -> bool {
        self.entries.iter().all(|(_, state)| state.is_online())
    }

    pub fn state_of(&self, name: &str) -> Option<&ServiceState> {
        self.entries
            .iter()
            .find(|(check, _)| check.name == name)
            .map(|(_, state)| state)
    }
}

/// The services of the dashboard, as configured
pub fn default_checks(config: &Config) -> Result<Vec<ServiceCheck>, StoreError> {
    Ok(vec![
        ServiceCheck::new("Job scheduling", config.jobs_path()?),
        ServiceCheck::new("Calendar", config.tasks_path()?),
        ServiceCheck::new("Employee directory", config.employees_path()?),
    ])
}

/// Read every location, one after the other
pub async fn probe<S>(store: &S, checks: &[ServiceCheck]) -> ServiceReport
where
    S: RecordStore + ?Sized,
{
    let mut entries = Vec::with_capacity(checks.len());
    for check in checks {
        let state = match store.read(&check.path).await {
            Ok(snapshot) if snapshot.exists() => ServiceState::Online,
            Ok(_) => {
                log::info!("{} is reachable, but {} is empty", check.name, check.path);
                ServiceState::NoData
            },
            Err(err) => {
                log::warn!("{} is offline: {}", check.name, err);
                ServiceState::Offline(err.to_string())
            },
        };
        entries.push((check.clone(), state));
    }
    ServiceReport { entries }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::mock_behaviour::MockBehaviour;
    use crate::store::memory_store::MemoryStore;

    #[tokio::test]
    async fn report_states() {
        let store = MemoryStore::with_root(json!({
            "jobs": {"001": {"jobType": "Cleaning"}},
            "ServiceSync": {"1": {"title": "Fix sink"}},
        }));
        store.set_behaviour(MockBehaviour { read_behaviour: (2, 1), ..MockBehaviour::default() });

        let checks = default_checks(&Config::default()).unwrap();
        let report = probe(&store, &checks).await;
        assert_eq!(report.state_of("Job scheduling"), Some(&ServiceState::Online));
        assert_eq!(report.state_of("Calendar"), Some(&ServiceState::Online));
        assert!(matches!(report.state_of("Employee directory"), Some(ServiceState::Offline(_))));
        assert!(report.all_online() == false);

        let report = probe(&store, &checks[2..]).await;
        assert_eq!(report.state_of("Employee directory"), Some(&ServiceState::NoData));
    }
}
