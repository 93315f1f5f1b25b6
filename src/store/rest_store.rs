//! A record store reached through the REST interface of a realtime database

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use url::Url;

use crate::config::RestConfig;
use crate::error::StoreError;
use crate::store::{OnError, OnValue, Snapshot, StorePath, Subscription};
use crate::traits::RecordStore;

/// How many times a counter increment is retried when someone else changes the counter at the same time
const MAX_INCREMENT_ATTEMPTS: u32 = 8;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A [`RecordStore`] that sends `GET`, `PUT`, `PATCH` and `DELETE` requests to `{base_url}/{path}.json`.
///
/// The REST interface has no push channel that this client uses, so subscriptions poll the subscribed location
/// and only call their listener when its value has changed.
#[derive(Clone, Debug)]
pub struct RestStore {
    base_url: Url,
    auth_token: Option<String>,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: Url, auth_token: Option<String>) -> Self {
        Self {
            base_url,
            auth_token,
            poll_interval: DEFAULT_POLL_INTERVAL,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &RestConfig) -> Self {
        Self::new(config.base_url.clone(), config.auth_token.clone())
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
    }

    /// Change how often subscriptions poll the store. The interval cannot be zero
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The URL of the JSON document at `path`
    pub fn url_for(&self, path: &StorePath) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut()
                .map_err(|_| StoreError::InvalidPath(format!("{} cannot be a base URL", self.base_url)))?;
            segments.pop_if_empty();
            match path.segments().split_last() {
                None => { segments.push(".json"); },
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{}.json", last));
                },
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &StorePath) -> Result<RequestBuilder, StoreError> {
        let url = self.url_for(path)?;
        log::trace!("{} {}", method, path);
        Ok(self.client.request(method, url))
    }

    /// Read a value, and the version tag the server associates with it
    async fn read_with_etag(&self, path: &StorePath) -> Result<(Value, String), StoreError> {
        let response = self.request(Method::GET, path)?
            .header("X-Firebase-ETag", "true")
            .send()
            .await?;
        let response = check_status(response, path)?;
        let etag = match response.headers().get("ETag") {
            None => return Err(StoreError::Unavailable(format!("No ETag in the response for {}", path))),
            Some(etag) => etag.to_str()
                .map_err(|_| StoreError::Unavailable(format!("Invalid ETag in the response for {}", path)))?
                .to_string(),
        };
        let value = response.json::<Value>().await?;
        Ok((value, etag))
    }
}

fn check_status(response: Response, path: &StorePath) -> Result<Response, StoreError> {
    if response.status().is_success() == false {
        return Err(StoreError::Status { path: path.to_string(), status: response.status().as_u16() });
    }
    Ok(response)
}

#[async_trait]
impl RecordStore for RestStore {
    async fn read(&self, path: &StorePath) -> Result<Snapshot, StoreError> {
        let response = self.request(Method::GET, path)?.send().await?;
        let response = check_status(response, path)?;
        let value = response.json::<Value>().await?;
        Ok(Snapshot::from_value(value))
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let response = self.request(Method::PUT, path)?.json(&value).send().await?;
        check_status(response, path)?;
        Ok(())
    }

    async fn patch(&self, path: &StorePath, partial: Map<String, Value>) -> Result<(), StoreError> {
        let response = self.request(Method::PATCH, path)?.json(&Value::Object(partial)).send().await?;
        check_status(response, path)?;
        Ok(())
    }

    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        let response = self.request(Method::DELETE, path)?.send().await?;
        check_status(response, path)?;
        Ok(())
    }

    async fn increment(&self, path: &StorePath) -> Result<u64, StoreError> {
        for attempt in 1..=MAX_INCREMENT_ATTEMPTS {
            let (value, etag) = self.read_with_etag(path).await?;
            let current = match &value {
                Value::Null => 0,
                Value::Number(n) => n.as_u64().ok_or_else(|| StoreError::NotACounter { path: path.to_string() })?,
                _ => return Err(StoreError::NotACounter { path: path.to_string() }),
            };
            let next = current + 1;

            let response = self.request(Method::PUT, path)?
                .header("if-match", etag)
                .json(&Value::from(next))
                .send()
                .await?;
            if response.status() == StatusCode::PRECONDITION_FAILED {
                log::debug!("Counter {} changed during increment (attempt {}), retrying", path, attempt);
                continue;
            }
            check_status(response, path)?;
            return Ok(next);
        }
        Err(StoreError::Conflict { path: path.to_string() })
    }

    fn subscribe(&self, path: &StorePath, on_value: OnValue, on_error: OnError) -> Subscription {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                on_error(StoreError::NoRuntime);
                return Subscription::inactive();
            },
        };

        let store = self.clone();
        let path = path.clone();
        let task = runtime.spawn(async move {
            let mut last_value: Option<Value> = None;
            let mut ticker = tokio::time::interval(store.poll_interval);
            loop {
                ticker.tick().await;
                match store.read(&path).await {
                    Err(err) => on_error(err),
                    Ok(snapshot) => {
                        let value = snapshot.into_value();
                        if last_value.as_ref() != Some(&value) {
                            last_value = Some(value.clone());
                            on_value(Snapshot::from_value(value));
                        }
                    },
                }
            }
        });

        Subscription::new(move || task.abort())
    }
}
