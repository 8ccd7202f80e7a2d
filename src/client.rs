//! HTTP access to the AWDB REST API.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::error::SnotelError;

/// Query parameters attached to an AWDB request
pub type Query<'a> = [(&'a str, String)];

/// Anything that can answer AWDB requests with raw JSON.
#[async_trait]
pub trait AwdbApi: Send + Sync {
    /// Issues a GET for `path` (relative to the API base) with `query`.
    async fn request(&self, path: &str, query: &Query<'_>) -> Result<Value, SnotelError>;
}

/// reqwest-backed AWDB client
pub struct AwdbClient {
    client: Client,
    base_url: String,
}

impl AwdbClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AwdbApi for AwdbClient {
    async fn request(&self, path: &str, query: &Query<'_>) -> Result<Value, SnotelError> {
        let url = self.url_for(path);
        tracing::debug!(%url, ?query, "AWDB request");
        let started = Instant::now();

        let network_error = |source| SnotelError::Network {
            path: path.to_string(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        tracing::info!(
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "AWDB request completed"
        );

        if !status.is_success() {
            return Err(SnotelError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| SnotelError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// A request seen by [`MockAwdb`]
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub path: String,
        pub query: Vec<(String, String)>,
    }

    impl RecordedCall {
        pub fn param(&self, name: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }
    }

    /// Canned AWDB responses keyed by path, recording every call.
    #[derive(Default)]
    pub struct MockAwdb {
        responses: HashMap<String, Value>,
        failures: HashMap<String, (u16, String)>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockAwdb {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(mut self, path: &str, body: Value) -> Self {
            self.responses.insert(path.to_string(), body);
            self
        }

        pub fn with_status(mut self, path: &str, status: u16, body: &str) -> Self {
            self.failures
                .insert(path.to_string(), (status, body.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AwdbApi for MockAwdb {
        async fn request(&self, path: &str, query: &Query<'_>) -> Result<Value, SnotelError> {
            self.calls.lock().unwrap().push(RecordedCall {
                path: path.to_string(),
                query: query
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            });

            if let Some((status, body)) = self.failures.get(path) {
                return Err(SnotelError::Http {
                    status: *status,
                    body: body.clone(),
                });
            }

            self.responses
                .get(path)
                .cloned()
                .ok_or_else(|| SnotelError::Http {
                    status: 404,
                    body: format!("no canned response for {}", path),
                })
        }
    }
}
