//! JSON-over-HTTP query engine adapter.
//!
//! `POST {url}/poll` with `{"queryName": ..., "params": [...]}`; a 2xx body
//! is a [`QueryResult`], anything else is a fault. Faults carry the engine's
//! `{"code": ..., "message": ...}` body when it sends one.

use async_trait::async_trait;
use pollcast_core::{QueryEngine, QueryError, QueryParam, QueryResult};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::QueryEngineConfig;
use crate::USER_AGENT_VALUE;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollRequest<'a> {
    query_name: &'a str,
    params: &'a [QueryParam],
}

#[derive(Debug, Deserialize)]
struct FaultBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Polls a remote query service.
#[derive(Debug, Clone)]
pub struct HttpQueryEngine {
    client: reqwest::Client,
    poll_url: String,
    config: QueryEngineConfig,
}

impl HttpQueryEngine {
    pub fn new(config: QueryEngineConfig) -> Result<Self, QueryError> {
        if config.timeout_ms == 0 {
            return Err(QueryError::Unavailable {
                message: "timeout_ms must be greater than zero".to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(default_headers)
            .build()
            .map_err(|e| QueryError::Unavailable {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let poll_url = format!("{}/poll", config.url.trim_end_matches('/'));

        Ok(Self {
            client,
            poll_url,
            config,
        })
    }

    pub fn from_env() -> Result<Self, QueryError> {
        Self::new(QueryEngineConfig::from_env())
    }

    pub fn poll_url(&self) -> &str {
        &self.poll_url
    }

    fn request_error(&self, err: reqwest::Error) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout {
                after: self.config.timeout(),
            }
        } else {
            QueryError::Unavailable {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn poll(
        &self,
        query_name: &str,
        params: &[QueryParam],
    ) -> Result<QueryResult, QueryError> {
        debug!(url = %self.poll_url, query = query_name, params = params.len(), "polling query engine");

        let response = self
            .client
            .post(&self.poll_url)
            .json(&PollRequest { query_name, params })
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            return Err(fault(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| QueryError::InvalidResponse {
            message: format!("failed to parse query result: {}", e),
        })
    }

    fn engine_name(&self) -> &str {
        "http"
    }
}

fn fault(status: StatusCode, body: &str) -> QueryError {
    match serde_json::from_str::<FaultBody>(body) {
        Ok(fault) => QueryError::Fault {
            code: fault.code,
            message: fault.message,
        },
        Err(_) => QueryError::Fault {
            code: format!("HTTP {}", status.as_u16()),
            message: if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            },
        },
    }
}
