//! HTTP implementation of [`TimestampApi`] using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::api::{RemoteAck, SubmitRequest, TableRequest, TableResponse, TimestampApi};
use crate::error::{ClientError, Result};

/// Production endpoint of the timestamping service.
pub const DEFAULT_ENDPOINT: &str = "https://api.originstamp.org";

/// Connection settings for [`HttpTimestampApi`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL, without a trailing slash.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(45),
            max_redirects: 5,
            user_agent: format!("originstamp-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Talks to the timestamping service over HTTPS.
pub struct HttpTimestampApi {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpTimestampApi {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// The configured base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the submission request without sending it.
    pub fn submit_request(
        &self,
        api_key: &str,
        request: &SubmitRequest,
    ) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/api/{}", self.endpoint, request.hash_string))
            .header(AUTHORIZATION, api_key)
            .json(request)
    }

    /// Build the history request without sending it.
    pub fn table_request(&self, api_key: &str, request: &TableRequest) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/api/table", self.endpoint))
            .header(AUTHORIZATION, api_key)
            .json(request)
    }
}

/// Read the body and turn a non-success status into [`ClientError::Status`].
async fn read_body(response: reqwest::Response) -> Result<(u16, String)> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok((status.as_u16(), body))
}

#[async_trait]
impl TimestampApi for HttpTimestampApi {
    async fn submit(&self, api_key: &str, request: &SubmitRequest) -> Result<RemoteAck> {
        debug!(digest = %request.hash_string, endpoint = %self.endpoint, "Submitting digest");
        let response = self.submit_request(api_key, request).send().await?;
        let (status, body) = read_body(response).await?;
        Ok(RemoteAck { status, body })
    }

    async fn table(&self, api_key: &str, request: &TableRequest) -> Result<TableResponse> {
        debug!(
            offset = request.offset,
            records = request.records,
            "Fetching submission table"
        );
        let response = self.table_request(api_key, request).send().await?;
        let (_, body) = read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
