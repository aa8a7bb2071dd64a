use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use thiserror::Error;
use tracing::debug;

/// Transport failures raised before a response was received.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// HTTP client with a fixed per-request timeout.
///
/// Requests are sent exactly once; callers decide how to react to the status.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, HttpError> {
        let request = builder
            .build()
            .map_err(|err| HttpError::Transport { url: String::new(), reason: err.to_string() })?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) if err.is_timeout() => {
                debug!(%method, %url, "HTTP request timed out");
                Err(HttpError::Timeout { url: url.to_string() })
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(HttpError::Transport { url: url.to_string(), reason: err.to_string() })
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Some(format!("Patcher/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, HttpError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| HttpError::Build(err.to_string()))?;
        Ok(HttpClient { client })
    }
}
