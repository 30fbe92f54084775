//! HTTP transport boundary
//!
//! [`Transport`] is the seam between call dispatch and the network. The
//! production implementation is [`ReqwestTransport`]; the logging interceptor
//! and test doubles implement the same trait.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{TransportError, TransportErrorKind};

/// A fully encoded outbound request
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Raw response as received from the provider, any status
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl OutboundResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, if it is valid text
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Sends one request and returns the raw response.
///
/// Non-success statuses are responses, not errors; only failures to obtain a
/// response at all are reported as [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError>;
}

/// Transport backed by a `reqwest` client. Cookies are never stored.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport for general provider calls
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        Self::with_timeouts(
            &config.user_agent,
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    /// Transport for webhooks: short connect and request timeouts so a slow
    /// receiver cannot hold up the caller
    pub fn for_webhooks(config: &HttpConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_millis(config.webhook_timeout_ms);
        Self::with_timeouts(&config.user_agent, timeout, timeout)
    }

    fn with_timeouts(user_agent: &str, connect: Duration, request: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect)
            .timeout(request)
            .build()
            .map_err(|e| {
                TransportError::new(TransportErrorKind::Request, format!("Failed to build HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(OutboundResponse { status, headers, body })
    }
}
