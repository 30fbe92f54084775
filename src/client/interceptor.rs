//! Request/response logging at the transport boundary
//!
//! [`LoggingTransport`] decorates any [`Transport`] and writes three kinds of
//! records, all with sensitive values masked:
//!
//! - `API_REQUEST` before the request is sent
//! - `API_RESPONSE` once a response arrives (any status)
//! - `API_REQUEST_ERROR` when the transport fails
//!
//! Logging never changes what the caller receives. Transport errors are
//! returned exactly as the inner transport produced them, and a response body
//! that cannot be rendered as text only degrades the record.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::transport::{OutboundRequest, OutboundResponse, Transport};
use crate::config::ApiLoggingConfig;
use crate::error::TransportError;
use crate::logging::{header_values, loggable_body, sanitize_headers, sanitize_url};
use crate::observability::{current_call_context, generate_correlation_id, record_http_exchange};

pub struct LoggingTransport {
    inner: Arc<dyn Transport>,
    config: Arc<ApiLoggingConfig>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn Transport>, config: Arc<ApiLoggingConfig>) -> Self {
        Self { inner, config }
    }

    /// Payloads are logged unless the active call's category has detailed
    /// logging switched off
    fn include_payload(&self) -> bool {
        if !self.config.include_payload {
            return false;
        }
        current_call_context()
            .map(|context| self.config.is_detailed(context.api_type))
            .unwrap_or(true)
    }

    fn url_for_log(&self, url: &str) -> String {
        if self.config.sanitize_sensitive_data {
            sanitize_url(url)
        } else {
            url.to_string()
        }
    }

    fn headers_for_log(&self, headers: &reqwest::header::HeaderMap) -> String {
        if !self.config.include_headers {
            return "omitted".to_string();
        }
        let headers = if self.config.sanitize_sensitive_data {
            sanitize_headers(headers)
        } else {
            header_values(headers)
        };
        format!("{:?}", headers)
    }

    fn body_for_log(&self, body: &str, include_payload: bool) -> String {
        if !include_payload {
            return "omitted".to_string();
        }
        loggable_body(body, self.config.sanitize_sensitive_data, self.config.max_payload_length)
    }

    fn duration_for_log(&self, elapsed: Duration) -> String {
        if self.config.include_timing {
            format!("{}ms", elapsed.as_millis())
        } else {
            "n/a".to_string()
        }
    }

    fn log_request(&self, request_id: &str, request: &OutboundRequest, include_payload: bool) {
        let url = self.url_for_log(&request.url);
        let headers = self.headers_for_log(&request.headers);
        let body = self.body_for_log(&request.body, include_payload);

        crate::event_at!(
            self.config.level,
            request_id = %request_id,
            method = %request.method,
            url = %url,
            "API_REQUEST [{}] {} {} | Headers: {} | Body: {}",
            request_id, request.method, url, headers, body
        );
    }

    fn log_response(&self, request_id: &str, response: &OutboundResponse, elapsed: Duration, include_payload: bool) {
        let status = response.status.as_u16();
        let reason = response.status.canonical_reason().unwrap_or("");
        let headers = self.headers_for_log(&response.headers);
        let duration = self.duration_for_log(elapsed);

        match response.text() {
            Some(text) => {
                let body = self.body_for_log(text, include_payload);
                crate::event_at!(
                    self.config.level,
                    request_id = %request_id,
                    status,
                    "API_RESPONSE [{}] {} {} | Duration: {} | Headers: {} | Body: {}",
                    request_id, status, reason, duration, headers, body
                );
            }
            None => {
                tracing::warn!(
                    request_id = %request_id,
                    status,
                    body_bytes = response.body.len(),
                    "API_RESPONSE [{}] {} {} | Duration: {} | Headers: {} | Body: <failed to read>",
                    request_id, status, reason, duration, headers
                );
            }
        }
    }

    fn log_error(&self, request_id: &str, method: &reqwest::Method, url: &str, elapsed: Duration, error: &TransportError) {
        let url = self.url_for_log(url);
        let duration = self.duration_for_log(elapsed);

        tracing::error!(
            request_id = %request_id,
            method = %method,
            url = %url,
            error_kind = %error.kind,
            "API_REQUEST_ERROR [{}] {} {} | Duration: {} | Error: {} | Message: {}",
            request_id, method, url, duration, error.kind, error.message
        );
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let request_id = generate_correlation_id();
        let include_payload = self.include_payload();

        self.log_request(&request_id, &request, include_payload);

        let method = request.method.clone();
        let url = request.url.clone();
        let started = Instant::now();

        match self.inner.execute(request).await {
            Ok(response) => {
                let elapsed = started.elapsed();
                self.log_response(&request_id, &response, elapsed, include_payload);
                record_http_exchange(method.as_str(), Some(response.status.as_u16()), elapsed).await;
                Ok(response)
            }
            Err(error) => {
                let elapsed = started.elapsed();
                self.log_error(&request_id, &method, &url, elapsed, &error);
                record_http_exchange(method.as_str(), None, elapsed).await;
                Err(error)
            }
        }
    }
}
