//! Outbound HTTP client with correlated, redacted logging
//!
//! [`HttpClient`] is the single entry point for calls to third-party
//! providers. Categorized calls run under [`ExternalApiLogger`] so every
//! record they produce shares one correlation id; uncategorized calls get a
//! single `HTTP_REQUEST` line. Both go through a [`Transport`], which is
//! wrapped in a [`LoggingTransport`] when API logging is enabled.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pcf_outbound::client::{ApiRequest, CallScope, HttpClient, Json};
//! use pcf_outbound::config::AppConfig;
//! use serde_json::{Value, json};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = HttpClient::from_config(&AppConfig::default())?;
//! let request = ApiRequest::post("https://api-free.deepl.com/v2/translate", json!({"text": ["Hello"]}))
//!     .header("Authorization", "DeepL-Auth-Key ...");
//!
//! let Json(response): Json<Value> = client
//!     .request_for_machine_translation("DeepL", request, CallScope::new().project(42))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod interceptor;
pub mod provider;
pub mod request;
pub mod transport;

pub use interceptor::LoggingTransport;
pub use provider::provider_from_url;
pub use request::{ApiRequest, CallDescriptor, CallScope, ExpectedResponse, Json, NoContent};
pub use transport::{OutboundRequest, OutboundResponse, ReqwestTransport, Transport};

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{ApiLoggingConfig, AppConfig};
use crate::error::{DispatchError, TransportError};
use crate::logging::{loggable_body, sanitize_url};
use crate::observability::{ApiType, CallMetadata, ExternalApiLogger};

#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    webhook_transport: Arc<dyn Transport>,
    logger: ExternalApiLogger,
    config: Arc<ApiLoggingConfig>,
}

impl HttpClient {
    /// Build a client over the given transports. Both are wrapped in a
    /// [`LoggingTransport`] when `config.enabled` is set.
    pub fn new(
        transport: Arc<dyn Transport>,
        webhook_transport: Arc<dyn Transport>,
        config: ApiLoggingConfig,
    ) -> Self {
        let config = Arc::new(config);

        let (transport, webhook_transport) = if config.enabled {
            (
                Arc::new(LoggingTransport::new(transport, config.clone())) as Arc<dyn Transport>,
                Arc::new(LoggingTransport::new(webhook_transport, config.clone())) as Arc<dyn Transport>,
            )
        } else {
            (transport, webhook_transport)
        };

        Self {
            transport,
            webhook_transport,
            logger: ExternalApiLogger::new(config.clone()),
            config,
        }
    }

    /// Build reqwest-backed transports from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.http)?;
        let webhook_transport = ReqwestTransport::for_webhooks(&config.http)?;

        tracing::debug!(
            connect_timeout_ms = config.http.connect_timeout_ms,
            request_timeout_ms = config.http.request_timeout_ms,
            webhook_timeout_ms = config.http.webhook_timeout_ms,
            interceptor = config.api_logging.enabled,
            "HTTP client configured"
        );

        Ok(Self::new(
            Arc::new(transport),
            Arc::new(webhook_transport),
            config.api_logging.clone(),
        ))
    }

    /// Logger sharing this client's configuration, for quota and rate-limit records
    pub fn logger(&self) -> &ExternalApiLogger {
        &self.logger
    }

    /// Run a call as one correlated external API call
    pub async fn dispatch_categorized<B, R>(&self, descriptor: CallDescriptor<B>) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let CallDescriptor { request, metadata } = descriptor;

        let mut metadata = metadata
            .with_data("method", request.method.as_str())
            .with_data("body_type", request.body_type());
        if metadata.url.is_none() {
            metadata.url = Some(request.url.clone());
        }

        let transport = self.transport_for(metadata.api_type);
        self.logger
            .with_call_result_classified(&metadata, DispatchError::kind, || self.execute(transport, request))
            .await
    }

    /// Send a call that belongs to no category. Logged as a single
    /// `HTTP_REQUEST` line instead of a correlated call.
    pub async fn dispatch_uncategorized<B, R>(&self, request: ApiRequest<B>) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let url = sanitize_url(&request.url);
        let body_type = request.body_type();
        let timestamp = chrono::Utc::now().to_rfc3339();

        tracing::info!(
            method = %request.method,
            url = %url,
            body_type,
            "HTTP_REQUEST {} {} | Body: {} | Timestamp: {}",
            request.method, url, body_type, timestamp
        );

        self.execute(&self.transport, request).await
    }

    pub async fn request_for_machine_translation<B, R>(
        &self,
        provider: &str,
        request: ApiRequest<B>,
        scope: CallScope,
    ) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let metadata = scoped_metadata(ApiType::MachineTranslation, provider.to_string(), "translate", &scope);
        self.dispatch_categorized(CallDescriptor::new(request, metadata)).await
    }

    pub async fn request_for_auth<B, R>(
        &self,
        provider: &str,
        request: ApiRequest<B>,
        scope: CallScope,
    ) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let metadata = scoped_metadata(ApiType::OauthAuthentication, provider.to_string(), "authenticate", &scope);
        self.dispatch_categorized(CallDescriptor::new(request, metadata)).await
    }

    /// Webhook delivery. The provider comes from `scope.provider` or is
    /// derived from the URL host.
    pub async fn request_for_webhook<B, R>(&self, request: ApiRequest<B>, scope: CallScope) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let provider = scope
            .provider
            .clone()
            .unwrap_or_else(|| provider_from_url(&request.url));
        let metadata = scoped_metadata(ApiType::Webhook, provider, "webhook_call", &scope);
        self.dispatch_categorized(CallDescriptor::new(request, metadata)).await
    }

    pub async fn request_for_llm<B, R>(
        &self,
        provider: &str,
        request: ApiRequest<B>,
        scope: CallScope,
    ) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let metadata = scoped_metadata(ApiType::LlmProvider, provider.to_string(), "generate", &scope);
        self.dispatch_categorized(CallDescriptor::new(request, metadata)).await
    }

    fn transport_for(&self, api_type: ApiType) -> &Arc<dyn Transport> {
        match api_type {
            ApiType::Webhook => &self.webhook_transport,
            _ => &self.transport,
        }
    }

    async fn execute<B, R>(&self, transport: &Arc<dyn Transport>, request: ApiRequest<B>) -> Result<R, DispatchError>
    where
        B: Serialize,
        R: ExpectedResponse,
    {
        let ApiRequest { method, url, body, mut headers } = request;

        let body = match body {
            Some(body) => serde_json::to_string(&body).map_err(DispatchError::Encode)?,
            None => String::new(),
        };
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));

        let response = transport
            .execute(OutboundRequest { method, url, headers, body })
            .await?;

        if !response.status.is_success() {
            return Err(DispatchError::Status {
                status: response.status.as_u16(),
                body_excerpt: self.excerpt(&response.body),
            });
        }

        let body: &[u8] = if R::HAS_BODY { &response.body } else { &[] };
        R::decode(body).map_err(|source| DispatchError::Decode {
            body_excerpt: self.excerpt(&response.body),
            source,
        })
    }

    /// Sanitized, truncated view of a response body for error values
    fn excerpt(&self, body: &[u8]) -> String {
        loggable_body(&String::from_utf8_lossy(body), true, self.config.max_payload_length)
    }
}

fn scoped_metadata(api_type: ApiType, provider: String, default_operation: &str, scope: &CallScope) -> CallMetadata {
    let operation = scope.operation.as_deref().unwrap_or(default_operation);

    CallMetadata::new(api_type, provider, operation)
        .with_user(scope.user_id)
        .with_project(scope.project_id)
}
