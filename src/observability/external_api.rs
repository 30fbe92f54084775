//! Correlated logging of external API calls
//!
//! [`ExternalApiLogger`] runs a call body under a fresh [`CorrelationContext`]
//! and emits one `EXTERNAL_API_START` record followed by exactly one terminal
//! record:
//!
//! - `EXTERNAL_API_SUCCESS` when the body returns `Ok`
//! - `EXTERNAL_API_ERROR` when the body returns `Err` or panics
//! - `EXTERNAL_API_CANCELLED` when the call future is dropped before completing
//!
//! All records, and anything logged by the body (including the HTTP
//! interceptor), are emitted inside an `external_api_call` span carrying the
//! correlation id, category, provider and operation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pcf_outbound::observability::{ApiType, CallMetadata, ExternalApiLogger};
//!
//! # async fn run(logger: ExternalApiLogger) -> Result<(), std::io::Error> {
//! let call = CallMetadata::new(ApiType::EmailService, "Postmark", "send_invite");
//! let id = logger
//!     .with_call_result(&call, || async { Ok::<_, std::io::Error>(42) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, field};

use super::correlation::{self, CorrelationContext, generate_correlation_id};
use super::metrics::{CallStatus, record_external_call};
use crate::config::ApiLoggingConfig;
use crate::logging::sanitize_url;

/// Classification of an outbound call's purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiType {
    MachineTranslation,
    OauthAuthentication,
    Webhook,
    ContentDelivery,
    Telemetry,
    Recaptcha,
    LlmProvider,
    CachePurging,
    EmailService,
    FileStorage,
}

impl ApiType {
    pub const ALL: [ApiType; 10] = [
        ApiType::MachineTranslation,
        ApiType::OauthAuthentication,
        ApiType::Webhook,
        ApiType::ContentDelivery,
        ApiType::Telemetry,
        ApiType::Recaptcha,
        ApiType::LlmProvider,
        ApiType::CachePurging,
        ApiType::EmailService,
        ApiType::FileStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::MachineTranslation => "MACHINE_TRANSLATION",
            ApiType::OauthAuthentication => "OAUTH_AUTHENTICATION",
            ApiType::Webhook => "WEBHOOK",
            ApiType::ContentDelivery => "CONTENT_DELIVERY",
            ApiType::Telemetry => "TELEMETRY",
            ApiType::Recaptcha => "RECAPTCHA",
            ApiType::LlmProvider => "LLM_PROVIDER",
            ApiType::CachePurging => "CACHE_PURGING",
            ApiType::EmailService => "EMAIL_SERVICE",
            ApiType::FileStorage => "FILE_STORAGE",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiType {
    type Err = String;

    /// Accepts `MACHINE_TRANSLATION`, `machine-translation` and `machine_translation`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ApiType::ALL
            .into_iter()
            .find(|api_type| api_type.as_str() == normalized)
            .ok_or_else(|| format!("Unknown API type: {}", s))
    }
}

/// Who is calling what, for one outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct CallMetadata {
    pub api_type: ApiType,
    pub provider: String,
    pub operation: String,
    pub url: Option<String>,
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
    pub additional_data: BTreeMap<String, serde_json::Value>,
}

impl CallMetadata {
    pub fn new(api_type: ApiType, provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            api_type,
            provider: provider.into(),
            operation: operation.into(),
            url: None,
            user_id: None,
            project_id: None,
            additional_data: BTreeMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_project(mut self, project_id: Option<i64>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }
}

/// Characters and requests consumed against a provider quota
#[derive(Debug, Clone)]
pub struct QuotaUsage {
    pub api_type: ApiType,
    pub provider: String,
    pub operation: String,
    pub characters_used: Option<u64>,
    pub request_count: u32,
    pub remaining_quota: Option<u64>,
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
}

impl QuotaUsage {
    pub fn new(api_type: ApiType, provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            api_type,
            provider: provider.into(),
            operation: operation.into(),
            characters_used: None,
            request_count: 1,
            remaining_quota: None,
            user_id: None,
            project_id: None,
        }
    }
}

/// Throttling signal received from a provider
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub api_type: ApiType,
    pub provider: String,
    pub remaining: Option<u32>,
    pub reset: Option<String>,
    pub retry_after_secs: Option<u64>,
}

impl RateLimit {
    pub fn new(api_type: ApiType, provider: impl Into<String>) -> Self {
        Self {
            api_type,
            provider: provider.into(),
            remaining: None,
            reset: None,
            retry_after_secs: None,
        }
    }
}

/// Structured logging facade for external API calls
#[derive(Clone)]
pub struct ExternalApiLogger {
    config: Arc<ApiLoggingConfig>,
}

impl Default for ExternalApiLogger {
    fn default() -> Self {
        Self::new(Arc::new(ApiLoggingConfig::default()))
    }
}

impl ExternalApiLogger {
    pub fn new(config: Arc<ApiLoggingConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiLoggingConfig {
        &self.config
    }

    /// Run `body` as one correlated call, discarding its value
    pub async fn with_call<F, Fut, E>(&self, call: &CallMetadata, body: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        self.run(call, false, |_: &E| short_type_name::<E>(), body).await
    }

    /// Run `body` as one correlated call and return its result unchanged
    pub async fn with_call_result<F, Fut, T, E>(&self, call: &CallMetadata, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run(call, true, |_: &E| short_type_name::<E>(), body).await
    }

    /// Like [`Self::with_call_result`], with `error_type` naming the failure
    /// category in the ERROR record instead of the error's type name
    pub async fn with_call_result_classified<F, Fut, T, E>(
        &self,
        call: &CallMetadata,
        error_type: fn(&E) -> &'static str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run(call, true, error_type, body).await
    }

    async fn run<F, Fut, T, E>(
        &self,
        call: &CallMetadata,
        report_result: bool,
        error_type: fn(&E) -> &'static str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let context = CorrelationContext {
            correlation_id: generate_correlation_id(),
            api_type: call.api_type,
            provider: call.provider.clone(),
            operation: call.operation.clone(),
            user_id: call.user_id,
            project_id: call.project_id,
        };

        let span = tracing::info_span!(
            "external_api_call",
            correlation_id = %context.correlation_id,
            api_type = %call.api_type,
            provider = %call.provider,
            operation = %call.operation,
            user_id = field::Empty,
            project_id = field::Empty,
        );
        if let Some(user_id) = call.user_id {
            span.record("user_id", user_id);
        }
        if let Some(project_id) = call.project_id {
            span.record("project_id", project_id);
        }

        let correlation_id = context.correlation_id.clone();
        let call_future = async move {
            self.log_start(&correlation_id, call);

            let mut guard = CancellationGuard::new(&correlation_id, call);
            let started = Instant::now();
            let outcome = AssertUnwindSafe(async move { body().await }).catch_unwind().await;
            let elapsed = started.elapsed();
            guard.disarm();

            match outcome {
                Ok(Ok(value)) => {
                    self.log_success(&correlation_id, call, elapsed, report_result);
                    record_external_call(call.api_type, &call.provider, CallStatus::Success, elapsed).await;
                    Ok(value)
                }
                Ok(Err(error)) => {
                    self.log_error(&correlation_id, call, elapsed, error_type(&error), &error.to_string());
                    record_external_call(call.api_type, &call.provider, CallStatus::Error, elapsed).await;
                    Err(error)
                }
                Err(panic) => {
                    self.log_error(&correlation_id, call, elapsed, "panic", panic_message(panic.as_ref()));
                    std::panic::resume_unwind(panic)
                }
            }
        };

        correlation::scope(context, call_future.instrument(span)).await
    }

    fn log_start(&self, correlation_id: &str, call: &CallMetadata) {
        if self.config.is_detailed(call.api_type) {
            let data = if call.additional_data.is_empty() {
                "none".to_string()
            } else {
                serde_json::to_string(&call.additional_data).unwrap_or_else(|_| "unavailable".to_string())
            };

            let url = call
                .url
                .as_deref()
                .map(sanitize_url)
                .unwrap_or_else(|| "N/A".to_string());

            crate::event_at!(
                self.config.level,
                request_id = %correlation_id,
                api_type = %call.api_type,
                provider = %call.provider,
                operation = %call.operation,
                url = %url,
                user_id = %display_or(call.user_id, "N/A"),
                project_id = %display_or(call.project_id, "N/A"),
                data = %data,
                "EXTERNAL_API_START [{}] {} | Provider: {} | Operation: {}",
                correlation_id, call.api_type, call.provider, call.operation
            );
        } else {
            crate::event_at!(
                self.config.level,
                request_id = %correlation_id,
                api_type = %call.api_type,
                provider = %call.provider,
                operation = %call.operation,
                "EXTERNAL_API_START [{}] {} | Provider: {} | Operation: {}",
                correlation_id, call.api_type, call.provider, call.operation
            );
        }
    }

    fn log_success(&self, correlation_id: &str, call: &CallMetadata, elapsed: Duration, report_result: bool) {
        let duration_ms = elapsed.as_millis() as u64;

        if report_result {
            crate::event_at!(
                self.config.level,
                request_id = %correlation_id,
                api_type = %call.api_type,
                provider = %call.provider,
                duration_ms,
                result = "success",
                "EXTERNAL_API_SUCCESS [{}] {} | Provider: {} | Duration: {}ms | Result: success",
                correlation_id, call.api_type, call.provider, duration_ms
            );
        } else {
            crate::event_at!(
                self.config.level,
                request_id = %correlation_id,
                api_type = %call.api_type,
                provider = %call.provider,
                duration_ms,
                "EXTERNAL_API_SUCCESS [{}] {} | Provider: {} | Duration: {}ms",
                correlation_id, call.api_type, call.provider, duration_ms
            );
        }
    }

    fn log_error(&self, correlation_id: &str, call: &CallMetadata, elapsed: Duration, error_type: &str, message: &str) {
        let duration_ms = elapsed.as_millis() as u64;

        tracing::error!(
            request_id = %correlation_id,
            api_type = %call.api_type,
            provider = %call.provider,
            duration_ms,
            error_type = %error_type,
            error_message = %message,
            "EXTERNAL_API_ERROR [{}] {} | Provider: {} | Duration: {}ms | Error: {} | Message: {}",
            correlation_id, call.api_type, call.provider, duration_ms, error_type, message
        );
    }

    /// Record quota consumed by a call. Never fails the caller.
    pub fn log_quota_usage(&self, usage: &QuotaUsage) {
        if !self.config.include_quota_info {
            return;
        }

        tracing::info!(
            api_type = %usage.api_type,
            provider = %usage.provider,
            operation = %usage.operation,
            characters = %display_or(usage.characters_used, "N/A"),
            requests = usage.request_count,
            remaining = %display_or(usage.remaining_quota, "unknown"),
            user_id = %display_or(usage.user_id, "N/A"),
            project_id = %display_or(usage.project_id, "N/A"),
            "API_QUOTA_USAGE {} | Provider: {} | Operation: {} | Characters: {} | Requests: {} | Remaining: {}",
            usage.api_type,
            usage.provider,
            usage.operation,
            display_or(usage.characters_used, "N/A"),
            usage.request_count,
            display_or(usage.remaining_quota, "unknown")
        );
    }

    /// Record a throttling signal from a provider. Never fails the caller.
    pub fn log_rate_limit(&self, limit: &RateLimit) {
        if !self.config.include_quota_info {
            return;
        }

        let remaining = display_or(limit.remaining, "unknown");
        let reset = limit.reset.clone().unwrap_or_else(|| "unknown".to_string());
        let retry_after = display_or(limit.retry_after_secs, "unknown");

        tracing::warn!(
            api_type = %limit.api_type,
            provider = %limit.provider,
            remaining = %remaining,
            reset = %reset,
            retry_after_secs = %retry_after,
            "API_RATE_LIMIT {} | Provider: {} | Remaining: {} | Reset: {} | Retry After: {}s",
            limit.api_type, limit.provider, remaining, reset, retry_after
        );
    }
}

/// Logs `EXTERNAL_API_CANCELLED` if dropped while still armed
struct CancellationGuard<'a> {
    correlation_id: &'a str,
    call: &'a CallMetadata,
    started: Instant,
    armed: bool,
}

impl<'a> CancellationGuard<'a> {
    fn new(correlation_id: &'a str, call: &'a CallMetadata) -> Self {
        Self {
            correlation_id,
            call,
            started: Instant::now(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancellationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                request_id = %self.correlation_id,
                api_type = %self.call.api_type,
                provider = %self.call.provider,
                duration_ms = self.started.elapsed().as_millis() as u64,
                "EXTERNAL_API_CANCELLED [{}] {} | Provider: {}",
                self.correlation_id, self.call.api_type, self.call.provider
            );
        }
    }
}

fn display_or<T: fmt::Display>(value: Option<T>, fallback: &str) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| fallback.to_string())
}

/// Last path segment of a type name, without generic arguments
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::observability::current_call_context;
    use std::str::FromStr;
    use tracing_test::traced_test;

    fn translation_call() -> CallMetadata {
        CallMetadata::new(ApiType::MachineTranslation, "DeepL", "translate")
            .with_url("https://api.deepl.com/v2/translate?auth_key=s3cr3t")
            .with_user(Some(11))
            .with_project(Some(22))
            .with_data("chars", 42)
    }

    fn count_lines(lines: &[&str], marker: &str) -> usize {
        lines.iter().filter(|line| line.contains(marker)).count()
    }

    #[test]
    fn test_api_type_names() {
        assert_eq!(ApiType::MachineTranslation.to_string(), "MACHINE_TRANSLATION");
        assert_eq!(ApiType::from_str("llm-provider"), Ok(ApiType::LlmProvider));
        assert_eq!(ApiType::from_str("oauth_authentication"), Ok(ApiType::OauthAuthentication));
        assert_eq!(ApiType::from_str("WEBHOOK"), Ok(ApiType::Webhook));
        assert!(ApiType::from_str("carrier-pigeon").is_err());

        for api_type in ApiType::ALL {
            let json = serde_json::to_string(&api_type).unwrap();
            assert_eq!(json, format!("\"{}\"", api_type.as_str()));
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<crate::error::DispatchError>(), "DispatchError");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_success_emits_start_and_success_once() {
        let logger = ExternalApiLogger::default();

        let result = logger
            .with_call_result(&translation_call(), || async {
                let context = current_call_context().expect("context inside the call");
                assert_eq!(context.provider, "DeepL");
                assert_eq!(context.user_id, Some(11));
                Ok::<_, std::io::Error>("Hallo")
            })
            .await;

        assert_eq!(result.unwrap(), "Hallo");
        assert!(current_call_context().is_none());

        logs_assert(|lines: &[&str]| {
            match (
                count_lines(lines, "EXTERNAL_API_START"),
                count_lines(lines, "EXTERNAL_API_SUCCESS"),
                count_lines(lines, "EXTERNAL_API_ERROR"),
            ) {
                (1, 1, 0) => Ok(()),
                counts => Err(format!("unexpected (start, success, error) counts: {:?}", counts)),
            }
        });
        assert!(logs_contain("Result: success"));
        assert!(logs_contain("correlation_id="));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_error_is_logged_and_returned_unchanged() {
        let logger = ExternalApiLogger::default();

        let result: Result<(), std::io::Error> = logger
            .with_call(&translation_call(), || async {
                Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "provider timed out"))
            })
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::TimedOut);
        assert!(current_call_context().is_none());

        logs_assert(|lines: &[&str]| {
            match (
                count_lines(lines, "EXTERNAL_API_START"),
                count_lines(lines, "EXTERNAL_API_SUCCESS"),
                count_lines(lines, "EXTERNAL_API_ERROR"),
            ) {
                (1, 0, 1) => Ok(()),
                counts => Err(format!("unexpected (start, success, error) counts: {:?}", counts)),
            }
        });
        assert!(logs_contain("Error: Error | Message: provider timed out"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_classified_error_type() {
        let logger = ExternalApiLogger::default();

        let result: Result<(), std::io::Error> = logger
            .with_call_result_classified(
                &translation_call(),
                |e: &std::io::Error| if e.kind() == std::io::ErrorKind::TimedOut { "timeout" } else { "io" },
                || async { Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow provider")) },
            )
            .await;

        assert!(result.is_err());
        assert!(logs_contain("Error: timeout | Message: slow provider"));
        assert!(logs_contain("error_type=timeout"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_start_hides_secrets_and_respects_detail_switch() {
        let logger = ExternalApiLogger::default();
        logger
            .with_call(&translation_call(), || async { Ok::<_, std::io::Error>(()) })
            .await
            .unwrap();

        assert!(logs_contain("auth_key=***"));
        assert!(!logs_contain("s3cr3t"));
        assert!(logs_contain(r#"data={"chars":42}"#));

        let telemetry = CallMetadata::new(ApiType::Telemetry, "PostHog", "capture")
            .with_url("https://app.posthog.com/capture?token=posthog-url-marker");
        logger
            .with_call(&telemetry, || async { Ok::<_, std::io::Error>(()) })
            .await
            .unwrap();

        // Telemetry is not detailed by default: no URL in START
        assert!(!logs_contain("posthog-url-marker"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_configured_level_applies_to_start_and_success() {
        let config = ApiLoggingConfig {
            level: LogLevel::Warn,
            ..ApiLoggingConfig::default()
        };
        let logger = ExternalApiLogger::new(Arc::new(config));

        logger
            .with_call(&translation_call(), || async { Ok::<_, std::io::Error>(()) })
            .await
            .unwrap();

        logs_assert(|lines: &[&str]| {
            let start_warn = lines
                .iter()
                .any(|line| line.contains("EXTERNAL_API_START") && line.contains("WARN"));
            if start_warn { Ok(()) } else { Err("START was not logged at WARN".to_string()) }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_panic_is_logged_and_context_released() {
        let logger = ExternalApiLogger::default();
        let call = translation_call();

        let outcome = AssertUnwindSafe(logger.with_call(&call, || async {
            if current_call_context().is_some() {
                panic!("provider client exploded");
            }
            Ok::<_, std::io::Error>(())
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert!(current_call_context().is_none());
        assert!(logs_contain("Error: panic | Message: provider client exploded"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_cancelled_call_releases_context() {
        let logger = ExternalApiLogger::default();
        let call = translation_call();

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            logger.with_call(&call, || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, std::io::Error>(())
            }),
        )
        .await;

        assert!(result.is_err());
        assert!(current_call_context().is_none());
        assert!(logs_contain("EXTERNAL_API_CANCELLED"));
        assert!(!logs_contain("EXTERNAL_API_SUCCESS"));
    }

    #[tokio::test]
    async fn test_concurrent_calls_keep_separate_contexts() {
        let logger = ExternalApiLogger::default();

        let deepl = CallMetadata::new(ApiType::MachineTranslation, "DeepL", "translate");
        let openai = CallMetadata::new(ApiType::LlmProvider, "OpenAI", "generate");

        let observe = || async {
            tokio::task::yield_now().await;
            Ok::<_, std::io::Error>(current_call_context().map(|c| c.provider))
        };

        let (first, second) = tokio::join!(
            logger.with_call_result(&deepl, observe),
            logger.with_call_result(&openai, observe),
        );

        assert_eq!(first.unwrap(), Some("DeepL".to_string()));
        assert_eq!(second.unwrap(), Some("OpenAI".to_string()));
    }

    #[test]
    #[traced_test]
    fn test_quota_usage_record() {
        let logger = ExternalApiLogger::default();
        let usage = QuotaUsage {
            characters_used: Some(1200),
            remaining_quota: None,
            project_id: Some(5),
            ..QuotaUsage::new(ApiType::MachineTranslation, "Google", "translate")
        };

        logger.log_quota_usage(&usage);

        assert!(logs_contain("API_QUOTA_USAGE MACHINE_TRANSLATION | Provider: Google"));
        assert!(logs_contain("Characters: 1200 | Requests: 1 | Remaining: unknown"));
        assert!(logs_contain("user_id=N/A"));
        assert!(logs_contain("project_id=5"));
    }

    #[test]
    #[traced_test]
    fn test_rate_limit_record() {
        let logger = ExternalApiLogger::default();
        let limit = RateLimit {
            remaining: Some(0),
            retry_after_secs: Some(30),
            ..RateLimit::new(ApiType::LlmProvider, "OpenAI")
        };

        logger.log_rate_limit(&limit);

        assert!(logs_contain("WARN"));
        assert!(logs_contain("API_RATE_LIMIT LLM_PROVIDER | Provider: OpenAI | Remaining: 0 | Reset: unknown | Retry After: 30s"));
    }

    #[test]
    #[traced_test]
    fn test_quota_records_suppressed_when_disabled() {
        let config = ApiLoggingConfig {
            include_quota_info: false,
            ..ApiLoggingConfig::default()
        };
        let logger = ExternalApiLogger::new(Arc::new(config));

        logger.log_quota_usage(&QuotaUsage::new(ApiType::Telemetry, "PostHog", "capture"));
        logger.log_rate_limit(&RateLimit::new(ApiType::Telemetry, "PostHog"));

        assert!(!logs_contain("API_QUOTA_USAGE"));
        assert!(!logs_contain("API_RATE_LIMIT"));
    }
}
