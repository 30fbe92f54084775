//! Prometheus metrics for outbound API calls
//!
//! - `external_api_call_total` / `external_api_call_duration_seconds`:
//!   one sample per correlated call, labelled by category, provider and status
//! - `outbound_http_request_total` / `outbound_http_request_duration_seconds`:
//!   one sample per intercepted HTTP exchange, status bucketed
//!
//! # Cardinality Control
//!
//! Webhook providers are derived from arbitrary hosts, so provider labels go
//! through a [`CardinalityLimiter`]. Status codes are bucketed (2xx … 5xx).
//! User and project ids are never used as labels.
//!
//! Recording is a no-op until [`super::init_metrics`] has been called.

use std::sync::Arc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use metrics::{counter, histogram};

use super::ApiType;
use super::recorder::get_metrics_manager;

/// Outcome of a correlated call for metrics labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

/// Cardinality limiter to prevent metric explosion
pub struct CardinalityLimiter {
    max_labels: usize,
    labels: Arc<RwLock<HashMap<String, bool>>>,
}

impl CardinalityLimiter {
    pub fn new(max_labels: usize) -> Self {
        Self {
            max_labels,
            labels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get label value, returning "other" if over cardinality limit
    pub async fn get_label(&self, value: &str) -> String {
        if self.labels.read().await.contains_key(value) {
            return value.to_string();
        }

        let mut labels = self.labels.write().await;

        if labels.contains_key(value) {
            return value.to_string();
        }

        if labels.len() < self.max_labels {
            labels.insert(value.to_string(), true);
            return value.to_string();
        }

        "other".to_string()
    }

    pub async fn label_count(&self) -> usize {
        self.labels.read().await.len()
    }
}

/// Bucket HTTP status codes to control cardinality
pub fn bucket_status_code(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Record the outcome of one correlated external API call
pub async fn record_external_call(
    api_type: ApiType,
    provider: &str,
    status: CallStatus,
    duration: Duration,
) {
    let Ok(manager) = get_metrics_manager() else {
        return;
    };

    let provider_label = manager.cardinality_limiter().get_label(provider).await;

    counter!(
        "external_api_call_total",
        "api_type" => api_type.as_str(),
        "provider" => provider_label.clone(),
        "status" => status.as_str()
    ).increment(1);

    histogram!(
        "external_api_call_duration_seconds",
        "api_type" => api_type.as_str(),
        "provider" => provider_label.clone(),
        "status" => status.as_str()
    ).record(duration.as_secs_f64());

    tracing::debug!(
        api_type = %api_type,
        provider = %provider_label,
        status = %status.as_str(),
        duration_ms = %duration.as_millis(),
        "External API call metrics recorded"
    );
}

/// Record one intercepted HTTP exchange; `status_code` is `None` when the
/// transport failed before a response arrived
pub async fn record_http_exchange(method: &str, status_code: Option<u16>, duration: Duration) {
    if get_metrics_manager().is_err() {
        return;
    }

    let status = status_code.map(bucket_status_code).unwrap_or("transport_error");

    counter!(
        "outbound_http_request_total",
        "method" => method.to_string(),
        "status" => status
    ).increment(1);

    histogram!(
        "outbound_http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    ).record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::recorder::init_test_metrics;

    #[test]
    fn test_bucket_status_code() {
        assert_eq!(bucket_status_code(200), "2xx");
        assert_eq!(bucket_status_code(204), "2xx");
        assert_eq!(bucket_status_code(301), "3xx");
        assert_eq!(bucket_status_code(429), "4xx");
        assert_eq!(bucket_status_code(503), "5xx");
        assert_eq!(bucket_status_code(99), "other");
    }

    #[tokio::test]
    async fn test_cardinality_limiter() {
        let limiter = CardinalityLimiter::new(3);

        assert_eq!(limiter.get_label("DeepL").await, "DeepL");
        assert_eq!(limiter.get_label("Google").await, "Google");
        assert_eq!(limiter.get_label("AWS").await, "AWS");

        // Exceed limit - should return "other"
        assert_eq!(limiter.get_label("hooks-example").await, "other");
        // Known labels keep working
        assert_eq!(limiter.get_label("DeepL").await, "DeepL");

        assert_eq!(limiter.label_count().await, 3);
    }

    #[tokio::test]
    async fn test_external_call_metrics() {
        let manager = init_test_metrics();

        record_external_call(
            ApiType::MachineTranslation,
            "MetricsTestProvider",
            CallStatus::Success,
            Duration::from_millis(120),
        ).await;

        let output = manager.render();
        assert!(output.contains("external_api_call_total"));
        assert!(output.contains("external_api_call_duration_seconds"));
        assert!(output.contains("provider=\"MetricsTestProvider\""));
        assert!(output.contains("api_type=\"MACHINE_TRANSLATION\""));
        assert!(output.contains("status=\"success\""));
    }

    #[tokio::test]
    async fn test_http_exchange_metrics() {
        let manager = init_test_metrics();

        record_http_exchange("PATCH", Some(503), Duration::from_millis(5)).await;
        record_http_exchange("PATCH", None, Duration::from_millis(5)).await;

        let output = manager.render();
        assert!(output.contains("outbound_http_request_total"));
        assert!(output.contains("method=\"PATCH\""));
        assert!(output.contains("status=\"5xx\""));
        assert!(output.contains("status=\"transport_error\""));
    }
}
