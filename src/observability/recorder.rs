//! Prometheus metrics recorder with cardinality controls
//!
//! This module provides the metrics recording infrastructure with:
//! - A Prometheus recorder installed as the global `metrics` recorder
//! - Global cardinality limiting for provider labels
//! - Service-level labels (service name, environment, version)

use std::sync::{Arc, OnceLock};
use anyhow::{Result, anyhow};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::CardinalityLimiter;
use crate::config::MetricsSettings;

/// Configuration for metrics collection
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Service environment (dev, staging, prod)
    pub environment: String,
    /// Maximum unique provider labels to prevent cardinality explosion
    pub max_provider_labels: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_provider_labels: 50,
        }
    }
}

impl From<&MetricsSettings> for MetricsConfig {
    fn from(settings: &MetricsSettings) -> Self {
        Self {
            environment: settings.environment.clone(),
            max_provider_labels: settings.max_provider_labels,
        }
    }
}

/// Global metrics manager with Prometheus integration
pub struct MetricsManager {
    handle: PrometheusHandle,
    config: MetricsConfig,
    cardinality_limiter: Arc<CardinalityLimiter>,
}

impl MetricsManager {
    /// Get Prometheus metrics output
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Get cardinality limiter for provider labels
    pub fn cardinality_limiter(&self) -> Arc<CardinalityLimiter> {
        self.cardinality_limiter.clone()
    }

    /// Get current metrics configuration
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }
}

/// Global metrics instance (initialized once at startup)
static METRICS_MANAGER: OnceLock<Arc<MetricsManager>> = OnceLock::new();

/// Install the Prometheus recorder and the global metrics manager
pub fn init_metrics(config: MetricsConfig) -> Result<()> {
    if METRICS_MANAGER.get().is_some() {
        return Err(anyhow!("Metrics manager was already initialized"));
    }

    let recorder = PrometheusBuilder::new()
        .add_global_label("service", "pcf-outbound")
        .add_global_label("environment", &config.environment)
        .add_global_label("version", env!("CARGO_PKG_VERSION"))
        .build_recorder();
    let handle = recorder.handle();

    metrics::set_global_recorder(recorder)
        .map_err(|_| anyhow!("Failed to install Prometheus recorder: a global recorder is already set"))?;

    tracing::info!(
        environment = %config.environment,
        max_providers = %config.max_provider_labels,
        "Prometheus metrics recorder initialized"
    );

    let manager = Arc::new(MetricsManager {
        handle,
        cardinality_limiter: Arc::new(CardinalityLimiter::new(config.max_provider_labels)),
        config,
    });

    match METRICS_MANAGER.set(manager) {
        Ok(()) => Ok(()),
        Err(_) => Err(anyhow!("Metrics manager was already initialized")),
    }
}

/// Get global metrics manager instance
pub fn get_metrics_manager() -> Result<Arc<MetricsManager>> {
    METRICS_MANAGER
        .get()
        .cloned()
        .ok_or_else(|| anyhow!("Metrics manager not initialized. Call init_metrics() first."))
}

/// Install the recorder once for the whole test binary
#[cfg(test)]
pub(crate) fn init_test_metrics() -> Arc<MetricsManager> {
    let _ = init_metrics(MetricsConfig {
        environment: "test".to_string(),
        max_provider_labels: 1000,
    });
    get_metrics_manager().expect("metrics manager should be initialized")
}
