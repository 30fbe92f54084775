use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::observability::ApiType;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
pub struct AppConfig {
    #[garde(dive)]
    #[serde(default)]
    pub logging: LoggingConfig,

    #[garde(dive)]
    #[serde(default)]
    pub api_logging: ApiLoggingConfig,

    #[garde(dive)]
    #[serde(default)]
    pub http: HttpConfig,

    #[garde(dive)]
    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    #[garde(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub level: String, // trace, debug, info, warn, error

    #[garde(pattern(r"^(json|pretty)$"))]
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Level used for request, response and START/SUCCESS records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[serde(alias = "error")]
    Error,
    #[serde(alias = "warn")]
    Warn,
    #[default]
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "debug")]
    Debug,
}

/// Settings for outbound API call logging.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ApiLoggingConfig {
    /// Installs the request/response interceptor on the HTTP transports
    #[garde(skip)]
    pub enabled: bool,

    #[garde(skip)]
    pub level: LogLevel,

    /// Include request/response bodies in logs
    #[garde(skip)]
    pub include_payload: bool,

    /// Include request/response headers in logs
    #[garde(skip)]
    pub include_headers: bool,

    /// Maximum number of characters of a logged body
    #[garde(range(min = 1, max = 1_000_000))]
    pub max_payload_length: usize,

    #[garde(skip)]
    pub include_timing: bool,

    #[garde(dive)]
    pub detailed_logging: DetailedLoggingConfig,

    /// Log quota and rate limit information
    #[garde(skip)]
    pub include_quota_info: bool,

    #[garde(skip)]
    pub sanitize_sensitive_data: bool,
}

impl Default for ApiLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Info,
            include_payload: true,
            include_headers: true,
            max_payload_length: 1000,
            include_timing: true,
            detailed_logging: DetailedLoggingConfig::default(),
            include_quota_info: true,
            sanitize_sensitive_data: true,
        }
    }
}

impl ApiLoggingConfig {
    /// Whether URL, payload and additional data are logged for this category
    pub fn is_detailed(&self, api_type: ApiType) -> bool {
        let detailed = &self.detailed_logging;
        match api_type {
            ApiType::MachineTranslation => detailed.machine_translation,
            ApiType::OauthAuthentication => detailed.authentication,
            ApiType::Webhook => detailed.webhooks,
            ApiType::ContentDelivery => detailed.content_delivery,
            ApiType::Telemetry => detailed.telemetry,
            ApiType::LlmProvider => detailed.llm_providers,
            ApiType::FileStorage => detailed.file_storage,
            ApiType::EmailService => detailed.email_services,
            ApiType::Recaptcha | ApiType::CachePurging => false,
        }
    }
}

/// Per-category switches for detailed logging
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct DetailedLoggingConfig {
    #[garde(skip)]
    pub machine_translation: bool,
    #[garde(skip)]
    pub authentication: bool,
    #[garde(skip)]
    pub webhooks: bool,
    #[garde(skip)]
    pub content_delivery: bool,
    #[garde(skip)]
    pub telemetry: bool,
    #[garde(skip)]
    pub llm_providers: bool,
    #[garde(skip)]
    pub file_storage: bool,
    #[garde(skip)]
    pub email_services: bool,
}

impl Default for DetailedLoggingConfig {
    fn default() -> Self {
        Self {
            machine_translation: true,
            authentication: true,
            webhooks: true,
            content_delivery: false,
            telemetry: false,
            llm_providers: true,
            file_storage: false,
            email_services: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct HttpConfig {
    #[garde(range(min = 1, max = 300_000))]
    pub connect_timeout_ms: u64,

    #[garde(range(min = 1, max = 600_000))]
    pub request_timeout_ms: u64,

    /// Applies to both connect and request phases of webhook calls
    #[garde(range(min = 1, max = 60_000))]
    pub webhook_timeout_ms: u64,

    #[garde(length(min = 1))]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 60_000,
            webhook_timeout_ms: 2_000,
            user_agent: format!("pcf-outbound/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct MetricsSettings {
    #[garde(skip)]
    pub enabled: bool,

    #[garde(length(min = 1))]
    pub environment: String,

    /// Distinct provider label values before falling back to "other"
    #[garde(range(min = 1, max = 1000))]
    pub max_provider_labels: usize,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            environment: "development".to_string(),
            max_provider_labels: 50,
        }
    }
}
