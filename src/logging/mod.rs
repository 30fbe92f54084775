pub mod sanitization;
pub mod subscriber;

pub use sanitization::*;
pub use subscriber::*;

/// Emit a tracing event at a level chosen at runtime from [`crate::config::LogLevel`]
#[macro_export]
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            $crate::config::LogLevel::Error => ::tracing::error!($($arg)+),
            $crate::config::LogLevel::Warn => ::tracing::warn!($($arg)+),
            $crate::config::LogLevel::Info => ::tracing::info!($($arg)+),
            $crate::config::LogLevel::Debug => ::tracing::debug!($($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, LoggingConfig};
    use tracing_test::traced_test;

    #[test]
    fn test_sanitize_request_line() {
        let url = "https://api-free.deepl.com/v2/translate?auth_key=abc&target_lang=DE";
        let body = r#"{"text":["Hello"],"auth_key":"abc"}"#;

        let logged = format!("{} | {}", sanitize_url(url), sanitize_body(body));
        assert!(!logged.contains("abc"));
        assert!(logged.contains("target_lang=DE"));
        assert!(logged.contains(r#""text":["Hello"]"#));
    }

    #[test]
    fn test_subscriber_rejects_invalid_format() {
        let invalid_config = LoggingConfig {
            level: "info".to_string(),
            format: "invalid".to_string(),
        };

        let result = init_subscriber(&invalid_config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unsupported log format"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_panic_hook_lets_calls_record_the_panic() {
        use crate::observability::{ApiType, CallMetadata, ExternalApiLogger};
        use futures::FutureExt;
        use std::panic::AssertUnwindSafe;

        install_panic_hook();

        let logger = ExternalApiLogger::default();
        let call = CallMetadata::new(ApiType::LlmProvider, "OpenAI", "generate");
        let outcome = AssertUnwindSafe(logger.with_call(&call, || async {
            if call.provider == "OpenAI" {
                panic!("decoder blew up");
            }
            Ok::<_, std::io::Error>(())
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert!(logs_contain("FATAL: Panic occurred"));
        assert!(logs_contain("Error: panic | Message: decoder blew up"));
    }

    #[test]
    #[traced_test]
    fn test_event_at_runtime_level() {
        event_at!(LogLevel::Warn, marker = "level-check", "runtime level event");
        event_at!(LogLevel::Debug, "debug level event");

        assert!(logs_contain("WARN"));
        assert!(logs_contain("runtime level event"));
        assert!(logs_contain("debug level event"));
    }
}
