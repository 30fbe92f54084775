//! Observability for outbound API calls
//!
//! This module provides:
//! - Call-scoped correlation contexts propagated through task-local storage
//! - Structured START/SUCCESS/ERROR records for every correlated call
//! - Quota and rate-limit records
//! - Prometheus metrics with cardinality controls

pub mod correlation;
pub mod external_api;
pub mod metrics;
pub mod recorder;

pub use correlation::{CorrelationContext, current_call_context, current_correlation_id, generate_correlation_id};
pub use external_api::{ApiType, CallMetadata, ExternalApiLogger, QuotaUsage, RateLimit};
pub use self::metrics::*;
pub use self::recorder::*;
