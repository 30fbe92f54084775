pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod observability;

pub use client::{ApiRequest, CallDescriptor, CallScope, HttpClient, Json, NoContent};
pub use config::AppConfig;
pub use error::*;
pub use observability::{ApiType, CallMetadata, ExternalApiLogger, current_call_context};
