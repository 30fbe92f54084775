//! Request descriptors and expected response shapes

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use crate::observability::CallMetadata;

/// One outbound call before encoding: method, URL, headers and a serializable body
#[derive(Debug, Clone)]
pub struct ApiRequest<B> {
    pub method: Method,
    pub url: String,
    pub body: Option<B>,
    pub headers: HeaderMap,
}

impl<B> ApiRequest<B> {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: B) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header. Invalid names or values are dropped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                tracing::warn!(header = %name, "Ignoring invalid request header");
            }
        }
        self
    }

    /// Short name of the body type, used as call metadata
    pub fn body_type(&self) -> &'static str {
        match self.body {
            Some(_) => crate::observability::external_api::short_type_name::<B>(),
            None => "None",
        }
    }
}

/// A request plus the category, provider and operation it belongs to
#[derive(Debug, Clone)]
pub struct CallDescriptor<B> {
    pub request: ApiRequest<B>,
    pub metadata: CallMetadata,
}

impl<B> CallDescriptor<B> {
    pub fn new(request: ApiRequest<B>, metadata: CallMetadata) -> Self {
        Self { request, metadata }
    }
}

/// Caller-supplied context for the convenience entry points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallScope {
    /// Overrides the entry point's default operation name
    pub operation: Option<String>,
    /// Overrides the provider derived from the URL (webhooks only)
    pub provider: Option<String>,
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
}

impl CallScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// How a successful response body is turned into a value
pub trait ExpectedResponse: Sized {
    /// `false` when the response body is never parsed
    const HAS_BODY: bool = true;

    fn decode(body: &[u8]) -> Result<Self, serde_json::Error>;
}

/// JSON response decoded into `T`; fields `T` does not declare are ignored
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> ExpectedResponse for Json<T> {
    fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body).map(Json)
    }
}

/// No value expected; whatever the provider returns is discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoContent;

impl ExpectedResponse for NoContent {
    const HAS_BODY: bool = false;

    fn decode(_body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(NoContent)
    }
}
