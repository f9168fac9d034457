use std::sync::Arc;

use http::Method;
use serde_json::Value;

use crate::auth::Authenticator;
use crate::bag::PropertyBag;
use crate::hooks::{Plugin, RequestMiddleware, ResponseInterceptor};
use crate::mock::MockClient;
use crate::pending::PendingRequest;
use crate::response::ResponseFactory;

/// How the merged body bag is encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyFormat {
    /// No body is sent.
    #[default]
    None,
    /// Body bag serialized as a JSON object (`application/json`).
    Json,
    /// Body bag serialized as `application/x-www-form-urlencoded`.
    Form,
}

/// A single endpoint definition: method, relative path, and per-request
/// configuration layered on top of the connector's defaults.
///
/// Requests are stateless beyond their properties: one instance per
/// logical call, reusable because the pipeline never mutates it.
pub trait Request: Send + Sync {
    /// HTTP method for this endpoint.
    fn method(&self) -> Method;

    /// Endpoint path, resolved against the connector base URL (absolute
    /// URLs are used as-is).
    fn endpoint(&self) -> String;

    /// Headers layered over the connector's default headers.
    fn default_headers(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Query parameters layered over the connector's defaults.
    fn default_query(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Body fields layered over the connector's defaults.
    fn default_body(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Config options layered over the connector's defaults.
    fn default_config(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Wire encoding for the merged body bag.
    fn body_format(&self) -> BodyFormat {
        BodyFormat::None
    }

    /// Per-request authenticator; overrides the connector's when present.
    fn authenticator(&self) -> Option<Arc<dyn Authenticator>> {
        None
    }

    /// Per-request mock client; overrides the connector's when present.
    fn mock_client(&self) -> Option<MockClient> {
        None
    }

    /// Request-attached outbound middleware, appended after the connector's.
    fn middleware(&self) -> Vec<Arc<dyn RequestMiddleware>> {
        Vec::new()
    }

    /// Request-attached response interceptors, appended after the
    /// connector's.
    fn response_interceptors(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        Vec::new()
    }

    /// Capability modules booted after the connector's plugins.
    fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        Vec::new()
    }

    /// Typed response builder for this endpoint, replacing any dynamic
    /// response-class configuration.
    fn response_factory(&self) -> Option<ResponseFactory> {
        None
    }

    /// Boot hook, invoked after the connector's boot hook with the
    /// in-progress builder.
    fn boot(&self, _request: &mut PendingRequest) {}
}

/// Builder-style [`Request`] implementation for ad hoc endpoints.
///
/// Useful when a full request type is overkill. One-off calls, tests, and
/// the OAuth2 flow's generated requests all use it.
///
/// # Example
///
/// ```rust
/// use corral_core::{BasicRequest, BodyFormat};
///
/// let request = BasicRequest::post("reports")
///     .with_header("Accept", "application/json")
///     .with_query_param("dry_run", true)
///     .with_body_format(BodyFormat::Json)
///     .with_body_field("period", "2026-Q1");
/// ```
#[derive(Debug, Clone)]
pub struct BasicRequest {
    method: Method,
    endpoint: String,
    headers: PropertyBag,
    query: PropertyBag,
    body: PropertyBag,
    config: PropertyBag,
    body_format: BodyFormat,
    authenticator: Option<Arc<dyn Authenticator>>,
    mock_client: Option<MockClient>,
}

impl BasicRequest {
    /// Creates a request with the given method and endpoint.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            headers: PropertyBag::new(),
            query: PropertyBag::new(),
            body: PropertyBag::new(),
            config: PropertyBag::new(),
            body_format: BodyFormat::None,
            authenticator: None,
            mock_client: None,
        }
    }

    /// Creates a GET request.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Creates a POST request.
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Creates a PUT request.
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    /// Creates a DELETE request.
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Adds a header property.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Adds a query parameter property.
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.add(name, value);
        self
    }

    /// Adds a body field property.
    #[must_use]
    pub fn with_body_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.add(name, value);
        self
    }

    /// Adds a config option property.
    #[must_use]
    pub fn with_config(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.add(name, value);
        self
    }

    /// Sets the body wire encoding.
    #[must_use]
    pub fn with_body_format(mut self, format: BodyFormat) -> Self {
        self.body_format = format;
        self
    }

    /// Sets a per-request authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Sets a per-request mock client.
    #[must_use]
    pub fn with_mock_client(mut self, mock_client: MockClient) -> Self {
        self.mock_client = Some(mock_client);
        self
    }

    /// Replaces the endpoint.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Mutable access to the header bag, for request modifiers.
    pub fn headers_mut(&mut self) -> &mut PropertyBag {
        &mut self.headers
    }

    /// Mutable access to the query bag, for request modifiers.
    pub fn query_mut(&mut self) -> &mut PropertyBag {
        &mut self.query
    }

    /// Mutable access to the body bag, for request modifiers.
    pub fn body_mut(&mut self) -> &mut PropertyBag {
        &mut self.body
    }

    /// Mutable access to the config bag, for request modifiers.
    pub fn config_mut(&mut self) -> &mut PropertyBag {
        &mut self.config
    }
}

impl Request for BasicRequest {
    fn method(&self) -> Method {
        self.method.clone()
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn default_headers(&self) -> PropertyBag {
        self.headers.clone()
    }

    fn default_query(&self) -> PropertyBag {
        self.query.clone()
    }

    fn default_body(&self) -> PropertyBag {
        self.body.clone()
    }

    fn default_config(&self) -> PropertyBag {
        self.config.clone()
    }

    fn body_format(&self) -> BodyFormat {
        self.body_format
    }

    fn authenticator(&self) -> Option<Arc<dyn Authenticator>> {
        self.authenticator.clone()
    }

    fn mock_client(&self) -> Option<MockClient> {
        self.mock_client.clone()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_basic_request_builder() {
        let request = BasicRequest::post("widgets")
            .with_header("Accept", "application/json")
            .with_query_param("page", 2)
            .with_body_field("name", "sprocket")
            .with_body_format(BodyFormat::Json);

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.endpoint(), "widgets");
        assert_eq!(
            request.default_headers().get("Accept"),
            Some(&json!("application/json"))
        );
        assert_eq!(request.default_query().get("page"), Some(&json!(2)));
        assert_eq!(request.default_body().get("name"), Some(&json!("sprocket")));
        assert_eq!(request.body_format(), BodyFormat::Json);
    }

    #[test]
    fn test_basic_request_mutators() {
        let mut request = BasicRequest::get("me");
        request.headers_mut().add("X-Trace", "abc");
        request.set_endpoint("profile");

        assert_eq!(request.endpoint(), "profile");
        assert_eq!(request.default_headers().get_str("X-Trace"), Some("abc"));
    }
}
