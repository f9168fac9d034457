use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::debug;
use url::Url;

use crate::auth::Authenticator;
use crate::bag::{PropertyBag, render_value};
use crate::config;
use crate::connector::Connector;
use crate::error::CorralError;
use crate::hooks::{RequestMiddleware, ResponseInterceptor};
use crate::mock::MockClient;
use crate::request::{BodyFormat, Request};
use crate::response::{Response, ResponseFactory};
use crate::sender::Sender;

/// Parses a connector base URL, rejecting empty or malformed values.
pub(crate) fn resolve_base_url(raw: &str) -> Result<Url, CorralError> {
    if raw.trim().is_empty() {
        return Err(CorralError::InvalidConnector {
            reason: "connector base URL is empty".to_string(),
        });
    }
    raw.parse::<Url>().map_err(|error| CorralError::InvalidConnector {
        reason: format!("cannot parse base URL '{raw}': {error}"),
    })
}

/// Resolves an endpoint against a base URL; absolute endpoints win as-is.
pub(crate) fn join_url(base: &Url, endpoint: &str) -> Result<Url, CorralError> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return Ok(endpoint.parse::<Url>()?);
    }
    let base = base.as_str().trim_end_matches('/');
    let joined = format!("{base}/{}", endpoint.trim_start_matches('/'));
    Ok(joined.parse::<Url>()?)
}

/// The fully merged, authenticated, booted snapshot of one logical call.
///
/// Built exactly once per send from a (connector, request) pair; the send
/// operation consumes it and carries it into the [`Response`] as a
/// back-reference. Neither source object is mutated during the build, so
/// sending the same request twice produces two independent snapshots.
///
/// Mutable accessors exist for boot hooks, plugins, middleware, and
/// authenticators; once [`send`](Self::send) is called the snapshot is out
/// of reach.
#[derive(Clone)]
pub struct PendingRequest {
    method: Method,
    base_url: Url,
    endpoint: String,
    headers: PropertyBag,
    query: PropertyBag,
    body: PropertyBag,
    config: PropertyBag,
    body_format: BodyFormat,
    authenticator: Option<Arc<dyn Authenticator>>,
    sender: Arc<dyn Sender>,
    mock_client: Option<MockClient>,
    middleware: Vec<Arc<dyn RequestMiddleware>>,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    response_factory: Option<ResponseFactory>,
}

impl PendingRequest {
    /// Builds the snapshot from a connector/request pair.
    ///
    /// The steps run in a fixed order; later steps may read the results of
    /// earlier ones:
    ///
    /// 1. resolve the mock client (request override, else connector's)
    /// 2. merge property bags and hook lists, connector level first
    /// 3. resolve and apply the authenticator
    /// 4. connector boot hook, then request boot hook
    /// 5. plugins, connector-attached before request-attached
    pub(crate) fn from_pair<C, R>(connector: &C, request: &R) -> Result<Self, CorralError>
    where
        C: Connector + ?Sized,
        R: Request + ?Sized,
    {
        let base_url = resolve_base_url(&connector.base_url())?;

        let mock_client = request.mock_client().or_else(|| connector.mock_client());

        let headers = connector.default_headers().merge(&request.default_headers());
        let query = connector.default_query().merge(&request.default_query());
        let body = connector.default_body().merge(&request.default_body());
        let config = connector.default_config().merge(&request.default_config());

        let (mut middleware, mut interceptors) = config::global_hooks();
        middleware.extend(connector.middleware());
        middleware.extend(request.middleware());
        interceptors.extend(connector.response_interceptors());
        interceptors.extend(request.response_interceptors());

        let mut pending = Self {
            method: request.method(),
            base_url,
            endpoint: request.endpoint(),
            headers,
            query,
            body,
            config,
            body_format: request.body_format(),
            authenticator: None,
            sender: connector.sender(),
            mock_client,
            middleware,
            interceptors,
            response_factory: request.response_factory(),
        };

        let authenticator = request
            .authenticator()
            .or_else(|| connector.authenticator());
        if let Some(authenticator) = &authenticator {
            authenticator.apply(&mut pending);
        }
        pending.authenticator = authenticator;

        connector.boot(&mut pending);
        request.boot(&mut pending);

        for plugin in connector.plugins() {
            plugin.boot(&mut pending);
        }
        for plugin in request.plugins() {
            plugin.boot(&mut pending);
        }

        Ok(pending)
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Endpoint as supplied by the request.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The resolved URL: base plus endpoint plus query bag, query pairs
    /// appended in insertion order.
    pub fn url(&self) -> Result<Url, CorralError> {
        let mut url = join_url(&self.base_url, &self.endpoint)?;
        if !self.query.is_empty() {
            let pairs = self
                .query
                .iter()
                .map(|(key, value)| Ok((key.to_string(), render_value(value)?)))
                .collect::<Result<Vec<_>, CorralError>>()?;
            let mut editor = url.query_pairs_mut();
            for (key, value) in &pairs {
                editor.append_pair(key, value);
            }
            drop(editor);
        }
        Ok(url)
    }

    /// Merged header bag.
    pub fn headers(&self) -> &PropertyBag {
        &self.headers
    }

    /// Mutable header bag, for hooks and authenticators.
    pub fn headers_mut(&mut self) -> &mut PropertyBag {
        &mut self.headers
    }

    /// Merged query bag.
    pub fn query(&self) -> &PropertyBag {
        &self.query
    }

    /// Mutable query bag, for hooks and authenticators.
    pub fn query_mut(&mut self) -> &mut PropertyBag {
        &mut self.query
    }

    /// Merged body bag.
    pub fn body(&self) -> &PropertyBag {
        &self.body
    }

    /// Mutable body bag, for hooks.
    pub fn body_mut(&mut self) -> &mut PropertyBag {
        &mut self.body
    }

    /// Merged config bag.
    pub fn config(&self) -> &PropertyBag {
        &self.config
    }

    /// Mutable config bag, for hooks.
    pub fn config_mut(&mut self) -> &mut PropertyBag {
        &mut self.config
    }

    /// Body wire encoding.
    pub fn body_format(&self) -> BodyFormat {
        self.body_format
    }

    /// Sets the body wire encoding, for hooks.
    pub fn set_body_format(&mut self, format: BodyFormat) {
        self.body_format = format;
    }

    /// The resolved authenticator, if any.
    pub fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
        self.authenticator.as_ref()
    }

    /// The resolved mock client, if any.
    pub fn mock_client(&self) -> Option<&MockClient> {
        self.mock_client.as_ref()
    }

    /// Appends outbound middleware, for boot hooks.
    pub fn push_middleware(&mut self, middleware: Arc<dyn RequestMiddleware>) {
        self.middleware.push(middleware);
    }

    /// Appends a response interceptor, for boot hooks.
    pub fn push_response_interceptor(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub(crate) fn take_response_factory(&mut self) -> Option<ResponseFactory> {
        self.response_factory.take()
    }

    /// Dispatches the snapshot: middleware first, then mock or transport,
    /// then response interceptors.
    ///
    /// With a mock client resolved, the request is recorded to the mock's
    /// log before matching; an unmatched request fails with
    /// [`CorralError::UnmatchedMock`]. Otherwise the resolved sender
    /// performs the I/O and transport failures surface unmodified.
    pub async fn send(mut self) -> Result<Response, CorralError> {
        let middleware = self.middleware.clone();
        for hook in &middleware {
            hook.handle(&mut self);
        }

        let interceptors = self.interceptors.clone();
        let mut response = match self.mock_client.clone() {
            Some(mock) => {
                mock.record(&self);
                debug!(method = %self.method, endpoint = %self.endpoint, "dispatching to mock client");
                let Some(mocked) = mock.find(&self) else {
                    let url = self
                        .url()
                        .map(|url| url.to_string())
                        .unwrap_or_else(|_| self.endpoint.clone());
                    return Err(CorralError::UnmatchedMock {
                        method: self.method.clone(),
                        url,
                    });
                };
                let (status, headers, body) = mocked.into_parts()?;
                Response::build(status, headers, body, self)?
            }
            None => {
                let sender = Arc::clone(&self.sender);
                debug!(method = %self.method, endpoint = %self.endpoint, "sending...");
                let response = sender.send(self).await?;
                debug!(status = %response.status(), "...receiving");
                response
            }
        };

        for hook in &interceptors {
            hook.handle(&mut response);
        }
        Ok(response)
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("base_url", &self.base_url.as_str())
            .field("endpoint", &self.endpoint)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("config", &self.config)
            .field("body_format", &self.body_format)
            .field("authenticator", &self.authenticator)
            .field("mock_client", &self.mock_client.is_some())
            .field("middleware", &self.middleware.len())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
