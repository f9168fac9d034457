use std::sync::Arc;

use crate::auth::Authenticator;
use crate::bag::PropertyBag;
use crate::config;
use crate::error::CorralError;
use crate::hooks::{Plugin, RequestMiddleware, ResponseInterceptor};
use crate::mock::MockClient;
use crate::pending::PendingRequest;
use crate::request::Request;
use crate::response::Response;
use crate::sender::Sender;

/// A base API definition: host, shared configuration, default
/// authentication, and the dispatch entry points.
///
/// Implement this once per API; the instance is long-lived and never
/// mutated by the pipeline. Per-call layering comes from [`Request`]
/// implementations sent through [`send`](Self::send).
///
/// # Example
///
/// ```rust,no_run
/// use corral_core::{BasicRequest, Connector, CorralError, PropertyBag};
///
/// struct ForgeApi;
///
/// impl Connector for ForgeApi {
///     fn base_url(&self) -> String {
///         "https://forge.example.com/api/v1".to_string()
///     }
///
///     fn default_headers(&self) -> PropertyBag {
///         PropertyBag::new().with("Accept", "application/json")
///     }
/// }
///
/// # async fn example() -> Result<(), CorralError> {
/// let response = ForgeApi.send(&BasicRequest::get("repos")).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
pub trait Connector: Send + Sync {
    /// Base URL every relative endpoint resolves against.
    fn base_url(&self) -> String;

    /// Default headers, overridden per key by the request's headers.
    fn default_headers(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Default query parameters.
    fn default_query(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Default body fields.
    fn default_body(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Default config options.
    fn default_config(&self) -> PropertyBag {
        PropertyBag::new()
    }

    /// Connector-level authenticator, used when the request supplies none.
    fn authenticator(&self) -> Option<Arc<dyn Authenticator>> {
        None
    }

    /// Connector-level mock client, used when the request supplies none.
    fn mock_client(&self) -> Option<MockClient> {
        None
    }

    /// Transport used for real dispatch; defaults to the process-wide
    /// sender (see [`config`](crate::config)).
    fn sender(&self) -> Arc<dyn Sender> {
        config::default_sender()
    }

    /// Connector-attached outbound middleware.
    fn middleware(&self) -> Vec<Arc<dyn RequestMiddleware>> {
        Vec::new()
    }

    /// Connector-attached response interceptors.
    fn response_interceptors(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        Vec::new()
    }

    /// Capability modules booted before the request's plugins.
    fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        Vec::new()
    }

    /// Boot hook, invoked with the in-progress builder before the request's
    /// boot hook. The primary customization point for connector types.
    fn boot(&self, _request: &mut PendingRequest) {}

    /// Builds the immutable, transport-ready snapshot for `request`.
    ///
    /// # Errors
    ///
    /// Fails with [`CorralError::InvalidConnector`] when
    /// [`base_url`](Self::base_url) is empty or unparseable.
    fn build<R>(&self, request: &R) -> Result<PendingRequest, CorralError>
    where
        Self: Sized,
        R: Request + ?Sized,
    {
        PendingRequest::from_pair(self, request)
    }

    /// Builds and dispatches `request` in one step.
    fn send<R>(
        &self,
        request: &R,
    ) -> impl Future<Output = Result<Response, CorralError>> + Send
    where
        Self: Sized,
        R: Request + ?Sized,
    {
        let pending = self.build(request);
        async move { pending?.send().await }
    }
}
