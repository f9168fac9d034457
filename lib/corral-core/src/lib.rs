//! # Corral Core
//!
//! Build typed HTTP API clients from reusable definitions.
//!
//! A [`Connector`] describes a base API (host, shared headers, default
//! authentication) and a [`Request`] describes one endpoint. Sending a
//! request merges the two layers into an immutable [`PendingRequest`],
//! applies the resolved [`Authenticator`], runs boot hooks and
//! [`Plugin`]s, and dispatches through a pluggable [`Sender`] (real
//! transport or a recording [`MockClient`]). An OAuth2 authorization-code
//! flow ([`oauth2::AuthorizationCodeGrant`]) rides on the same pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use corral_core::{BasicRequest, Connector, PropertyBag};
//!
//! struct ForgeApi;
//!
//! impl Connector for ForgeApi {
//!     fn base_url(&self) -> String {
//!         "https://forge.example.com/api/v1".to_string()
//!     }
//!
//!     fn default_headers(&self) -> PropertyBag {
//!         PropertyBag::new().with("Accept", "application/json")
//!     }
//! }
//!
//! # async fn example() -> Result<(), corral_core::CorralError> {
//! let request = BasicRequest::get("repos").with_query_param("page", 1);
//! let response = ForgeApi.send(&request).await?;
//! let repos: serde_json::Value = response.json()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing with mocks
//!
//! Attach a [`MockClient`] to a connector (or a single request) and
//! dispatch is redirected away from real I/O; every built request is
//! recorded for assertions.
//!
//! ```rust
//! use corral_core::{BasicRequest, Connector, MockClient, MockResponse};
//!
//! struct ForgeApi {
//!     mock: MockClient,
//! }
//!
//! impl Connector for ForgeApi {
//!     fn base_url(&self) -> String {
//!         "https://forge.example.com".to_string()
//!     }
//!
//!     fn mock_client(&self) -> Option<MockClient> {
//!         Some(self.mock.clone())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), corral_core::CorralError> {
//! let api = ForgeApi {
//!     mock: MockClient::sequence([MockResponse::json(&serde_json::json!({"ok": true}))]),
//! };
//!
//! let response = api.send(&BasicRequest::get("status")).await?;
//! assert!(response.is_success());
//! api.mock.assert_sent_count(1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layering rules
//!
//! Properties live in ordered [`PropertyBag`]s. Request-level entries
//! override connector-level entries with the same key; everything else
//! keeps its insertion order, and overridden entries keep their original
//! position. The build steps run in a fixed order (mock resolution, bag
//! merges, authentication, boot hooks, plugins) and never mutate the
//! connector or request, so definitions are freely reusable.

mod bag;
pub use self::bag::PropertyBag;

mod error;
pub use self::error::CorralError;

mod auth;
pub use self::auth::{
    Authenticator, BasicAuthenticator, BearerAuthenticator, QueryAuthenticator, SecureString,
};

mod connector;
pub use self::connector::Connector;

mod request;
pub use self::request::{BasicRequest, BodyFormat, Request};

mod pending;
pub use self::pending::PendingRequest;

mod sender;
pub use self::sender::{ReqwestSender, SendFuture, Sender};

mod response;
pub use self::response::{Response, ResponseFactory};

mod mock;
pub use self::mock::{MockClient, MockEngine, MockResponse};

mod hooks;
pub use self::hooks::{Plugin, RequestMiddleware, ResponseInterceptor};

pub mod config;

pub mod oauth2;

#[cfg(test)]
mod integration_tests;
