//! OAuth2 authorization-code flow, layered on the request pipeline.
//!
//! A connector opts in by implementing [`AuthorizationCodeGrant`] and
//! supplying an [`OAuthConfig`]. Every flow operation (authorization URL,
//! code exchange, refresh, user info) funnels through the same
//! [`PendingRequest`](crate::PendingRequest) builder and sender dispatch as
//! ordinary requests, so mocks, middleware, and plugins apply unchanged.

mod config;
pub use self::config::{
    AuthenticatorFactory, OAuthConfig, RequestModifier, UserRequestFactory,
};

mod grant;
pub use self::grant::AuthorizationCodeGrant;

mod token;
pub use self::token::{AccessTokenAuthenticator, TokenPayload};
