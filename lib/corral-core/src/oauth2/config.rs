//! Per-connector OAuth2 configuration.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::auth::SecureString;
use crate::oauth2::token::{AccessTokenAuthenticator, TokenPayload};
use crate::request::BasicRequest;

/// Hook applied to every flow-built request before dispatch.
pub type RequestModifier = Arc<dyn Fn(&mut BasicRequest) + Send + Sync>;

/// Builds the authenticator from a parsed token payload, replacing the
/// default conversion for non-standard providers.
pub type AuthenticatorFactory =
    Arc<dyn Fn(TokenPayload) -> AccessTokenAuthenticator + Send + Sync>;

/// Builds the user-info request, replacing the default `GET` on the
/// configured user endpoint.
pub type UserRequestFactory = Arc<dyn Fn(&AccessTokenAuthenticator) -> BasicRequest + Send + Sync>;

/// Per-connector OAuth2 settings: client credentials, endpoints, scopes,
/// and the flow's customization hooks.
///
/// Endpoints may be relative (resolved against the connector base URL) or
/// absolute. The most recently generated authorization `state` is held
/// here in a single slot: building a new authorization URL overwrites it,
/// so concurrent flows on one connector instance race. Use separate
/// connector instances per concurrent flow.
pub struct OAuthConfig {
    client_id: String,
    client_secret: SecureString,
    redirect_uri: String,
    authorize_endpoint: String,
    token_endpoint: String,
    user_endpoint: String,
    default_scopes: Vec<String>,
    scope_separator: String,
    request_modifier: Option<RequestModifier>,
    authenticator_factory: Option<AuthenticatorFactory>,
    user_request_factory: Option<UserRequestFactory>,
    state: Mutex<Option<String>>,
}

impl OAuthConfig {
    /// Creates a configuration with the standard endpoint layout
    /// (`oauth/authorize`, `oauth/token`, `oauth/user`) and a space scope
    /// separator.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            authorize_endpoint: "oauth/authorize".to_string(),
            token_endpoint: "oauth/token".to_string(),
            user_endpoint: "oauth/user".to_string(),
            default_scopes: Vec::new(),
            scope_separator: " ".to_string(),
            request_modifier: None,
            authenticator_factory: None,
            user_request_factory: None,
            state: Mutex::new(None),
        }
    }

    /// Sets the authorization endpoint.
    #[must_use]
    pub fn with_authorize_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorize_endpoint = endpoint.into();
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Sets the user-info endpoint.
    #[must_use]
    pub fn with_user_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.user_endpoint = endpoint.into();
        self
    }

    /// Adds a default scope, prepended to caller-supplied scopes.
    #[must_use]
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.default_scopes.push(scope.into());
        self
    }

    /// Adds multiple default scopes.
    #[must_use]
    pub fn add_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.default_scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Sets the delimiter used to join scopes.
    #[must_use]
    pub fn with_scope_separator(mut self, separator: impl Into<String>) -> Self {
        self.scope_separator = separator.into();
        self
    }

    /// Registers a hook applied to every flow-built request.
    #[must_use]
    pub fn with_request_modifier(
        mut self,
        modifier: impl Fn(&mut BasicRequest) + Send + Sync + 'static,
    ) -> Self {
        self.request_modifier = Some(Arc::new(modifier));
        self
    }

    /// Registers a custom authenticator factory.
    #[must_use]
    pub fn with_authenticator_factory(
        mut self,
        factory: impl Fn(TokenPayload) -> AccessTokenAuthenticator + Send + Sync + 'static,
    ) -> Self {
        self.authenticator_factory = Some(Arc::new(factory));
        self
    }

    /// Registers a custom user-info request factory.
    #[must_use]
    pub fn with_user_request_factory(
        mut self,
        factory: impl Fn(&AccessTokenAuthenticator) -> BasicRequest + Send + Sync + 'static,
    ) -> Self {
        self.user_request_factory = Some(Arc::new(factory));
        self
    }

    /// OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// OAuth client secret.
    pub fn client_secret(&self) -> &SecureString {
        &self.client_secret
    }

    /// Redirect URI sent with authorization and token-exchange requests.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Authorization endpoint.
    pub fn authorize_endpoint(&self) -> &str {
        &self.authorize_endpoint
    }

    /// Token endpoint.
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// User-info endpoint.
    pub fn user_endpoint(&self) -> &str {
        &self.user_endpoint
    }

    /// Default scopes, prepended to caller-supplied scopes.
    pub fn default_scopes(&self) -> &[String] {
        &self.default_scopes
    }

    /// Scope join delimiter.
    pub fn scope_separator(&self) -> &str {
        &self.scope_separator
    }

    /// The most recently stored authorization state, if any.
    pub fn state(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores the active authorization state; the previous value is
    /// silently overwritten (single-flight slot).
    pub(crate) fn store_state(&self, state: String) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }

    pub(crate) fn join_scopes(&self, scopes: &[&str]) -> String {
        let mut all: Vec<&str> = self.default_scopes.iter().map(String::as_str).collect();
        all.extend_from_slice(scopes);
        all.join(&self.scope_separator)
    }

    pub(crate) fn apply_request_modifier(&self, request: &mut BasicRequest) {
        if let Some(modifier) = &self.request_modifier {
            modifier(request);
        }
    }

    pub(crate) fn authenticator_factory(&self) -> Option<&AuthenticatorFactory> {
        self.authenticator_factory.as_ref()
    }

    pub(crate) fn user_request_factory(&self) -> Option<&UserRequestFactory> {
        self.user_request_factory.as_ref()
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_endpoint", &self.authorize_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("user_endpoint", &self.user_endpoint)
            .field("default_scopes", &self.default_scopes)
            .field("scope_separator", &self.scope_separator)
            .field("request_modifier", &self.request_modifier.is_some())
            .field(
                "authenticator_factory",
                &self.authenticator_factory.is_some(),
            )
            .field("user_request_factory", &self.user_request_factory.is_some())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig::new("client-id", "client-secret", "https://app.example.com/callback")
    }

    #[test]
    fn should_use_standard_endpoint_layout() {
        let config = config();
        assert_eq!(config.authorize_endpoint(), "oauth/authorize");
        assert_eq!(config.token_endpoint(), "oauth/token");
        assert_eq!(config.user_endpoint(), "oauth/user");
        assert_eq!(config.scope_separator(), " ");
    }

    #[test]
    fn should_join_default_scopes_before_caller_scopes() {
        let with_default = config().add_scope("c");
        assert_eq!(with_default.join_scopes(&["a", "b"]), "c a b");

        let comma = config().add_scopes(["read", "write"]).with_scope_separator(",");
        assert_eq!(comma.join_scopes(&["admin"]), "read,write,admin");
    }

    #[test]
    fn should_overwrite_state_slot() {
        let config = config();
        assert_eq!(config.state(), None);

        config.store_state("first".to_string());
        config.store_state("second".to_string());
        assert_eq!(config.state(), Some("second".to_string()));
    }

    #[test]
    fn should_redact_client_secret_in_debug() {
        let config = config();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("client-id"));
        assert!(!debug_str.contains("client-secret"));
    }
}
