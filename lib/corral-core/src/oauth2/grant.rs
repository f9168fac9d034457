//! The authorization-code grant, expressed over the request pipeline.

use subtle::ConstantTimeEq;

use crate::connector::Connector;
use crate::error::CorralError;
use crate::oauth2::config::OAuthConfig;
use crate::oauth2::token::{AccessTokenAuthenticator, TokenPayload};
use crate::pending::{join_url, resolve_base_url};
use crate::request::{BasicRequest, BodyFormat};
use crate::response::Response;

/// Generates an opaque, cryptographically random state parameter.
fn generate_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Compares the callback state against the expected state in constant time.
///
/// A missing callback state counts as a mismatch when an expectation was
/// given. Runs before any network call.
fn validate_state(state: Option<&str>, expected_state: Option<&str>) -> Result<(), CorralError> {
    let Some(expected) = expected_state else {
        return Ok(());
    };
    let provided = state.unwrap_or_default();
    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(CorralError::InvalidState)
    }
}

/// OAuth2 authorization-code flow for a connector.
///
/// All four operations funnel through the connector's own pipeline, so
/// connector-level defaults, mocks, and hooks apply to the flow's requests
/// too. The `resolve_*` factory methods are the override points for
/// non-standard providers: replace how a request or authenticator is
/// constructed without touching the flow logic.
///
/// # Example
///
/// ```rust,no_run
/// use corral_core::{Connector, CorralError};
/// use corral_core::oauth2::{AuthorizationCodeGrant, OAuthConfig};
///
/// struct Forge {
///     oauth: OAuthConfig,
/// }
///
/// impl Connector for Forge {
///     fn base_url(&self) -> String {
///         "https://forge.example.com".to_string()
///     }
/// }
///
/// impl AuthorizationCodeGrant for Forge {
///     fn oauth_config(&self) -> &OAuthConfig {
///         &self.oauth
///     }
/// }
///
/// # async fn example() -> Result<(), CorralError> {
/// let forge = Forge {
///     oauth: OAuthConfig::new("client-id", "client-secret", "https://app.example.com/callback"),
/// };
///
/// // 1. redirect the user
/// let url = forge.get_authorization_url(&["repo"], None)?;
///
/// // 2. exchange the callback code (validating the returned state)
/// let expected = forge.get_state();
/// let authenticator = forge
///     .get_access_token("callback-code", Some("callback-state"), expected.as_deref())
///     .await?;
///
/// // 3. call the API as the user
/// let user = forge.get_user(&authenticator, None).await?;
/// # Ok(())
/// # }
/// ```
pub trait AuthorizationCodeGrant: Connector {
    /// The connector's OAuth2 settings.
    fn oauth_config(&self) -> &OAuthConfig;

    /// The most recently generated state parameter, if any.
    fn get_state(&self) -> Option<String> {
        self.oauth_config().state()
    }

    /// Builds the authorization URL the user should be redirected to.
    ///
    /// Default scopes are prepended to `scopes` and joined with the
    /// configured delimiter. When `state` is omitted a fresh random value
    /// is generated. Either way the resolved state is stored on the
    /// connector's config. The slot holds one value, so a second call
    /// overwrites it.
    fn get_authorization_url(
        &self,
        scopes: &[&str],
        state: Option<&str>,
    ) -> Result<String, CorralError> {
        let config = self.oauth_config();
        let state = state.map_or_else(generate_state, str::to_owned);
        config.store_state(state.clone());

        let base = resolve_base_url(&self.base_url())?;
        let mut url = join_url(&base, config.authorize_endpoint())?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("scope", &config.join_scopes(scopes));
            pairs.append_pair("client_id", config.client_id());
            pairs.append_pair("redirect_uri", config.redirect_uri());
            pairs.append_pair("state", &state);
        }
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for an access-token authenticator.
    ///
    /// When `expected_state` is given, the callback `state` is compared in
    /// constant time before anything is dispatched; a mismatch fails with
    /// [`CorralError::InvalidState`].
    fn get_access_token(
        &self,
        code: &str,
        state: Option<&str>,
        expected_state: Option<&str>,
    ) -> impl Future<Output = Result<AccessTokenAuthenticator, CorralError>> + Send
    where
        Self: Sized,
    {
        async move {
            let response = self
                .get_access_token_response(code, state, expected_state)
                .await?;
            let payload = response.json::<TokenPayload>()?;
            Ok(self.create_token_authenticator(payload))
        }
    }

    /// Like [`get_access_token`](Self::get_access_token) but returns the
    /// raw token endpoint response instead of parsing it.
    fn get_access_token_response(
        &self,
        code: &str,
        state: Option<&str>,
        expected_state: Option<&str>,
    ) -> impl Future<Output = Result<Response, CorralError>> + Send
    where
        Self: Sized,
    {
        let prepared = validate_state(state, expected_state).map(|()| {
            let mut request = self.resolve_access_token_request(code);
            self.oauth_config().apply_request_modifier(&mut request);
            request
        });
        async move { self.send(&prepared?).await }
    }

    /// Obtains a fresh access token from a refreshable authenticator.
    ///
    /// Fails with [`CorralError::MissingRefreshToken`] before any dispatch
    /// when the authenticator has no refresh token. The global request
    /// modifier runs first, then the call-specific `modifier`.
    fn refresh_access_token(
        &self,
        authenticator: &AccessTokenAuthenticator,
        modifier: Option<&dyn Fn(&mut BasicRequest)>,
    ) -> impl Future<Output = Result<AccessTokenAuthenticator, CorralError>> + Send
    where
        Self: Sized,
    {
        let response = self.refresh_access_token_response(authenticator, modifier);
        async move {
            let payload = response.await?.json::<TokenPayload>()?;
            Ok(self.create_token_authenticator(payload))
        }
    }

    /// Like [`refresh_access_token`](Self::refresh_access_token) but
    /// returns the raw token endpoint response.
    fn refresh_access_token_response(
        &self,
        authenticator: &AccessTokenAuthenticator,
        modifier: Option<&dyn Fn(&mut BasicRequest)>,
    ) -> impl Future<Output = Result<Response, CorralError>> + Send
    where
        Self: Sized,
    {
        let prepared = authenticator
            .refresh_token()
            .ok_or(CorralError::MissingRefreshToken)
            .map(|refresh_token| {
                let mut request = self.resolve_refresh_token_request(refresh_token);
                self.oauth_config().apply_request_modifier(&mut request);
                if let Some(modifier) = modifier {
                    modifier(&mut request);
                }
                request
            });
        async move { self.send(&prepared?).await }
    }

    /// Fetches the authorized user's info, returning the response unparsed.
    ///
    /// The authenticator rides along as the request's own authenticator, so
    /// bearer injection happens in the pipeline like any other request.
    fn get_user(
        &self,
        authenticator: &AccessTokenAuthenticator,
        modifier: Option<&dyn Fn(&mut BasicRequest)>,
    ) -> impl Future<Output = Result<Response, CorralError>> + Send
    where
        Self: Sized,
    {
        let mut request = self.resolve_user_request(authenticator);
        self.oauth_config().apply_request_modifier(&mut request);
        if let Some(modifier) = modifier {
            modifier(&mut request);
        }
        async move { self.send(&request).await }
    }

    /// Builds the token-exchange request. Override for providers that
    /// deviate from the standard grant fields.
    fn resolve_access_token_request(&self, code: &str) -> BasicRequest {
        let config = self.oauth_config();
        BasicRequest::post(config.token_endpoint())
            .with_body_format(BodyFormat::Form)
            .with_body_field("grant_type", "authorization_code")
            .with_body_field("code", code)
            .with_body_field("redirect_uri", config.redirect_uri())
            .with_body_field("client_id", config.client_id())
            .with_body_field("client_secret", config.client_secret().as_str())
    }

    /// Builds the refresh-grant request.
    fn resolve_refresh_token_request(&self, refresh_token: &str) -> BasicRequest {
        let config = self.oauth_config();
        BasicRequest::post(config.token_endpoint())
            .with_body_format(BodyFormat::Form)
            .with_body_field("grant_type", "refresh_token")
            .with_body_field("refresh_token", refresh_token)
            .with_body_field("client_id", config.client_id())
            .with_body_field("client_secret", config.client_secret().as_str())
    }

    /// Builds the user-info request; the config's custom factory wins when
    /// registered.
    fn resolve_user_request(&self, authenticator: &AccessTokenAuthenticator) -> BasicRequest {
        let config = self.oauth_config();
        if let Some(factory) = config.user_request_factory() {
            return factory(authenticator);
        }
        BasicRequest::get(config.user_endpoint()).with_authenticator(authenticator.clone())
    }

    /// Converts a parsed token payload into an authenticator; the config's
    /// custom factory wins when registered.
    fn create_token_authenticator(&self, payload: TokenPayload) -> AccessTokenAuthenticator {
        match self.oauth_config().authenticator_factory() {
            Some(factory) => factory(payload),
            None => AccessTokenAuthenticator::from_payload(payload),
        }
    }
}
