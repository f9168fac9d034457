//! Access-token authenticator and the token endpoint wire payload.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::auth::{Authenticator, SecureString};
use crate::pending::PendingRequest;

/// JSON payload returned by a token endpoint (exchange and refresh).
#[derive(Clone, Deserialize)]
pub struct TokenPayload {
    /// The issued access token.
    pub access_token: String,
    /// Optional refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Optional token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPayload")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Authenticator carrying an OAuth2 access token with its refresh token and
/// absolute expiry.
///
/// The expiry is stored as an [`Instant`], never a duration, so a reused
/// authenticator cannot drift against the clock. Applying it injects an
/// `Authorization: Bearer <token>` header.
#[derive(Clone)]
pub struct AccessTokenAuthenticator {
    access_token: SecureString,
    refresh_token: Option<SecureString>,
    expires_at: Option<Instant>,
}

impl AccessTokenAuthenticator {
    /// Creates an authenticator from a bare access token.
    pub fn new(access_token: impl Into<SecureString>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Converts a token endpoint payload, resolving `expires_in` to an
    /// absolute instant.
    pub fn from_payload(payload: TokenPayload) -> Self {
        let TokenPayload {
            access_token,
            refresh_token,
            expires_in,
        } = payload;
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.map(SecureString::from),
            expires_at: expires_in.map(|seconds| Instant::now() + Duration::from_secs(seconds)),
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<SecureString>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the absolute expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: Instant) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The access token value.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// The refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(SecureString::as_str)
    }

    /// The absolute expiry, if known.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Returns `true` once the expiry has passed; tokens without an expiry
    /// never expire.
    pub fn has_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    /// Returns `true` when a refresh token is available.
    pub fn is_refreshable(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl Authenticator for AccessTokenAuthenticator {
    fn apply(&self, request: &mut PendingRequest) {
        request.headers_mut().add(
            "Authorization",
            format!("Bearer {}", self.access_token.as_str()),
        );
    }
}

impl fmt::Debug for AccessTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenAuthenticator")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_payload_to_absolute_expiry() {
        let payload = TokenPayload {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_in: Some(3600),
        };

        let before = Instant::now();
        let authenticator = AccessTokenAuthenticator::from_payload(payload);

        assert_eq!(authenticator.access_token(), "access");
        assert_eq!(authenticator.refresh_token(), Some("refresh"));
        assert!(authenticator.is_refreshable());

        let expires_at = authenticator.expires_at().expect("expiry should be set");
        let delta = expires_at.saturating_duration_since(before);
        assert!(delta > Duration::from_secs(3595) && delta <= Duration::from_secs(3600));
    }

    #[test]
    fn should_not_be_refreshable_without_refresh_token() {
        let authenticator = AccessTokenAuthenticator::new("access");
        assert!(!authenticator.is_refreshable());
        assert!(authenticator.refresh_token().is_none());
    }

    #[test]
    fn should_detect_expired_token() {
        let expired = AccessTokenAuthenticator::new("access").with_expires_at(Instant::now());
        assert!(expired.has_expired());

        let fresh = AccessTokenAuthenticator::new("access")
            .with_expires_at(Instant::now() + Duration::from_secs(3600));
        assert!(!fresh.has_expired());

        let eternal = AccessTokenAuthenticator::new("access");
        assert!(!eternal.has_expired());
    }

    #[test]
    fn should_redact_debug_output() {
        let authenticator = AccessTokenAuthenticator::new("secret-access")
            .with_refresh_token("secret-refresh");
        let debug_str = format!("{authenticator:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret-access"));
        assert!(!debug_str.contains("secret-refresh"));

        let payload = TokenPayload {
            access_token: "secret-access".to_string(),
            refresh_token: None,
            expires_in: None,
        };
        assert!(!format!("{payload:?}").contains("secret-access"));
    }
}
