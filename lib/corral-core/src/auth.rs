use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::pending::PendingRequest;

/// Secure wrapper for sensitive string data that zeroes memory on drop.
///
/// Credentials held in this wrapper are redacted in `Debug` output and
/// masked in `Display` output so they never leak into logs.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the inner value.
    ///
    /// Avoid storing the returned reference; keep the exposure window small.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    fn masked(value: &str) -> String {
        if value.len() <= 8 {
            "***".to_string()
        } else {
            let head = &value[..4];
            let tail = &value[value.len() - 4..];
            format!("{head}...{tail}")
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::masked(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Credential-injection strategy applied to a request in progress.
///
/// The pipeline resolves one authenticator per build (request-level override
/// first, then connector-level, then none) and calls [`apply`](Self::apply)
/// exactly once, before boot hooks run. `apply` mutates the pending
/// request's header/query bags; calling it twice must not corrupt the
/// request.
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Injects credentials into the pending request.
    fn apply(&self, request: &mut PendingRequest);
}

/// Bearer token authentication (RFC 6750).
///
/// Adds an `Authorization: Bearer <token>` header.
#[derive(Clone)]
pub struct BearerAuthenticator {
    token: SecureString,
}

impl BearerAuthenticator {
    /// Creates a bearer authenticator from a token.
    pub fn new(token: impl Into<SecureString>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authenticator for BearerAuthenticator {
    fn apply(&self, request: &mut PendingRequest) {
        request
            .headers_mut()
            .add("Authorization", format!("Bearer {}", self.token.as_str()));
    }
}

impl fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerAuthenticator")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// HTTP Basic authentication (RFC 7617).
///
/// Adds an `Authorization: Basic <base64(username:password)>` header.
#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    password: SecureString,
}

impl BasicAuthenticator {
    /// Creates a basic authenticator from a username/password pair.
    pub fn new(username: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Authenticator for BasicAuthenticator {
    fn apply(&self, request: &mut PendingRequest) {
        let credentials = format!("{}:{}", self.username, self.password.as_str());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        request
            .headers_mut()
            .add("Authorization", format!("Basic {encoded}"));
    }
}

impl fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Query-parameter authentication.
///
/// Adds `<parameter>=<value>` to the request's query bag.
#[derive(Clone)]
pub struct QueryAuthenticator {
    parameter: String,
    value: SecureString,
}

impl QueryAuthenticator {
    /// Creates a query authenticator from a parameter name and secret value.
    pub fn new(parameter: impl Into<String>, value: impl Into<SecureString>) -> Self {
        Self {
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

impl Authenticator for QueryAuthenticator {
    fn apply(&self, request: &mut PendingRequest) {
        request
            .query_mut()
            .add(self.parameter.clone(), self.value.as_str());
    }
}

impl fmt::Debug for QueryAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryAuthenticator")
            .field("parameter", &self.parameter)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_debug_is_redacted() {
        let secret = SecureString::new("secret-password".to_string());
        let debug_str = format!("{secret:?}");
        assert_eq!(debug_str, "SecureString { value: \"[REDACTED]\" }");
        assert!(!debug_str.contains("secret-password"));
    }

    #[test]
    fn test_secure_string_display_is_masked() {
        let secret = SecureString::new("secret-password-12345".to_string());
        assert_eq!(secret.to_string(), "secr...2345");

        let short = SecureString::new("short".to_string());
        assert_eq!(short.to_string(), "***");
    }

    #[test]
    fn test_secure_string_conversions() {
        let secret: SecureString = "token".into();
        assert_eq!(secret.as_str(), "token");
        assert_eq!(secret.into_string(), "token");
    }

    #[test]
    fn test_authenticator_debug_is_redacted() {
        let bearer = BearerAuthenticator::new("very-secret");
        assert!(!format!("{bearer:?}").contains("very-secret"));

        let basic = BasicAuthenticator::new("user", "hunter2");
        let debug_str = format!("{basic:?}");
        assert!(debug_str.contains("user"));
        assert!(!debug_str.contains("hunter2"));

        let query = QueryAuthenticator::new("api_key", "qsecret");
        assert!(!format!("{query:?}").contains("qsecret"));
    }
}
