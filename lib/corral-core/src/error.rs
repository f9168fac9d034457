use http::Method;

/// Errors that can occur while building or dispatching a request.
///
/// Construction failures (`InvalidConnector`, `InvalidResponseType`) abort
/// before any dispatch happens. OAuth2 preconditions (`InvalidState`,
/// `MissingRefreshToken`) are validated before any network call so that
/// failures stay deterministic and network-independent. Transport failures
/// are surfaced unmodified; no retries happen at this layer.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum CorralError {
    /// HTTP transport error from the underlying reqwest sender.
    Transport(reqwest::Error),

    /// URL parsing error when resolving a base URL or endpoint.
    UrlError(url::ParseError),

    /// HTTP protocol error from the http crate.
    HttpError(http::Error),

    /// Invalid HTTP header name produced from a header property key.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value produced from a header property value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),

    /// Form body serialization error.
    FormSerializationError(serde_urlencoded::ser::Error),

    /// The request cannot be associated with a usable connector.
    ///
    /// Raised when the connector's base URL is empty or unparseable.
    #[display("Invalid connector: {reason}")]
    #[from(skip)]
    InvalidConnector {
        /// Description of why the connector is unusable.
        reason: String,
    },

    /// A configured response factory rejected the raw response.
    #[display("Invalid response type: {reason}")]
    #[from(skip)]
    InvalidResponseType {
        /// Description of why the response could not be built.
        reason: String,
    },

    /// OAuth2 callback state did not match the expected state.
    #[display("Invalid state.")]
    InvalidState,

    /// Refresh was attempted on an authenticator without a refresh token.
    #[display("The authenticator does not contain a refresh token.")]
    MissingRefreshToken,

    /// A mock client was attached but no mock response matched the request.
    #[display("No mock response matched {method} {url}")]
    #[from(skip)]
    UnmatchedMock {
        /// HTTP method of the unmatched request.
        method: Method,
        /// Resolved URL of the unmatched request.
        url: String,
    },

    /// A property value cannot be rendered as a header or query parameter.
    ///
    /// Objects are accepted in bags (body data) but have no scalar rendering.
    #[display("Unsupported property value: objects cannot be rendered as text. Got: {value}")]
    #[from(skip)]
    UnsupportedPropertyValue {
        /// The value that failed to render.
        value: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corral_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CorralError>();
        assert_sync::<CorralError>();
    }

    #[test]
    fn test_oauth_precondition_messages() {
        assert_eq!(CorralError::InvalidState.to_string(), "Invalid state.");
        assert_eq!(
            CorralError::MissingRefreshToken.to_string(),
            "The authenticator does not contain a refresh token."
        );
    }

    #[test]
    fn test_invalid_connector_display() {
        let error = CorralError::InvalidConnector {
            reason: "base URL is empty".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid connector: base URL is empty");
    }
}
