use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::CorralError;
use crate::pending::PendingRequest;

/// Typed response builder.
///
/// Replaces dynamic response-class configuration: a request can designate a
/// factory that assembles (or rejects) the response from its raw parts. A
/// factory that fails should return [`CorralError::InvalidResponseType`].
pub type ResponseFactory = Arc<
    dyn Fn(StatusCode, HeaderMap, Bytes, PendingRequest) -> Result<Response, CorralError>
        + Send
        + Sync,
>;

/// The outcome of a dispatched request: status, headers, body, and a
/// back-reference to the [`PendingRequest`] that produced it.
#[derive(Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    pending: Box<PendingRequest>,
}

impl Response {
    /// Assembles a response from raw parts, routing through the pending
    /// request's response factory when one is configured.
    pub(crate) fn build(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        mut pending: PendingRequest,
    ) -> Result<Self, CorralError> {
        match pending.take_response_factory() {
            Some(factory) => factory(status, headers, body, pending),
            None => Ok(Self::new(status, headers, body, pending)),
        }
    }

    /// Creates a response directly from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, pending: PendingRequest) -> Self {
        Self {
            status,
            headers,
            body,
            pending: Box::new(pending),
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers, for interceptors.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body, for interceptors.
    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// Body decoded as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CorralError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The pending request this response answers.
    pub fn pending_request(&self) -> &PendingRequest {
        &self.pending
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("pending", &self.pending)
            .finish()
    }
}
