use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

use crate::error::CorralError;
use crate::pending::PendingRequest;

/// A canned response served by a mock client.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl MockResponse {
    /// Creates an empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Creates an empty `200 OK` response.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Creates a `200 OK` response with a JSON body.
    pub fn json(body: &serde_json::Value) -> Self {
        Self::ok()
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string())
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the response body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Splits into raw response parts.
    pub(crate) fn into_parts(self) -> Result<(StatusCode, HeaderMap, Bytes), CorralError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        Ok((self.status, headers, self.body))
    }
}

impl From<String> for MockResponse {
    fn from(body: String) -> Self {
        Self::ok().with_body(body)
    }
}

/// Mock-response matching engine consulted by a [`MockClient`].
///
/// Implementations decide which canned response (if any) answers a given
/// pending request; recording is the client's job, not the engine's.
pub trait MockEngine: Send + Sync + fmt::Debug {
    /// Returns the response for `request`, or `None` when unmatched.
    fn find(&self, request: &PendingRequest) -> Option<MockResponse>;
}

/// Serves responses in FIFO order, ignoring the request shape.
#[derive(Debug, Default)]
struct SequenceEngine {
    responses: Mutex<VecDeque<MockResponse>>,
}

impl MockEngine for SequenceEngine {
    fn find(&self, _request: &PendingRequest) -> Option<MockResponse> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Matches on the rendered endpoint path, first match wins; entries are
/// consumed as they match.
#[derive(Debug, Default)]
struct EndpointEngine {
    responses: Mutex<Vec<(String, MockResponse)>>,
}

impl MockEngine for EndpointEngine {
    fn find(&self, request: &PendingRequest) -> Option<MockResponse> {
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let endpoint = request.endpoint();
        let position = responses
            .iter()
            .position(|(candidate, _)| endpoint.ends_with(candidate.trim_start_matches('/')));
        position.map(|index| responses.remove(index).1)
    }
}

/// Redirects dispatch away from real I/O and records every request for
/// later assertions.
///
/// The recording log is append-only and scoped to this client (clones share
/// it). It is guarded for memory safety, but concurrent dispatch still
/// interleaves entries in arrival order; callers that need a deterministic
/// order must serialize their sends.
#[derive(Clone)]
pub struct MockClient {
    engine: Arc<dyn MockEngine>,
    recorded: Arc<Mutex<Vec<PendingRequest>>>,
}

impl MockClient {
    /// Creates a mock client backed by a custom matching engine.
    pub fn new(engine: impl MockEngine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock client that serves `responses` in order.
    pub fn sequence(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self::new(SequenceEngine {
            responses: Mutex::new(responses.into_iter().collect()),
        })
    }

    /// Creates a mock client that matches responses by endpoint path.
    pub fn for_endpoints<S, I>(responses: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, MockResponse)>,
    {
        Self::new(EndpointEngine {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(endpoint, response)| (endpoint.into(), response))
                    .collect(),
            ),
        })
    }

    /// Appends a dispatched request to the recording log.
    pub fn record(&self, request: &PendingRequest) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
    }

    pub(crate) fn find(&self, request: &PendingRequest) -> Option<MockResponse> {
        self.engine.find(request)
    }

    /// Snapshot of every recorded request, in dispatch order.
    pub fn requests(&self) -> Vec<PendingRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded requests.
    pub fn sent_count(&self) -> usize {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The most recently recorded request, if any.
    pub fn last_request(&self) -> Option<PendingRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Clears the recording log.
    pub fn reset(&self) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Asserts that exactly `expected` requests were dispatched.
    ///
    /// # Panics
    ///
    /// Panics when the recorded count differs; intended for tests.
    #[track_caller]
    pub fn assert_sent_count(&self, expected: usize) {
        let actual = self.sent_count();
        assert_eq!(actual, expected, "expected {expected} dispatched requests, got {actual}");
    }

    /// Asserts that at least one recorded request satisfies `predicate`.
    ///
    /// # Panics
    ///
    /// Panics when no recorded request matches; intended for tests.
    #[track_caller]
    pub fn assert_sent(&self, predicate: impl Fn(&PendingRequest) -> bool) {
        assert!(
            self.requests().iter().any(|request| predicate(request)),
            "no recorded request matched the predicate"
        );
    }
}

impl fmt::Debug for MockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClient")
            .field("engine", &self.engine)
            .field("recorded", &self.sent_count())
            .finish()
    }
}
