use crate::pending::PendingRequest;
use crate::response::Response;

/// Outbound-request middleware, run in registration order just before
/// dispatch (global stack first, then connector's, then request's).
pub trait RequestMiddleware: Send + Sync {
    /// Inspects or mutates the pending request before it is sent.
    fn handle(&self, request: &mut PendingRequest);
}

impl<F> RequestMiddleware for F
where
    F: Fn(&mut PendingRequest) + Send + Sync,
{
    fn handle(&self, request: &mut PendingRequest) {
        self(request);
    }
}

/// Response interceptor, run in registration order after dispatch.
pub trait ResponseInterceptor: Send + Sync {
    /// Inspects or mutates the response before it reaches the caller.
    fn handle(&self, response: &mut Response);
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&mut Response) + Send + Sync,
{
    fn handle(&self, response: &mut Response) {
        self(response);
    }
}

/// Capability module attached to a connector or request at construction.
///
/// Plugins replace runtime trait reflection: they are held as explicit,
/// ordered lists and each plugin's [`boot`](Self::boot) hook runs once per
/// build, connector-attached plugins before request-attached ones.
pub trait Plugin: Send + Sync {
    /// Runs once while the pending request is being built; may mutate any
    /// property bag or push additional middleware.
    fn boot(&self, request: &mut PendingRequest);
}
