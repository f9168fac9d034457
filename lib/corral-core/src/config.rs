//! Process-wide defaults: the fallback sender and global hook stacks.
//!
//! Connectors consult these defaults lazily: a connector that overrides
//! [`Connector::sender`](crate::Connector::sender) never touches them.
//! [`reset`] restores the built-in state for test isolation.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::hooks::{RequestMiddleware, ResponseInterceptor};
use crate::sender::{ReqwestSender, Sender};

/// Mutable view over the process-wide defaults.
#[derive(Default)]
pub struct GlobalDefaults {
    sender: Option<Arc<dyn Sender>>,
    request_middleware: Vec<Arc<dyn RequestMiddleware>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl GlobalDefaults {
    /// Replaces the default sender used by connectors that do not override
    /// [`Connector::sender`](crate::Connector::sender).
    pub fn set_sender(&mut self, sender: impl Sender + 'static) {
        self.sender = Some(Arc::new(sender));
    }

    /// Appends middleware to the global outbound stack, run before any
    /// connector- or request-attached middleware.
    pub fn add_request_middleware(&mut self, middleware: impl RequestMiddleware + 'static) {
        self.request_middleware.push(Arc::new(middleware));
    }

    /// Appends an interceptor to the global response stack.
    pub fn add_response_interceptor(&mut self, interceptor: impl ResponseInterceptor + 'static) {
        self.response_interceptors.push(Arc::new(interceptor));
    }
}

static GLOBALS: RwLock<GlobalDefaults> = RwLock::new(GlobalDefaults {
    sender: None,
    request_middleware: Vec::new(),
    response_interceptors: Vec::new(),
});

static FALLBACK_SENDER: LazyLock<Arc<dyn Sender>> =
    LazyLock::new(|| Arc::new(ReqwestSender::new()));

/// Applies a closure to the process-wide defaults.
pub fn configure(apply: impl FnOnce(&mut GlobalDefaults)) {
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    apply(&mut globals);
}

/// Restores the built-in defaults: the reqwest sender and empty hook stacks.
pub fn reset() {
    let mut globals = GLOBALS.write().unwrap_or_else(PoisonError::into_inner);
    *globals = GlobalDefaults::default();
}

pub(crate) fn default_sender() -> Arc<dyn Sender> {
    let globals = GLOBALS.read().unwrap_or_else(PoisonError::into_inner);
    globals
        .sender
        .clone()
        .unwrap_or_else(|| Arc::clone(&FALLBACK_SENDER))
}

pub(crate) fn global_hooks() -> (
    Vec<Arc<dyn RequestMiddleware>>,
    Vec<Arc<dyn ResponseInterceptor>>,
) {
    let globals = GLOBALS.read().unwrap_or_else(PoisonError::into_inner);
    (
        globals.request_middleware.clone(),
        globals.response_interceptors.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::PendingRequest;

    #[test]
    fn test_configure_and_reset() {
        configure(|globals| {
            globals.set_sender(ReqwestSender::new());
            globals.add_request_middleware(|_request: &mut PendingRequest| {});
        });

        let (middleware, interceptors) = global_hooks();
        assert_eq!(middleware.len(), 1);
        assert!(interceptors.is_empty());

        reset();

        let (middleware, _) = global_hooks();
        assert!(middleware.is_empty());
        let globals = GLOBALS.read().unwrap_or_else(PoisonError::into_inner);
        assert!(globals.sender.is_none());
    }
}
