//! Per-request context
//!
//! A [`Context`] carries the request (method and path), the parameters
//! captured so far, the pending error, the response sink, and the dispatch
//! state behind the continuation methods [`next`](Context::next),
//! [`next_route`](Context::next_route) and [`abort`](Context::abort).
//!
//! # Example
//!
//! ```rust,ignore
//! fn timing(ctx: &mut Context<'_>) {
//!     let started = std::time::Instant::now();
//!     ctx.next();
//!     tracing::info!(elapsed = ?started.elapsed(), "request handled");
//! }
//! ```

use std::fmt;

use crate::dispatch::DispatchState;
use crate::error::{RouteError, RouteResult};
use crate::logging::RequestId;
use crate::params::Params;
use crate::response::ResponseWriter;

/// State of one request while it is dispatched.
///
/// `'r` is the lifetime of both the router tree being walked and the
/// response sink.
pub struct Context<'r> {
    pub(crate) request_id: RequestId,
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) params: Params,
    pub(crate) error: Option<RouteError>,
    pub(crate) response: Box<dyn ResponseWriter + 'r>,
    pub(crate) dispatch: DispatchState<'r>,
}

impl<'r> Context<'r> {
    /// Create a context for `method` and `path` writing to `response`.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        response: impl ResponseWriter + 'r,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            method: method.into(),
            path: path.into(),
            params: Params::new(),
            error: None,
            response: Box::new(response),
            dispatch: DispatchState::default(),
        }
    }

    /// Use a caller-provided request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Start the dispatch with parameters already present.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Request ID used in log events.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Full request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Part of the routed path not consumed by the node whose handler is
    /// running. Outside a handler this is the full path.
    pub fn remaining_path(&self) -> &str {
        let offset = self.dispatch.current_offset();
        let end = self.dispatch.routed_end(&self.path);
        self.path.get(offset..end).unwrap_or("")
    }

    /// Path pattern of the node whose handler is running.
    pub fn matched_pattern(&self) -> Option<&str> {
        self.dispatch.current_pattern()
    }

    /// Patterns of the nodes enclosing the running handler, from the root
    /// router down to the handler's own node. Empty outside a handler.
    ///
    /// The root router's pattern is always `""`.
    pub fn matched_patterns(&self) -> Vec<&str> {
        self.dispatch.scope_patterns()
    }

    /// Value of the captured parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// All parameters visible to the running handler.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The pending error, if any.
    pub fn error(&self) -> Option<&RouteError> {
        self.error.as_ref()
    }

    /// Returns true if an error is pending.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Clear and return the pending error.
    ///
    /// Once cleared, ordinary routes become eligible again for the rest of
    /// the dispatch.
    pub fn take_error(&mut self) -> Option<RouteError> {
        self.error.take()
    }

    /// The response sink.
    pub fn response(&mut self) -> &mut (dyn ResponseWriter + 'r) {
        self.response.as_mut()
    }

    /// Write raw bytes to the response sink.
    pub fn write(&mut self, bytes: &[u8]) -> RouteResult<()> {
        self.response.write(bytes)?;
        Ok(())
    }

    /// Number of handlers invoked so far.
    pub fn handlers_invoked(&self) -> usize {
        self.dispatch.handlers_invoked
    }

    /// Returns true if a handler called [`abort`](Context::abort).
    pub fn is_aborted(&self) -> bool {
        self.dispatch.aborted
    }

    // =========================================================================
    // Continuations
    // =========================================================================

    /// Run the rest of the dispatch, starting with the next handler of the
    /// current node, and return once it has completed.
    ///
    /// Code after `next()` runs after every handler further down the chain.
    /// Calling it outside a handler, or after the dispatch has completed, does
    /// nothing.
    pub fn next(&mut self) {
        if self.dispatch.in_handler() && !self.dispatch.finished {
            self.resume();
        }
    }

    /// Skip the remaining handlers and children of the current node and
    /// continue with the enclosing router's next child.
    pub fn next_route(&mut self) {
        let Some(depth) = self.dispatch.current_depth() else {
            return;
        };
        if self.dispatch.finished {
            return;
        }
        self.unwind_to(depth);
        self.resume();
    }

    /// End the dispatch. No further handler runs; code after `next()` in
    /// enclosing handlers still does.
    pub fn abort(&mut self) {
        if self.dispatch.in_handler() && !self.dispatch.finished {
            self.dispatch.finished = true;
            self.dispatch.aborted = true;
        }
    }

    pub(crate) fn into_outcome(self) -> DispatchOutcome {
        DispatchOutcome {
            request_id: self.request_id,
            handlers_invoked: self.dispatch.handlers_invoked,
            aborted: self.dispatch.aborted,
            error: self.error,
        }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Summary of a completed dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Request ID of the dispatch
    pub request_id: RequestId,
    /// Number of handlers invoked
    pub handlers_invoked: usize,
    /// Whether a handler aborted the dispatch
    pub aborted: bool,
    /// Error still pending when the dispatch ended
    pub error: Option<RouteError>,
}

impl DispatchOutcome {
    /// Returns true if at least one handler ran.
    ///
    /// A dispatch where nothing ran is the caller's cue to answer with its
    /// own "not found" response.
    pub fn handled(&self) -> bool {
        self.handlers_invoked > 0
    }
}
