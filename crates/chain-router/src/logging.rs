//! Structured logging for registration and dispatch events.
//!
//! Every event is emitted through `tracing`; install any subscriber to
//! collect them. Dispatch events are emitted inside a `dispatch` span that
//! carries the request ID, method and path.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, RouteError};

/// Length of the short request ID used in compact log output.
pub const SHORT_ID_LENGTH: usize = 8;

/// Unique identifier for a request, used for log correlation.
///
/// Uses UUID v7 for time-ordered, sortable identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    /// Returns the first [`SHORT_ID_LENGTH`] characters of the ID.
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(SHORT_ID_LENGTH).collect()
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for RequestId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Log a route registration. Logged at Trace level.
pub fn log_route_registered(pattern: &str, methods: &str, error_route: bool) {
    tracing::trace!(
        pattern = %pattern,
        methods = %methods,
        error_route = error_route,
        "Route registered"
    );
}

/// Log a group registration. Logged at Trace level.
pub fn log_group_registered(prefix: &str, handler_count: usize) {
    tracing::trace!(
        prefix = %prefix,
        handler_count = handler_count,
        "Group registered"
    );
}

// =============================================================================
// Dispatch
// =============================================================================

/// Span wrapping one dispatch.
pub(crate) fn dispatch_span(request_id: &RequestId, method: &str, path: &str) -> tracing::Span {
    tracing::debug_span!(
        "dispatch",
        request_id = %request_id.short(),
        method = %method,
        path = %path
    )
}

/// Log one dispatch step. Logged at Trace level, only with `debug_logging`.
pub(crate) fn log_step(depth: usize, pattern: &str, step: &str) {
    tracing::trace!(depth = depth, pattern = %pattern, step = %step, "Dispatch step");
}

/// Log a failed handler invocation. Logged at Warn level.
pub(crate) fn log_handler_failed(depth: usize, pattern: &str, error: &RouteError) {
    tracing::warn!(
        depth = depth,
        pattern = %pattern,
        error_code = %error.code,
        error_message = %error.message,
        "Handler failed"
    );
}

/// Log a recovered handler panic. Logged at Error level.
pub(crate) fn log_handler_panicked(depth: usize, pattern: &str, error: &RouteError) {
    tracing::error!(
        depth = depth,
        pattern = %pattern,
        cause = ?error.cause,
        "Handler panicked"
    );
}

/// Log a pending error being replaced by a newer one. Logged at Debug level.
pub(crate) fn log_error_replaced(previous: ErrorCode, current: ErrorCode) {
    tracing::debug!(
        previous = %previous,
        current = %current,
        "Pending error replaced"
    );
}

/// Log a dispatch in which no handler ran. Logged at Debug level.
pub(crate) fn log_no_match() {
    tracing::debug!("No route matched");
}

/// Log the end of a dispatch. Logged at Debug level.
pub(crate) fn log_dispatch_finished(
    handlers_invoked: usize,
    aborted: bool,
    error: Option<ErrorCode>,
) {
    match error {
        Some(code) => tracing::debug!(
            handlers_invoked = handlers_invoked,
            aborted = aborted,
            error_code = %code,
            "Dispatch finished with pending error"
        ),
        None => tracing::debug!(
            handlers_invoked = handlers_invoked,
            aborted = aborted,
            "Dispatch finished"
        ),
    }
}
