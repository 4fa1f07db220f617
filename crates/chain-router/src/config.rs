//! Configuration for dispatch behaviour.
//!
//! # Example
//! ```rust,ignore
//! use chain_router::{Continuation, Router, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_continuation(Continuation::Stop)
//!     .with_ignore_trailing_slash(true);
//!
//! let router = Router::with_config(config);
//! ```

use serde::{Deserialize, Serialize};

/// What happens when a handler returns without calling `next`, `next_route`
/// or `abort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Continuation {
    /// Continue as if the handler had called `next`.
    #[default]
    Next,
    /// End the dispatch. Handlers must call `next` explicitly to continue.
    Stop,
}

/// Router configuration.
///
/// The configuration of the router passed to [`Router::dispatch`](crate::Router::dispatch)
/// applies to the whole dispatch; routers created by `group` inherit a copy
/// of their parent's configuration.
///
/// # Fields
///
/// * `continuation` - Policy for handlers that return without an explicit
///   continuation. Default: `Next`.
///
/// * `recover_panics` - Convert handler panics into `HANDLER_PANIC` errors
///   instead of unwinding through the dispatch. Default: true.
///
/// * `ignore_trailing_slash` - Route `/users/` as `/users`. The request path
///   seen by handlers is unchanged. Default: false.
///
/// * `debug_logging` - Emit a trace event for every dispatch step.
///   Default: false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Policy for handlers that return without an explicit continuation
    pub continuation: Continuation,
    /// Convert handler panics into errors
    pub recover_panics: bool,
    /// Trim trailing slashes before routing
    pub ignore_trailing_slash: bool,
    /// Trace every dispatch step
    pub debug_logging: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            continuation: Continuation::Next,
            recover_panics: true,
            ignore_trailing_slash: false,
            debug_logging: false,
        }
    }
}

impl RouterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the continuation policy.
    #[must_use]
    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = continuation;
        self
    }

    /// Enable or disable panic recovery.
    #[must_use]
    pub fn with_recover_panics(mut self, recover: bool) -> Self {
        self.recover_panics = recover;
        self
    }

    /// Enable or disable trailing-slash trimming.
    #[must_use]
    pub fn with_ignore_trailing_slash(mut self, ignore: bool) -> Self {
        self.ignore_trailing_slash = ignore;
        self
    }

    /// Enable or disable per-step trace logging.
    #[must_use]
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Length of the prefix of `path` that is routed.
    pub(crate) fn routed_len(&self, path: &str) -> usize {
        if !self.ignore_trailing_slash {
            return path.len();
        }
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() && !path.is_empty() {
            1
        } else {
            trimmed.len()
        }
    }
}
