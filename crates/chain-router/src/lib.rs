#![warn(missing_docs)]
//! # chain-router
//!
//! A request router built around ordered handler chains and explicit
//! continuations.
//!
//! ## Overview
//!
//! - **Route specifications** such as `"GET,POST /users/<id:\d+>"` compile to
//!   a method set plus a literal prefix or an anchored regex with named groups
//! - **Routers nest**: a group consumes its prefix and hands the rest of the
//!   path to its children
//! - **Handlers chain**: every matched node runs its handlers in order;
//!   `next()`, `next_route()` and `abort()` steer the rest of the dispatch
//! - **Errors reroute**: a failing handler records its error and dispatch
//!   continues with error routes only
//!
//! ## Dispatch order
//!
//! ```text
//! Router (root)
//!  ├── Route  (catch-all)   use_handlers(log)       ①
//!  ├── Router "/admin"      group_with(.., auth)    ② auth
//!  │    └── Route "GET /stats"                      ③ stats
//!  ├── Route "GET /users/<id>"                      (skipped: no match)
//!  └── Route  (error)       error(render_error)     only after a failure
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chain_router::prelude::*;
//!
//! fn log_request(ctx: &mut Context<'_>) {
//!     tracing::info!(method = %ctx.method(), path = %ctx.path(), "request");
//! }
//!
//! fn show_user(ctx: &mut Context<'_>) -> RouteResult<String> {
//!     let id = ctx.param("id").ok_or_else(|| RouteError::bad_request("missing id"))?;
//!     Ok(format!("user {id}"))
//! }
//!
//! fn render_error(ctx: &mut Context<'_>) -> Output {
//!     let error = ctx.take_error().map(RouteError::sanitize);
//!     Output::from(error.map(|e| e.to_string()))
//! }
//!
//! let mut router = Router::new();
//! router.use_handlers(log_request);
//! router.get(r"/users/<id:\d+>", show_user);
//! router.error(render_error);
//!
//! let body = ResponseBuffer::new();
//! let outcome = router.serve("GET", "/users/42", body.clone());
//! assert!(outcome.handled());
//! assert_eq!(body.text(), "user 42");
//! ```

pub mod config;
pub mod context;
mod dispatch;
pub mod error;
pub mod handler;
pub mod logging;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod response;
pub mod route;
pub mod router;

#[cfg(test)]
mod tests;

pub use config::{Continuation, RouterConfig};
pub use context::{Context, DispatchOutcome};
pub use error::{ErrorCode, PatternError, RouteError, RouteResult};
pub use handler::{Handler, HandlerResult, IntoHandlerResult, IntoHandlers};
pub use logging::RequestId;
pub use matcher::{Matchable, Matcher};
pub use params::Params;
pub use pattern::{PathMatch, PathPattern};
pub use response::{DataWriter, Discard, JsonResponse, Output, ResponseBuffer, ResponseWriter};
pub use route::Route;
pub use router::{Node, Router};

/// Common imports for building routers and handlers.
pub mod prelude {
    pub use crate::handlers;
    pub use crate::{
        Context, Continuation, DataWriter, DispatchOutcome, ErrorCode, Handler, JsonResponse,
        Matchable, Output, Params, ResponseBuffer, ResponseWriter, Route, RouteError, RouteResult,
        Router, RouterConfig,
    };
}
