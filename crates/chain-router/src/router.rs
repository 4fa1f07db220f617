//! Router tree construction
//!
//! A [`Router`] owns an ordered list of children, each either a nested
//! router created with [`Router::group`] or a [`Route`]. Registration order is
//! match priority: during dispatch the first eligible child that matches the
//! remaining path wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use chain_router::prelude::*;
//!
//! let mut router = Router::new();
//! router.use_handlers(log_request);
//! router.group("/admin", |admin| {
//!     admin.use_handlers(require_admin);
//!     admin.get("/stats", stats);
//! });
//! router.get(r"/users/<id:\d+>", show_user);
//! router.error(render_error);
//!
//! let outcome = router.serve("GET", "/users/42", ResponseBuffer::new());
//! ```

use crate::config::RouterConfig;
use crate::context::{Context, DispatchOutcome};
use crate::error::PatternError;
use crate::handler::{Handler, IntoHandlers};
use crate::logging::log_group_registered;
use crate::matcher::{Matchable, Matcher};
use crate::response::ResponseWriter;
use crate::route::Route;

/// A child of a router.
#[derive(Debug, Clone)]
pub enum Node {
    /// Nested router created by `group`
    Router(Router),
    /// Leaf route
    Route(Route),
}

impl Node {
    /// Handlers owned by the node itself.
    pub fn handlers(&self) -> &[Handler] {
        match self {
            Self::Router(router) => router.handlers(),
            Self::Route(route) => route.handlers(),
        }
    }

    /// Returns true for error routes.
    pub fn is_error_route(&self) -> bool {
        matches!(self, Self::Route(route) if route.is_error_route())
    }

    /// Returns true if the node may be entered given the request's error state.
    ///
    /// Routers are always eligible so that error routes nested in groups stay
    /// reachable; routes are eligible when their error flag agrees with the
    /// error state.
    pub fn is_eligible(&self, error_pending: bool) -> bool {
        match self {
            Self::Router(_) => true,
            Self::Route(route) => route.is_error_route() == error_pending,
        }
    }
}

impl Matchable for Node {
    fn matcher(&self) -> &Matcher {
        match self {
            Self::Router(router) => router.matcher(),
            Self::Route(route) => route.matcher(),
        }
    }
}

/// Composite node of the routing tree.
#[derive(Debug, Clone)]
pub struct Router {
    matcher: Matcher,
    handlers: Vec<Handler>,
    children: Vec<Node>,
    config: RouterConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a root router with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Create a root router with a custom configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            matcher: Matcher::catch_all(),
            handlers: Vec::new(),
            children: Vec::new(),
            config,
        }
    }

    /// Dispatch configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Handlers owned by this router, run before any child is tried.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Children in registration (priority) order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a route from a specification such as `"GET,POST /users/<id>"`.
    ///
    /// # Panics
    ///
    /// Panics if the specification is malformed. Use [`Router::try_to`] to
    /// handle the error instead.
    pub fn to(&mut self, spec: &str, handlers: impl IntoHandlers) -> &mut Route {
        match self.try_to(spec, handlers) {
            Ok(route) => route,
            Err(err) => panic!("{err}"),
        }
    }

    /// Register a route, returning an error for a malformed specification.
    pub fn try_to(
        &mut self,
        spec: &str,
        handlers: impl IntoHandlers,
    ) -> Result<&mut Route, PatternError> {
        let route = Route::try_new(spec, handlers)?;
        Ok(self.add_route(route))
    }

    /// Register a `GET` route.
    pub fn get(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("GET {path}"), handlers)
    }

    /// Register a `POST` route.
    pub fn post(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("POST {path}"), handlers)
    }

    /// Register a `PUT` route.
    pub fn put(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("PUT {path}"), handlers)
    }

    /// Register a `PATCH` route.
    pub fn patch(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("PATCH {path}"), handlers)
    }

    /// Register a `DELETE` route.
    pub fn delete(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("DELETE {path}"), handlers)
    }

    /// Register a `HEAD` route.
    pub fn head(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("HEAD {path}"), handlers)
    }

    /// Register an `OPTIONS` route.
    pub fn options(&mut self, path: &str, handlers: impl IntoHandlers) -> &mut Route {
        self.to(&format!("OPTIONS {path}"), handlers)
    }

    /// Register middleware for every request reaching this point of the tree.
    ///
    /// The handlers form a catch-all route, so they run for every route
    /// registered after them in this router.
    pub fn use_handlers(&mut self, handlers: impl IntoHandlers) -> &mut Route {
        self.add_route(Route::catch_all(handlers))
    }

    /// Register an error route that runs while an error is pending.
    pub fn error(&mut self, handlers: impl IntoHandlers) -> &mut Route {
        self.add_route(Route::catch_all(handlers).into_error_route())
    }

    /// Append a pre-built route.
    pub fn add_route(&mut self, route: Route) -> &mut Route {
        route.log_registered();
        self.children.push(Node::Route(route));
        match self.children.last_mut() {
            Some(Node::Route(route)) => route,
            _ => unreachable!("a route was just pushed"),
        }
    }

    /// Create a child router under `prefix` and configure it.
    ///
    /// # Panics
    ///
    /// Panics if the prefix is malformed.
    pub fn group<F>(&mut self, prefix: &str, configure: F) -> &mut Router
    where
        F: FnOnce(&mut Router),
    {
        self.group_with(prefix, Vec::<Handler>::new(), configure)
    }

    /// Create a child router with its own handlers under `prefix`.
    ///
    /// The handlers run before any of the child's routes are tried.
    ///
    /// # Panics
    ///
    /// Panics if the prefix is malformed.
    pub fn group_with<F>(
        &mut self,
        prefix: &str,
        handlers: impl IntoHandlers,
        configure: F,
    ) -> &mut Router
    where
        F: FnOnce(&mut Router),
    {
        match self.try_group(prefix, handlers, configure) {
            Ok(router) => router,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create a child router, returning an error for a malformed prefix.
    ///
    /// `configure` is called immediately with the new child, after it has
    /// been appended to this router's children.
    pub fn try_group<F>(
        &mut self,
        prefix: &str,
        handlers: impl IntoHandlers,
        configure: F,
    ) -> Result<&mut Router, PatternError>
    where
        F: FnOnce(&mut Router),
    {
        let child = Router {
            matcher: Matcher::parse(prefix)?,
            handlers: handlers.into_handlers(),
            children: Vec::new(),
            config: self.config.clone(),
        };
        log_group_registered(child.pattern(), child.handlers.len());

        self.children.push(Node::Router(child));
        let child = match self.children.last_mut() {
            Some(Node::Router(router)) => router,
            _ => unreachable!("a router was just pushed"),
        };
        configure(&mut *child);
        Ok(child)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatch the request held by `ctx` through this router's subtree.
    ///
    /// This router is the root of the dispatch: its own pattern is not
    /// matched, its handlers run first and its configuration applies.
    pub fn dispatch<'r>(&'r self, ctx: &mut Context<'r>) {
        ctx.run(self);
    }

    /// Dispatch `method` and `path`, writing output to `writer`.
    pub fn serve(&self, method: &str, path: &str, writer: impl ResponseWriter) -> DispatchOutcome {
        let mut ctx = Context::new(method, path, writer);
        self.dispatch(&mut ctx);
        ctx.into_outcome()
    }
}

impl Matchable for Router {
    fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}
