//! Leaf nodes of the router tree.

use crate::error::PatternError;
use crate::handler::{Handler, IntoHandlers};
use crate::logging::log_route_registered;
use crate::matcher::{Matchable, Matcher};

/// A method/path matcher bound to an ordered handler list.
///
/// Error routes only run while the request carries a pending error; ordinary
/// routes only run while it does not.
#[derive(Debug, Clone)]
pub struct Route {
    matcher: Matcher,
    handlers: Vec<Handler>,
    error_route: bool,
}

impl Route {
    /// Build a route from a specification such as `"GET /users/<id>"`.
    ///
    /// # Panics
    ///
    /// Panics if the specification is malformed. Use [`Route::try_new`] to
    /// handle the error instead.
    pub fn new(spec: &str, handlers: impl IntoHandlers) -> Self {
        Self::try_new(spec, handlers).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Build a route, returning an error for a malformed specification.
    pub fn try_new(spec: &str, handlers: impl IntoHandlers) -> Result<Self, PatternError> {
        Ok(Self::from_parts(Matcher::parse(spec)?, handlers.into_handlers()))
    }

    /// Route matching every method and path, consuming nothing.
    pub fn catch_all(handlers: impl IntoHandlers) -> Self {
        Self::from_parts(Matcher::catch_all(), handlers.into_handlers())
    }

    fn from_parts(matcher: Matcher, handlers: Vec<Handler>) -> Self {
        Self {
            matcher,
            handlers,
            error_route: false,
        }
    }

    /// Mark this route as an error route.
    #[must_use]
    pub fn into_error_route(mut self) -> Self {
        self.error_route = true;
        self
    }

    /// Returns true if this route only runs while an error is pending.
    pub fn is_error_route(&self) -> bool {
        self.error_route
    }

    /// The route's handlers, in invocation order.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub(crate) fn log_registered(&self) {
        let methods = self
            .matcher
            .methods()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        log_route_registered(self.pattern(), &methods, self.error_route);
    }
}

impl Matchable for Route {
    fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}
