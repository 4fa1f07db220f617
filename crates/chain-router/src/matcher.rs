//! The matching contract shared by routers and routes.

use std::collections::BTreeSet;

use crate::error::PatternError;
use crate::pattern::{PathMatch, PathPattern, split_spec};

/// Method restriction plus compiled path pattern of a tree node.
#[derive(Debug, Clone)]
pub struct Matcher {
    methods: BTreeSet<String>,
    path: PathPattern,
}

impl Matcher {
    /// Parse and compile a route specification such as `"GET,POST /users/<id>"`.
    pub fn parse(spec: &str) -> Result<Self, PatternError> {
        let (methods, pattern) = split_spec(spec)?;
        Ok(Self {
            methods,
            path: PathPattern::compile(pattern)?,
        })
    }

    /// Matcher accepting every method and every path without consuming anything.
    pub fn catch_all() -> Self {
        Self {
            methods: BTreeSet::new(),
            path: PathPattern::Literal(String::new()),
        }
    }

    /// Accepted methods; empty means any method.
    pub fn methods(&self) -> &BTreeSet<String> {
        &self.methods
    }

    /// Compiled path pattern.
    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    /// Returns true if `method` passes the method restriction.
    pub fn accepts_method(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Accept/reject a request, consuming a path prefix and capturing parameters.
///
/// Implemented by [`Router`](crate::Router), [`Route`](crate::Route) and the
/// [`Node`](crate::Node) enum that stores either in a router's children.
pub trait Matchable {
    /// The node's matcher.
    fn matcher(&self) -> &Matcher;

    /// Match method and path. A method outside a non-empty method set is
    /// rejected without looking at the path.
    fn matches<'p>(&self, method: &str, path: &'p str) -> Option<PathMatch<'p>> {
        let matcher = self.matcher();
        if !matcher.accepts_method(method) {
            return None;
        }
        matcher.path.match_path(path)
    }

    /// Match only the path, ignoring the method restriction.
    fn match_path<'p>(&self, path: &'p str) -> Option<PathMatch<'p>> {
        self.matcher().path.match_path(path)
    }

    /// Path pattern as registered.
    fn pattern(&self) -> &str {
        self.matcher().path.as_str()
    }
}

impl Matchable for Matcher {
    fn matcher(&self) -> &Matcher {
        self
    }
}
