//! Dispatch engine
//!
//! Dispatch walks the router tree depth-first using an explicit frame stack
//! stored in the [`Context`]. Every entered node gets a frame holding its
//! handler cursor, child cursor, path offset and the parameters of its
//! caller. The loop in [`Context::resume`] repeats three steps on the top
//! frame:
//!
//! 1. invoke the node's next handler, if one is left and eligible
//! 2. otherwise enter the next eligible child that matches the remaining path
//! 3. otherwise pop the frame and restore the caller's parameters
//!
//! `next()` re-enters this loop from inside a handler and returns when the
//! dispatch has completed. `next_route()` first discards the invoking frame
//! and everything above it, so the loop continues with the enclosing router's
//! child search. A failed handler is treated as an implicit `next_route()`
//! after its error has been recorded.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::{Continuation, RouterConfig};
use crate::context::Context;
use crate::error::{RouteError, RouteResult};
use crate::handler::{Handler, HandlerResult};
use crate::logging::{
    dispatch_span, log_dispatch_finished, log_error_replaced, log_handler_failed,
    log_handler_panicked, log_no_match, log_step,
};
use crate::matcher::Matchable;
use crate::params::Params;
use crate::response::Output;
use crate::route::Route;
use crate::router::{Node, Router};

/// Borrowed view of a tree node.
#[derive(Clone, Copy)]
enum NodeRef<'r> {
    Router(&'r Router),
    Route(&'r Route),
}

impl<'r> NodeRef<'r> {
    fn handlers(self) -> &'r [Handler] {
        match self {
            Self::Router(router) => router.handlers(),
            Self::Route(route) => route.handlers(),
        }
    }

    fn children(self) -> &'r [Node] {
        match self {
            Self::Router(router) => router.children(),
            Self::Route(_) => &[],
        }
    }

    fn runs_on_error(self) -> bool {
        matches!(self, Self::Route(route) if route.is_error_route())
    }

    fn pattern(self) -> &'r str {
        match self {
            Self::Router(router) => router.pattern(),
            Self::Route(route) => route.pattern(),
        }
    }
}

impl<'r> From<&'r Node> for NodeRef<'r> {
    fn from(node: &'r Node) -> Self {
        match node {
            Node::Router(router) => Self::Router(router),
            Node::Route(route) => Self::Route(route),
        }
    }
}

/// Pattern of an entered node, linked to the scope it was entered from.
struct Scope<'r> {
    pattern: &'r str,
    parent: Option<Arc<Scope<'r>>>,
}

/// An entered node.
struct Frame<'r> {
    node: NodeRef<'r>,
    scope: Arc<Scope<'r>>,
    /// Byte offset of the node's unconsumed path
    offset: usize,
    next_handler: usize,
    next_child: usize,
    /// Parameters in effect before the node was entered
    saved_params: Params,
}

/// A handler that is currently running.
struct Invocation<'r> {
    depth: usize,
    offset: usize,
    node: NodeRef<'r>,
    /// Outlives the frame, which `next()` may already have popped
    scope: Arc<Scope<'r>>,
}

/// Continuation state of one dispatch.
#[derive(Default)]
pub(crate) struct DispatchState<'r> {
    frames: Vec<Frame<'r>>,
    invocations: Vec<Invocation<'r>>,
    routed_len: Option<usize>,
    pub(crate) finished: bool,
    pub(crate) aborted: bool,
    pub(crate) handlers_invoked: usize,
    continuation: Continuation,
    recover_panics: bool,
    debug_logging: bool,
}

impl<'r> DispatchState<'r> {
    fn start(config: &RouterConfig, routed_len: usize) -> Self {
        Self {
            routed_len: Some(routed_len),
            continuation: config.continuation,
            recover_panics: config.recover_panics,
            debug_logging: config.debug_logging,
            ..Self::default()
        }
    }

    pub(crate) fn in_handler(&self) -> bool {
        !self.invocations.is_empty()
    }

    pub(crate) fn current_depth(&self) -> Option<usize> {
        self.invocations.last().map(|invocation| invocation.depth)
    }

    pub(crate) fn current_offset(&self) -> usize {
        self.invocations.last().map_or(0, |invocation| invocation.offset)
    }

    pub(crate) fn current_pattern(&self) -> Option<&'r str> {
        self.invocations.last().map(|invocation| invocation.node.pattern())
    }

    /// Patterns from the root down to the node whose handler is running.
    pub(crate) fn scope_patterns(&self) -> Vec<&'r str> {
        let mut patterns = Vec::new();
        let mut scope = self.invocations.last().map(|invocation| &*invocation.scope);
        while let Some(current) = scope {
            patterns.push(current.pattern);
            scope = current.parent.as_deref();
        }
        patterns.reverse();
        patterns
    }

    pub(crate) fn routed_end(&self, path: &str) -> usize {
        self.routed_len.unwrap_or(path.len())
    }
}

impl<'r> Context<'r> {
    /// Run a complete dispatch rooted at `root`.
    pub(crate) fn run(&mut self, root: &'r Router) {
        let span = dispatch_span(&self.request_id, &self.method, &self.path);
        let _guard = span.enter();

        let config = root.config();
        self.dispatch = DispatchState::start(config, config.routed_len(&self.path));
        self.dispatch.frames.push(Frame {
            node: NodeRef::Router(root),
            scope: Arc::new(Scope {
                pattern: root.pattern(),
                parent: None,
            }),
            offset: 0,
            next_handler: 0,
            next_child: 0,
            saved_params: self.params.clone(),
        });

        self.resume();
        self.unwind_to(0);
        self.dispatch.finished = true;

        if self.dispatch.handlers_invoked == 0 {
            log_no_match();
        }
        log_dispatch_finished(
            self.dispatch.handlers_invoked,
            self.dispatch.aborted,
            self.error.as_ref().map(|error| error.code),
        );
    }

    /// Drive the dispatch until it completes.
    pub(crate) fn resume(&mut self) {
        while !self.dispatch.finished {
            let Some(depth) = self.dispatch.frames.len().checked_sub(1) else {
                self.dispatch.finished = true;
                break;
            };
            let error_pending = self.error.is_some();
            let end = self.dispatch.routed_end(&self.path);
            let frame = &mut self.dispatch.frames[depth];
            let node = frame.node;

            // Step 1: the node's own handlers.
            let handlers = node.handlers();
            if frame.next_handler < handlers.len() && (!error_pending || node.runs_on_error()) {
                let handler = &handlers[frame.next_handler];
                frame.next_handler += 1;
                let invocation = Invocation {
                    depth,
                    offset: frame.offset,
                    node,
                    scope: Arc::clone(&frame.scope),
                };
                self.invoke(handler, invocation);
                continue;
            }
            // Once children are searched the node never returns to step 1.
            frame.next_handler = handlers.len();

            // Step 2: the first eligible matching child.
            let remaining = self.path.get(frame.offset..end).unwrap_or("");
            let children = node.children();
            let mut entered = None;
            while frame.next_child < children.len() {
                let child = &children[frame.next_child];
                frame.next_child += 1;
                if !child.is_eligible(error_pending) {
                    continue;
                }
                if let Some(matched) = child.matches(&self.method, remaining) {
                    let offset = frame.offset + matched.consumed_len(remaining);
                    entered = Some((child, offset, matched.params));
                    break;
                }
            }

            match entered {
                Some((child, offset, captured)) => self.enter(child, offset, captured, depth + 1),
                // Step 3: exhausted, return to the caller.
                None => self.leave(),
            }
        }
    }

    /// Drop the frame at `depth` and every frame above it, restoring the
    /// parameters that were in effect before that frame was entered.
    pub(crate) fn unwind_to(&mut self, depth: usize) {
        if depth >= self.dispatch.frames.len() {
            return;
        }
        if let Some(frame) = self.dispatch.frames.drain(depth..).next() {
            self.params = frame.saved_params;
        }
    }

    fn enter(
        &mut self,
        child: &'r Node,
        offset: usize,
        captured: HashMap<String, String>,
        depth: usize,
    ) {
        let saved_params = self.params.clone();
        if !captured.is_empty() {
            self.params = self.params.extended(captured);
        }
        let node = NodeRef::from(child);
        if self.dispatch.debug_logging {
            log_step(depth, node.pattern(), "enter");
        }
        let scope = Arc::new(Scope {
            pattern: node.pattern(),
            parent: self.dispatch.frames.last().map(|frame| Arc::clone(&frame.scope)),
        });
        self.dispatch.frames.push(Frame {
            node,
            scope,
            offset,
            next_handler: 0,
            next_child: 0,
            saved_params,
        });
    }

    fn leave(&mut self) {
        if let Some(frame) = self.dispatch.frames.pop() {
            if self.dispatch.debug_logging {
                log_step(self.dispatch.frames.len(), frame.node.pattern(), "leave");
            }
            self.params = frame.saved_params;
        }
    }

    fn invoke(&mut self, handler: &'r Handler, invocation: Invocation<'r>) {
        let depth = invocation.depth;
        let pattern = invocation.node.pattern();
        if self.dispatch.debug_logging {
            log_step(depth, pattern, "invoke");
        }
        self.dispatch.handlers_invoked += 1;

        let level = self.dispatch.invocations.len();
        self.dispatch.invocations.push(invocation);
        let result = self
            .call_handler(handler, depth, pattern)
            .and_then(|output| {
                self.write_output(output)
                    .inspect_err(|error| log_handler_failed(depth, pattern, error))
            });
        self.dispatch.invocations.truncate(level);

        match result {
            Ok(()) => {
                if !self.dispatch.finished && self.dispatch.continuation == Continuation::Stop {
                    self.dispatch.finished = true;
                }
            }
            Err(error) => {
                self.record_error(error);
                // A handler that already drove the dispatch to completion only
                // leaves its error behind.
                if !self.dispatch.finished {
                    self.unwind_to(depth);
                }
            }
        }
    }

    fn call_handler(&mut self, handler: &'r Handler, depth: usize, pattern: &str) -> HandlerResult {
        if !self.dispatch.recover_panics {
            return handler
                .call(self)
                .inspect_err(|error| log_handler_failed(depth, pattern, error));
        }
        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(self))) {
            Ok(result) => result.inspect_err(|error| log_handler_failed(depth, pattern, error)),
            Err(payload) => {
                let error = RouteError::from_panic(&*payload);
                log_handler_panicked(depth, pattern, &error);
                Err(error)
            }
        }
    }

    fn write_output(&mut self, output: Output) -> RouteResult<()> {
        if output.is_empty() {
            return Ok(());
        }
        if let Some(writer) = self.response.data_writer() {
            writer.write_data(&output)?;
            return Ok(());
        }
        self.response.write(&output.into_bytes())?;
        Ok(())
    }

    fn record_error(&mut self, error: RouteError) {
        if let Some(previous) = &self.error {
            log_error_replaced(previous.code, error.code);
        }
        self.error = Some(error);
    }
}
