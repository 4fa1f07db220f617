//! Test module for chain-router
//!
//! Scenario tests for the dispatch engine plus property-based tests using
//! proptest for the matching and dispatch invariants.

use std::sync::{Arc, Mutex};

use crate::{Context, Handler};

#[cfg(test)]
pub mod dispatch_tests;


#[cfg(test)]
pub mod output_tests;


/// Shared record of handler invocations, in call order.
#[derive(Clone, Default)]
pub(crate) struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Handler that records `label` and returns.
    pub(crate) fn mark(&self, label: &'static str) -> Handler {
        let trace = self.clone();
        Handler::new(move |_ctx: &mut Context<'_>| trace.push(label))
    }
}
