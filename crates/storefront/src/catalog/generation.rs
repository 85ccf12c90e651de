//! Request-generation guard for catalog fetches.
//!
//! Each view (shop listing, search results, product page) has a scope. Every
//! fetch starts by taking a ticket for its scope; starting a newer fetch in
//! the same scope makes older tickets stale, and their results are dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Hands out fetch tickets per scope.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard {
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

/// Proof of which fetch a response belongs to.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    scope: String,
    generation: u64,
    guard: FetchGuard,
}

impl FetchGuard {
    /// Create a guard with no fetches in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch in `scope`, superseding any earlier one.
    #[must_use]
    pub fn begin(&self, scope: impl Into<String>) -> FetchTicket {
        let scope = scope.into();
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(scope.clone()).or_insert(0);
        *generation += 1;
        FetchTicket {
            scope,
            generation: *generation,
            guard: self.clone(),
        }
    }

    fn current(&self, scope: &str) -> u64 {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(scope)
            .copied()
            .unwrap_or(0)
    }
}

impl FetchTicket {
    /// Whether no newer fetch has started in this ticket's scope.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.guard.current(&self.scope) == self.generation
    }

    /// Pass `value` through if this ticket is still current.
    pub fn accept<T>(&self, value: T) -> Option<T> {
        if self.is_current() {
            Some(value)
        } else {
            debug!(
                scope = %self.scope,
                generation = self.generation,
                "Dropping stale catalog response"
            );
            None
        }
    }

    /// The scope this ticket was issued for.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}
