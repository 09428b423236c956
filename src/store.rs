//! Shared issue store: single writer, read-only consumers.
//!
//! The fetch pipeline is the only writer. Each logical query takes a
//! ticket from [`IssueStore::begin_query`]; committing with a stale
//! ticket is a no-op, which gives last-query-wins without holding any
//! lock across network awaits.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::types::Issue;

#[derive(Debug, Default)]
pub struct IssueStore {
    issues: RwLock<Vec<Issue>>,
    generation: AtomicU64,
}

/// Proof of having started a query; only the newest ticket can commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    generation: u64,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new logical query, superseding any earlier one.
    pub fn begin_query(&self) -> QueryTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        QueryTicket { generation }
    }

    /// Replace the issue list if the ticket is still current. Returns
    /// whether the commit won; a superseded commit changes nothing.
    pub fn commit(&self, ticket: &QueryTicket, issues: Vec<Issue>) -> bool {
        if self.generation.load(Ordering::SeqCst) != ticket.generation {
            tracing::debug!(
                generation = ticket.generation,
                "discarding superseded fetch result"
            );
            return false;
        }
        *self.issues.write() = issues;
        true
    }

    /// Snapshot of the current list.
    pub fn snapshot(&self) -> Vec<Issue> {
        self.issues.read().clone()
    }

    pub fn find_by_key(&self, key: &str) -> Option<Issue> {
        self.issues.read().iter().find(|i| i.key == key).cloned()
    }

    pub fn len(&self) -> usize {
        self.issues.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.read().is_empty()
    }
}
