//! The `show` command: detail view for a single issue.
//!
//! A detail view opened on its own has no in-memory list, so lookup
//! falls back from the store to the cache slot left by the last
//! successful fetch. A miss in both is simply "not found".

use crate::cache::IssueCache;
use crate::display::issue_detail;
use crate::error::{GantryError, Result};
use crate::store::IssueStore;
use crate::types::Issue;

/// Resolve an issue by key: the in-memory list wins, the cache recovers
/// deep links.
pub fn lookup_issue(store: &IssueStore, cache: &IssueCache, key: &str) -> Option<Issue> {
    store.find_by_key(key).or_else(|| cache.find(key))
}

pub fn cmd_show(key: &str, json: bool) -> Result<()> {
    let store = IssueStore::new();
    let cache = IssueCache::new()?;

    let issue = lookup_issue(&store, &cache, key).ok_or_else(|| {
        tracing::debug!(key, "not in store or cache; a fresh `gantry list` would repopulate");
        GantryError::IssueNotFound(key.to_string())
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&issue)?);
    } else {
        print!("{}", issue_detail(&issue));
    }
    Ok(())
}
