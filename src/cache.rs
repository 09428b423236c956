//! Single-slot cache of the last fully fetched issue list.
//!
//! The slot is one JSON file, overwritten wholesale after each
//! successful fetch. It exists so a detail view opened on its own can
//! recover one issue without refetching. A corrupt slot is logged and
//! treated as a miss, never as an error.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{GantryError, Result};
use crate::types::Issue;

const CACHE_FILE: &str = "issues.json";

#[derive(Debug, Clone)]
pub struct IssueCache {
    path: PathBuf,
}

impl IssueCache {
    /// Cache slot in the user cache directory.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "gantry").ok_or_else(|| {
            GantryError::Config("cannot determine a cache directory for this user".to_string())
        })?;
        Ok(Self {
            path: dirs.cache_dir().join(CACHE_FILE),
        })
    }

    /// Cache slot at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot with the given list.
    pub fn store(&self, issues: &[Issue]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(issues)?;
        fs::write(&self.path, json)?;
        tracing::debug!(count = issues.len(), path = %self.path.display(), "cached issue list");
        Ok(())
    }

    /// Read the cached list. Any failure is a miss: an unreadable file is
    /// expected on first run, and a corrupt one is logged at WARN.
    pub fn load(&self) -> Option<Vec<Issue>> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(issues) => Some(issues),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "discarding corrupt issue cache"
                );
                None
            }
        }
    }

    /// Recover a single issue by key from the cached list.
    pub fn find(&self, key: &str) -> Option<Issue> {
        self.load()?.into_iter().find(|i| i.key == key)
    }

    /// Remove the slot if present.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UserRef, Worklog};

    fn sample_issues() -> Vec<Issue> {
        vec![
            Issue {
                id: "10001".to_string(),
                key: "MECH-1".to_string(),
                summary: "Saw blade replacement".to_string(),
                status: "Done".to_string(),
                status_category: Some("done".to_string()),
                assignee: Some(UserRef {
                    account_id: "abc".to_string(),
                    display_name: "Rūta J.".to_string(),
                    avatar: None,
                }),
                created: "2025-01-05T08:00:00.000+0200".to_string(),
                updated: "2025-01-06T08:00:00.000+0200".to_string(),
                time_spent_seconds: 3600,
                worklogs: vec![Worklog {
                    id: "1".to_string(),
                    author: None,
                    started: "2025-01-05T09:00:00.000+0200".to_string(),
                    time_spent_seconds: 3600,
                }],
                ..Issue::default()
            },
            Issue {
                id: "10002".to_string(),
                key: "MECH-2".to_string(),
                summary: "Press calibration".to_string(),
                ..Issue::default()
            },
        ]
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IssueCache::at(dir.path().join(CACHE_FILE));

        let issues = sample_issues();
        cache.store(&issues).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded, issues);
    }

    #[test]
    fn find_recovers_one_issue_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IssueCache::at(dir.path().join(CACHE_FILE));
        cache.store(&sample_issues()).unwrap();

        assert_eq!(cache.find("MECH-2").unwrap().summary, "Press calibration");
        assert!(cache.find("MECH-404").is_none());
    }

    #[test]
    fn missing_slot_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IssueCache::at(dir.path().join(CACHE_FILE));
        assert!(cache.load().is_none());
        assert!(cache.find("MECH-1").is_none());
    }

    #[test]
    fn corrupt_slot_is_a_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE);
        let cache = IssueCache::at(path.clone());

        cache.store(&sample_issues()).unwrap();
        fs::write(&path, b"{not json!").unwrap();

        assert!(cache.load().is_none());
        assert!(cache.find("MECH-1").is_none());
    }

    #[test]
    fn store_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IssueCache::at(dir.path().join(CACHE_FILE));

        cache.store(&sample_issues()).unwrap();
        cache
            .store(&[Issue {
                key: "MECH-9".to_string(),
                ..Issue::default()
            }])
            .unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].key, "MECH-9");
    }

    #[test]
    fn clear_tolerates_absent_slot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IssueCache::at(dir.path().join(CACHE_FILE));
        cache.clear().unwrap();

        cache.store(&sample_issues()).unwrap();
        cache.clear().unwrap();
        assert!(cache.load().is_none());
    }
}
