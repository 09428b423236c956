//! Pure derivation of the display subset: sort, then filter, then page.
//!
//! Everything here recomputes from scratch on any input change; there is
//! no incremental or staged filtering. The in-memory list itself is
//! never mutated.

use std::str::FromStr;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use jiff::civil::Date;
use unicase::UniCase;

use crate::error::GantryError;
use crate::types::Issue;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Client-side sort direction over the created timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewSort {
    #[default]
    Newest,
    Oldest,
}

impl FromStr for ViewSort {
    type Err = GantryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ViewSort::Newest),
            "oldest" => Ok(ViewSort::Oldest),
            _ => Err(GantryError::Config(format!(
                "unknown view sort '{}', expected 'newest' or 'oldest'",
                s
            ))),
        }
    }
}

/// Transient display state. Distinct from [`crate::types::Filters`]:
/// filters shape the upstream query, view state narrows what is already
/// in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub sort: ViewSort,
    pub text: String,
    pub statuses: Vec<String>,
    pub mechanics: Vec<String>,
    pub created_from: Option<Date>,
    pub created_to: Option<Date>,
    /// 1-based page number; clamped into range during derivation.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            sort: ViewSort::Newest,
            text: String::new(),
            statuses: Vec::new(),
            mechanics: Vec::new(),
            created_from: None,
            created_to: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One derived page plus the totals the pager needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPage {
    pub issues: Vec<Issue>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matching: usize,
}

/// Derive the visible page. Sort precedes filter; filter precedes the
/// page slice.
pub fn derive_page(issues: &[Issue], state: &ViewState) -> ViewPage {
    let mut sorted: Vec<Issue> = issues.to_vec();
    match state.sort {
        ViewSort::Newest => sorted.sort_by(|a, b| b.created.cmp(&a.created)),
        ViewSort::Oldest => sorted.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    let matcher = SkimMatcherV2::default();
    let filtered: Vec<Issue> = sorted
        .into_iter()
        .filter(|issue| matches(issue, state, &matcher))
        .collect();

    let total_matching = filtered.len();
    let page_size = state.page_size.max(1);
    let total_pages = total_matching.div_ceil(page_size).max(1);
    let page = state.page.clamp(1, total_pages);

    let issues = filtered
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    ViewPage {
        issues,
        page,
        total_pages,
        total_matching,
    }
}

fn matches(issue: &Issue, state: &ViewState, matcher: &SkimMatcherV2) -> bool {
    let text = state.text.trim();
    if !text.is_empty() {
        let hit = matcher.fuzzy_match(&issue.summary, text).is_some()
            || matcher.fuzzy_match(&issue.key, text).is_some()
            || issue
                .description
                .as_deref()
                .is_some_and(|d| matcher.fuzzy_match(d, text).is_some());
        if !hit {
            return false;
        }
    }

    if !state.statuses.is_empty()
        && !state
            .statuses
            .iter()
            .any(|s| UniCase::new(s.as_str()) == UniCase::new(issue.status.as_str()))
    {
        return false;
    }

    if !state.mechanics.is_empty()
        && !state.mechanics.iter().any(|wanted| {
            issue
                .mechanics
                .iter()
                .any(|m| UniCase::new(m.as_str()) == UniCase::new(wanted.as_str()))
        })
    {
        return false;
    }

    if state.created_from.is_some() || state.created_to.is_some() {
        let Some(created) = created_date(issue) else {
            // An unparseable timestamp cannot satisfy a date bound.
            return false;
        };
        if let Some(from) = state.created_from
            && created < from
        {
            return false;
        }
        if let Some(to) = state.created_to
            && created > to
        {
            return false;
        }
    }

    true
}

/// The calendar date of an ISO 8601 created timestamp.
fn created_date(issue: &Issue) -> Option<Date> {
    issue.created.get(..10)?.parse::<Date>().ok()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn issue(key: &str, created: &str) -> Issue {
        Issue {
            key: key.to_string(),
            created: created.to_string(),
            ..Issue::default()
        }
    }

    fn three_issues() -> Vec<Issue> {
        vec![
            issue("MECH-1", "2025-01-01T08:00:00.000+0200"),
            issue("MECH-2", "2025-03-01T08:00:00.000+0200"),
            issue("MECH-3", "2025-02-01T08:00:00.000+0200"),
        ]
    }

    #[test]
    fn sort_filter_paginate_composition() {
        let issues = three_issues();
        let mut state = ViewState {
            page_size: 2,
            ..ViewState::default()
        };

        let first = derive_page(&issues, &state);
        let keys: Vec<&str> = first.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["MECH-2", "MECH-3"]);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_matching, 3);

        state.page = 2;
        let second = derive_page(&issues, &state);
        let keys: Vec<&str> = second.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["MECH-1"]);
    }

    #[test]
    fn oldest_sort_reverses_order() {
        let state = ViewState {
            sort: ViewSort::Oldest,
            ..ViewState::default()
        };
        let page = derive_page(&three_issues(), &state);
        let keys: Vec<&str> = page.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["MECH-1", "MECH-3", "MECH-2"]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let state = ViewState {
            created_from: Some(date(2025, 2, 1)),
            created_to: Some(date(2025, 3, 1)),
            ..ViewState::default()
        };
        let page = derive_page(&three_issues(), &state);
        let keys: Vec<&str> = page.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["MECH-2", "MECH-3"]);
    }

    #[test]
    fn unparseable_created_fails_date_bounds() {
        let mut issues = three_issues();
        issues.push(issue("MECH-4", "not a timestamp"));

        let bounded = ViewState {
            created_from: Some(date(2025, 1, 1)),
            ..ViewState::default()
        };
        assert_eq!(derive_page(&issues, &bounded).total_matching, 3);

        // Without bounds the malformed row still shows.
        assert_eq!(derive_page(&issues, &ViewState::default()).total_matching, 4);
    }

    #[test]
    fn status_filter_is_case_insensitive() {
        let mut issues = three_issues();
        issues[0].status = "In Progress".to_string();
        issues[1].status = "Done".to_string();
        issues[2].status = "done".to_string();

        let state = ViewState {
            statuses: vec!["DONE".to_string()],
            ..ViewState::default()
        };
        assert_eq!(derive_page(&issues, &state).total_matching, 2);
    }

    #[test]
    fn mechanics_filter_matches_any_selected() {
        let mut issues = three_issues();
        issues[0].mechanics = vec!["UV linijos".to_string()];
        issues[1].mechanics = vec!["Kuper - I".to_string()];

        let state = ViewState {
            mechanics: vec!["uv linijos".to_string(), "IMA line".to_string()],
            ..ViewState::default()
        };
        let page = derive_page(&issues, &state);
        assert_eq!(page.total_matching, 1);
        assert_eq!(page.issues[0].key, "MECH-1");
    }

    #[test]
    fn text_filter_matches_summary_key_or_description() {
        let mut issues = three_issues();
        issues[0].summary = "Conveyor belt misaligned".to_string();
        issues[1].description = Some("replace the saw blade".to_string());

        let by_summary = ViewState {
            text: "conveyor".to_string(),
            ..ViewState::default()
        };
        assert_eq!(derive_page(&issues, &by_summary).total_matching, 1);

        let by_description = ViewState {
            text: "saw blade".to_string(),
            ..ViewState::default()
        };
        let page = derive_page(&issues, &by_description);
        assert!(page.issues.iter().any(|i| i.key == "MECH-2"));
    }

    #[test]
    fn page_number_clamps_into_range() {
        let state = ViewState {
            page: 99,
            page_size: 2,
            ..ViewState::default()
        };
        let page = derive_page(&three_issues(), &state);
        assert_eq!(page.page, 2);
        assert_eq!(page.issues.len(), 1);

        let empty = derive_page(&[], &state);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.issues.is_empty());
    }
}
