//! Core domain types: the normalized issue shape and the search filter set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GantryError, Result};

/// Display name of the request-type JQL field on Jira Cloud. The actual
/// name can differ per site and is detected from field metadata.
pub const REQUEST_TYPE_FIELD_DEFAULT: &str = "Request Type";

pub const VALID_SORT_ORDERS: &[&str] =
    &["created-desc", "created-asc", "updated-desc", "updated-asc"];

/// Lightweight user reference as the tracker reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub account_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A single time-tracking entry on an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worklog {
    pub id: String,
    pub author: Option<UserRef>,
    /// ISO 8601 start timestamp, as reported upstream.
    pub started: String,
    pub time_spent_seconds: u64,
}

/// Attachment metadata; content is fetched separately by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

/// Normalized issue record.
///
/// Timestamps stay in their upstream ISO 8601 form; they compare
/// correctly as strings and are parsed only where a calendar date is
/// needed (view filtering, display).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub status: String,
    pub status_category: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<UserRef>,
    pub reporter: Option<UserRef>,
    pub created: String,
    pub updated: String,
    pub resolved: Option<String>,
    pub time_spent_seconds: u64,
    pub remaining_estimate_seconds: u64,
    pub issue_type: String,
    pub project: String,
    pub request_type: Option<String>,
    pub request_url: Option<String>,
    pub description: Option<String>,
    /// Display names extracted from the multi-value mechanics field.
    pub mechanics: Vec<String>,
    /// The mechanics field exactly as the tracker sent it.
    pub mechanics_raw: serde_json::Value,
    pub worklogs: Vec<Worklog>,
    pub attachments: Vec<Attachment>,
}

/// Assignee selector for the search filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    Any,
    Me,
    Unassigned,
    Account(String),
}

impl FromStr for AssigneeFilter {
    type Err = GantryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "any" => Ok(AssigneeFilter::Any),
            "me" => Ok(AssigneeFilter::Me),
            "unassigned" => Ok(AssigneeFilter::Unassigned),
            id => Ok(AssigneeFilter::Account(id.to_string())),
        }
    }
}

impl fmt::Display for AssigneeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssigneeFilter::Any => write!(f, "any"),
            AssigneeFilter::Me => write!(f, "me"),
            AssigneeFilter::Unassigned => write!(f, "unassigned"),
            AssigneeFilter::Account(id) => write!(f, "{}", id),
        }
    }
}

/// Server-side sort clause for the search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
    UpdatedDesc,
    UpdatedAsc,
}

impl SortOrder {
    /// The JQL `ORDER BY` rendering of this sort.
    pub fn jql(self) -> &'static str {
        match self {
            SortOrder::CreatedDesc => "created DESC",
            SortOrder::CreatedAsc => "created ASC",
            SortOrder::UpdatedDesc => "updated DESC",
            SortOrder::UpdatedAsc => "updated ASC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = GantryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "created-desc" => Ok(SortOrder::CreatedDesc),
            "created-asc" => Ok(SortOrder::CreatedAsc),
            "updated-desc" => Ok(SortOrder::UpdatedDesc),
            "updated-asc" => Ok(SortOrder::UpdatedAsc),
            _ => Err(GantryError::Config(format!(
                "unknown sort order '{}', expected one of: {}",
                s,
                VALID_SORT_ORDERS.join(", ")
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::CreatedDesc => "created-desc",
            SortOrder::CreatedAsc => "created-asc",
            SortOrder::UpdatedDesc => "updated-desc",
            SortOrder::UpdatedAsc => "updated-asc",
        };
        write!(f, "{}", s)
    }
}

/// Page-size policy: a fixed single page, or follow the continuation
/// token until the result set is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Fixed(u32),
    All,
}

impl Default for PageLimit {
    fn default() -> Self {
        PageLimit::Fixed(50)
    }
}

impl FromStr for PageLimit {
    type Err = GantryError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(PageLimit::All);
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(PageLimit::Fixed(n)),
            _ => Err(GantryError::Config(format!(
                "invalid page size '{}', expected a positive number or 'all'",
                s
            ))),
        }
    }
}

impl fmt::Display for PageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLimit::Fixed(n) => write!(f, "{}", n),
            PageLimit::All => write!(f, "all"),
        }
    }
}

/// The full search filter set. One value of this type describes one
/// logical query; any change to it restarts accumulation from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub project: String,
    pub text: String,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub request_types: Vec<String>,
    /// Display name of the request-type field, as detected per site.
    pub request_type_field: String,
    pub assignee: AssigneeFilter,
    /// Inclusive creation-date bounds, `YYYY-MM-DD`.
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub order_by: SortOrder,
    pub limit: PageLimit,
}

impl Default for Filters {
    fn default() -> Self {
        Filters {
            project: String::new(),
            text: String::new(),
            statuses: Vec::new(),
            priorities: Vec::new(),
            request_types: Vec::new(),
            request_type_field: REQUEST_TYPE_FIELD_DEFAULT.to_string(),
            assignee: AssigneeFilter::Any,
            created_from: None,
            created_to: None,
            order_by: SortOrder::CreatedDesc,
            limit: PageLimit::default(),
        }
    }
}

impl Filters {
    /// Whether the fetcher should follow continuation tokens to the end.
    /// True for the explicit fetch-all policy and for free-text searches,
    /// which filter client-side across the full result set.
    pub fn wants_all_pages(&self) -> bool {
        matches!(self.limit, PageLimit::All) || !self.text.trim().is_empty()
    }
}
