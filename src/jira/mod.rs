//! Jira Cloud integration: the API seam, its reqwest implementation,
//! and normalization of upstream records into [`Issue`].
//!
//! The rest of the crate depends only on the [`SearchApi`] trait and the
//! documented response shapes, never on the concrete client, so the
//! fetch pipeline is testable against mocks.

pub mod client;
pub mod normalize;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Issue, UserRef};

pub use client::JiraClient;
pub use normalize::{adf_to_text, mechanics_names, normalize_issue};

/// One page of search results, already normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    /// Opaque continuation token for the next page, if any.
    pub next_page_token: Option<String>,
    /// Server signal that this is the final page.
    pub is_last: bool,
}

/// Raw bytes of an attachment plus its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Filter choices available for a project, used to populate selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectOptions {
    pub project_key: String,
    /// Detected display name of the request-type JQL field.
    pub request_type_field: String,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub assignees: Vec<UserRef>,
    pub request_types: Vec<String>,
}

/// The tracker search surface the core depends on.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetch one page of issues for a JQL query. `page_token` carries the
    /// continuation token from the previous page, absent on the first.
    async fn search_page(
        &self,
        jql: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<SearchPage>;

    /// Fetch the binary content of an attachment by id.
    async fn attachment_content(&self, id: &str) -> Result<AttachmentContent>;

    /// Fetch the available filter options for a project.
    async fn project_options(&self, project_key: &str) -> Result<ProjectOptions>;
}
