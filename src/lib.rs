pub mod cache;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod jira;
pub mod jql;
pub mod search;
pub mod session;
pub mod store;
pub mod types;
pub mod view;

pub use cache::IssueCache;
pub use config::Config;
pub use error::{GantryError, Result};
pub use jira::{AttachmentContent, JiraClient, ProjectOptions, SearchApi, SearchPage};
pub use jql::build_jql;
pub use search::{CancelToken, FETCH_ALL_PAGE_SIZE, FetchOutcome, MAX_PAGES, fetch_issues};
pub use session::{SEARCH_DEBOUNCE, SearchPhase, SearchSession};
pub use store::{IssueStore, QueryTicket};
pub use types::{
    AssigneeFilter, Attachment, Filters, Issue, PageLimit, SortOrder, UserRef, Worklog,
};
pub use view::{ViewPage, ViewSort, ViewState, derive_page};
