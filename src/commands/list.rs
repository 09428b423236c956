//! The `list` command: one full query through the whole pipeline.
//!
//! Builds the JQL, runs the paginated fetch under a session, commits the
//! result to the store, refreshes the cache slot, and prints the derived
//! page.

use owo_colors::OwoColorize;

use crate::cache::IssueCache;
use crate::config::Config;
use crate::display::issue_table;
use crate::error::{GantryError, Result};
use crate::jira::JiraClient;
use crate::jql::build_jql;
use crate::search::fetch_issues;
use crate::session::SearchSession;
use crate::store::IssueStore;
use crate::types::{Filters, PageLimit};
use crate::view::{ViewState, derive_page};

pub struct ListOptions {
    pub filters: Filters,
    pub view: ViewState,
    pub json: bool,
}

pub async fn cmd_list(mut opts: ListOptions) -> Result<()> {
    let config = Config::load()?;
    let client = JiraClient::from_config(&config)?;
    let store = IssueStore::new();
    let cache = IssueCache::new()?;
    let mut session = SearchSession::new();

    if opts.filters.project.is_empty() {
        opts.filters.project = config.project_key(None)?;
    }

    let jql = build_jql(&opts.filters);
    tracing::debug!(%jql, "searching");

    let cancel = session.filter_changed();
    session.debounce_elapsed();
    let ticket = store.begin_query();

    let limit = if opts.filters.wants_all_pages() {
        PageLimit::All
    } else {
        opts.filters.limit
    };

    let show_progress = matches!(limit, PageLimit::All) && !opts.json;
    let result = fetch_issues(&client, &jql, limit, &cancel, |loaded, more| {
        session.page_received(loaded, more);
        if show_progress && more {
            eprintln!("fetched {} issues\u{2026}", loaded);
        }
    })
    .await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(GantryError::Cancelled) => return Ok(()),
        Err(e) => {
            session.error();
            return Err(e);
        }
    };

    if !store.commit(&ticket, outcome.issues) {
        // A newer query owns the store; this result is stale.
        return Ok(());
    }

    let issues = store.snapshot();
    if let Err(e) = cache.store(&issues) {
        tracing::warn!(error = %e, "could not refresh the issue cache");
    }

    if outcome.truncated {
        eprintln!(
            "{}",
            format!(
                "warning: stopped after {} pages; results are incomplete, narrow the filters",
                outcome.pages
            )
            .yellow()
        );
    }

    let page = derive_page(&issues, &opts.view);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&page.issues)?);
        return Ok(());
    }

    if page.issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    println!("{}", issue_table(&page.issues));
    println!(
        "page {} of {} \u{00b7} {} matching \u{00b7} {} fetched",
        page.page,
        page.total_pages,
        page.total_matching,
        issues.len()
    );

    Ok(())
}
