//! Incremental search: the paginated fetcher and its cancellation token.
//!
//! Pages of one logical query are fetched strictly sequentially, each
//! request carrying the continuation token from the previous response.
//! Accumulation is all-or-nothing: any page error discards everything
//! fetched so far, and a cancelled fetch commits nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GantryError, Result};
use crate::jira::SearchApi;
use crate::types::{Issue, PageLimit};

/// Safety cap on pages followed per logical query.
pub const MAX_PAGES: usize = 50;

/// Page size used when following tokens to exhaustion.
pub const FETCH_ALL_PAGE_SIZE: u32 = 100;

/// Cooperative cancellation flag shared between a fetch and whoever
/// supersedes it. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a completed accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub issues: Vec<Issue>,
    /// Number of pages requested.
    pub pages: usize,
    /// True when the page cap cut the result short of exhaustion.
    pub truncated: bool,
}

/// Fetch all issues matching `jql` under the given page-size policy.
///
/// `on_page` is invoked after every received page with the accumulated
/// count and whether another page will be requested.
///
/// # Errors
///
/// Returns [`GantryError::Cancelled`] when the token fires, and any page
/// error verbatim; in both cases no partial result escapes.
pub async fn fetch_issues(
    api: &dyn SearchApi,
    jql: &str,
    limit: PageLimit,
    cancel: &CancelToken,
    mut on_page: impl FnMut(usize, bool),
) -> Result<FetchOutcome> {
    let follow_pages = matches!(limit, PageLimit::All);
    let page_size = match limit {
        PageLimit::All => FETCH_ALL_PAGE_SIZE,
        PageLimit::Fixed(n) => n,
    };

    let mut issues: Vec<Issue> = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(GantryError::Cancelled);
        }

        let page = api.search_page(jql, page_size, token.as_deref()).await?;

        if cancel.is_cancelled() {
            return Err(GantryError::Cancelled);
        }

        issues.extend(page.issues);
        pages += 1;

        let exhausted = page.is_last || page.next_page_token.is_none();
        let capped = pages >= MAX_PAGES;
        let continuing = follow_pages && !exhausted && !capped;
        tracing::debug!(pages, loaded = issues.len(), continuing, "page received");
        on_page(issues.len(), continuing);

        if continuing {
            token = page.next_page_token;
            continue;
        }

        let truncated = follow_pages && !exhausted && capped;
        if truncated {
            tracing::warn!(
                pages,
                loaded = issues.len(),
                "page cap reached, result truncated"
            );
        }
        return Ok(FetchOutcome {
            issues,
            pages,
            truncated,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::jira::{AttachmentContent, ProjectOptions, SearchPage};

    struct MockApi {
        pages: Mutex<VecDeque<Result<SearchPage>>>,
        calls: AtomicUsize,
        /// Cancel this token after serving the given number of pages,
        /// simulating a newer query superseding the fetch mid-flight.
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl MockApi {
        fn new(pages: Vec<Result<SearchPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().collect()),
                calls: AtomicUsize::new(0),
                cancel_after: None,
            }
        }

        fn cancelling_after(mut self, pages: usize, token: CancelToken) -> Self {
            self.cancel_after = Some((pages, token));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchApi for MockApi {
        async fn search_page(
            &self,
            _jql: &str,
            _max_results: u32,
            _page_token: Option<&str>,
        ) -> Result<SearchPage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, token)) = &self.cancel_after
                && call >= *after
            {
                token.cancel();
            }
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SearchPage::default()))
        }

        async fn attachment_content(&self, _id: &str) -> Result<AttachmentContent> {
            unimplemented!("not used by fetcher tests")
        }

        async fn project_options(&self, _project_key: &str) -> Result<ProjectOptions> {
            unimplemented!("not used by fetcher tests")
        }
    }

    fn issue(key: &str) -> Issue {
        Issue {
            key: key.to_string(),
            id: key.to_string(),
            ..Issue::default()
        }
    }

    fn page(keys: &[&str], token: Option<&str>, is_last: bool) -> SearchPage {
        SearchPage {
            issues: keys.iter().map(|k| issue(k)).collect(),
            next_page_token: token.map(str::to_string),
            is_last,
        }
    }

    #[tokio::test]
    async fn fetch_all_concatenates_pages_and_stops_at_last() {
        let api = MockApi::new(vec![
            Ok(page(&["a", "b"], Some("t1"), false)),
            Ok(page(&["c"], None, true)),
        ]);
        let cancel = CancelToken::new();

        let outcome = fetch_issues(&api, "ORDER BY created DESC", PageLimit::All, &cancel, |_, _| {})
            .await
            .unwrap();

        let keys: Vec<&str> = outcome.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(outcome.pages, 2);
        assert!(!outcome.truncated);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn fixed_limit_requests_exactly_one_page() {
        let api = MockApi::new(vec![Ok(page(&["a", "b"], Some("t1"), false))]);
        let cancel = CancelToken::new();

        let outcome = fetch_issues(&api, "", PageLimit::Fixed(2), &cancel, |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(api.calls(), 1);
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn page_error_discards_all_partial_results() {
        let api = MockApi::new(vec![
            Ok(page(&["a", "b"], Some("t1"), false)),
            Err(GantryError::Api {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            Ok(page(&["c"], None, true)),
        ]);
        let cancel = CancelToken::new();

        let result = fetch_issues(&api, "", PageLimit::All, &cancel, |_, _| {}).await;

        assert!(matches!(result, Err(GantryError::Api { status: 502, .. })));
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn pre_cancelled_token_fetches_nothing() {
        let api = MockApi::new(vec![Ok(page(&["a"], None, true))]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = fetch_issues(&api, "", PageLimit::All, &cancel, |_, _| {}).await;

        assert!(matches!(result, Err(GantryError::Cancelled)));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn superseded_fetch_is_cancelled_mid_flight() {
        let cancel = CancelToken::new();
        let api = MockApi::new(vec![
            Ok(page(&["a", "b"], Some("t1"), false)),
            Ok(page(&["c"], Some("t2"), false)),
        ])
        .cancelling_after(1, cancel.clone());

        let result = fetch_issues(&api, "", PageLimit::All, &cancel, |_, _| {}).await;

        assert!(matches!(result, Err(GantryError::Cancelled)));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn page_cap_truncates_and_says_so() {
        let mut pages: Vec<Result<SearchPage>> = Vec::new();
        for n in 0..MAX_PAGES + 5 {
            pages.push(Ok(page(&["x"], Some(&format!("t{}", n)), false)));
        }
        let api = MockApi::new(pages);
        let cancel = CancelToken::new();

        let outcome = fetch_issues(&api, "", PageLimit::All, &cancel, |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome.pages, MAX_PAGES);
        assert_eq!(outcome.issues.len(), MAX_PAGES);
        assert!(outcome.truncated);
        assert_eq!(api.calls(), MAX_PAGES);
    }

    #[tokio::test]
    async fn on_page_reports_progress_and_continuation() {
        let api = MockApi::new(vec![
            Ok(page(&["a", "b"], Some("t1"), false)),
            Ok(page(&["c"], None, true)),
        ]);
        let cancel = CancelToken::new();
        let mut reports: Vec<(usize, bool)> = Vec::new();

        fetch_issues(&api, "", PageLimit::All, &cancel, |loaded, more| {
            reports.push((loaded, more));
        })
        .await
        .unwrap();

        assert_eq!(reports, vec![(2, true), (3, false)]);
    }
}
