//! Jira Cloud REST client.
//!
//! The only component that sees credentials. The API token is held in a
//! `SecretBox` and attached per request as Basic auth; reqwest marks the
//! header sensitive so it stays out of request logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header;
use secrecy::{ExposeSecret, SecretBox};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{GantryError, Result};
use crate::types::{REQUEST_TYPE_FIELD_DEFAULT, UserRef};

use super::{AttachmentContent, ProjectOptions, SearchApi, SearchPage, normalize_issue};

/// Fields requested from the search endpoint; everything the normalizer
/// knows how to map.
const SEARCH_FIELDS: &[&str] = &[
    "summary",
    "status",
    "priority",
    "assignee",
    "reporter",
    "created",
    "updated",
    "resolutiondate",
    "timetracking",
    "timespent",
    "worklog",
    "issuetype",
    "project",
    "description",
    "attachment",
    super::normalize::REQUEST_TYPE_FIELD_ID,
    super::normalize::MECHANICS_FIELD_ID,
];

const ASSIGNABLE_USER_PAGE: u32 = 50;
const ASSIGNABLE_USER_CAP: usize = 500;
const SERVICE_DESK_PAGE: u32 = 50;
const REQUEST_TYPE_PAGE: u32 = 100;

pub struct JiraClient {
    http: Client,
    base: Url,
    email: String,
    api_token: SecretBox<String>,
}

impl JiraClient {
    /// Create a client from resolved configuration.
    ///
    /// Configures the HTTP client with 30s connect timeout and 60s total
    /// timeout; there is no additional timeout layer anywhere else.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            GantryError::Config(format!("invalid Jira base URL '{}': {}", config.base_url, e))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base,
            email: config.email.clone(),
            api_token: SecretBox::new(Box::new(config.api_token.clone())),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| GantryError::Config(format!("invalid API path '{}': {}", path, e)))
    }

    /// GET a JSON document. Non-2xx responses surface status and body;
    /// an unparseable body on a 2xx is a malformed response.
    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.email, Some(self.api_token.expose_secret()))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GantryError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| GantryError::MalformedResponse(e.to_string()))
    }

    async fn fetch_project_statuses(&self, project_key: &str) -> Result<Vec<String>> {
        let url = self.url(&format!("/rest/api/3/project/{}/statuses", project_key))?;
        let body = self.get_json(url).await?;

        let mut names = std::collections::BTreeSet::new();
        for issue_type in body.as_array().map(Vec::as_slice).unwrap_or_default() {
            for status in issue_type
                .get("statuses")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
            {
                if let Some(name) = status.get("name").and_then(Value::as_str) {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    async fn fetch_priorities(&self) -> Result<Vec<String>> {
        let body = self.get_json(self.url("/rest/api/3/priority")?).await?;

        let mut names = std::collections::BTreeSet::new();
        for priority in body.as_array().map(Vec::as_slice).unwrap_or_default() {
            if let Some(name) = priority.get("name").and_then(Value::as_str)
                && !name.is_empty()
            {
                names.insert(name.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Page through assignable users for the project, stopping at a soft
    /// cap, then dedupe by account id and sort by display name.
    async fn fetch_assignable_users(&self, project_key: &str) -> Result<Vec<UserRef>> {
        let mut collected: Vec<UserRef> = Vec::new();
        let mut start_at: u32 = 0;

        while collected.len() < ASSIGNABLE_USER_CAP {
            let mut url = self.url("/rest/api/3/user/assignable/search")?;
            url.query_pairs_mut()
                .append_pair("project", project_key)
                .append_pair("startAt", &start_at.to_string())
                .append_pair("maxResults", &ASSIGNABLE_USER_PAGE.to_string());

            let body = self.get_json(url).await?;
            let users = body.as_array().map(Vec::as_slice).unwrap_or_default();
            if users.is_empty() {
                break;
            }

            for user in users {
                collected.push(UserRef {
                    account_id: user
                        .get("accountId")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    display_name: user
                        .get("displayName")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    avatar: user
                        .get("avatarUrls")
                        .and_then(|a| a.get("24x24"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }

            let page_len = users.len();
            start_at += page_len as u32;
            if page_len < ASSIGNABLE_USER_PAGE as usize {
                break;
            }
        }

        let mut by_id = std::collections::BTreeMap::new();
        for user in collected {
            if !user.account_id.is_empty() {
                by_id.insert(user.account_id.clone(), user);
            }
        }
        let mut users: Vec<UserRef> = by_id.into_values().collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(users)
    }

    /// Find the service desk backing this project, if any.
    async fn find_service_desk_id(&self, project_id: &str) -> Result<Option<String>> {
        let mut start: u32 = 0;
        loop {
            let mut url = self.url("/rest/servicedeskapi/servicedesk")?;
            url.query_pairs_mut()
                .append_pair("start", &start.to_string())
                .append_pair("limit", &SERVICE_DESK_PAGE.to_string());

            let body = self.get_json(url).await?;
            let values = body
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for desk in values {
                if id_string(desk.get("projectId")).as_deref() == Some(project_id) {
                    return Ok(id_string(desk.get("id")));
                }
            }

            let last_page = body
                .get("isLastPage")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if last_page || values.is_empty() {
                return Ok(None);
            }
            start += SERVICE_DESK_PAGE;
        }
    }

    async fn fetch_request_types(&self, service_desk_id: &str) -> Result<Vec<String>> {
        let mut names = std::collections::BTreeSet::new();
        let mut start: u32 = 0;
        loop {
            let mut url = self.url(&format!(
                "/rest/servicedeskapi/servicedesk/{}/requesttype",
                service_desk_id
            ))?;
            url.query_pairs_mut()
                .append_pair("start", &start.to_string())
                .append_pair("limit", &REQUEST_TYPE_PAGE.to_string());

            let body = self.get_json(url).await?;
            let values = body
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for value in values {
                if let Some(name) = value.get("name").and_then(Value::as_str)
                    && !name.is_empty()
                {
                    names.insert(name.to_string());
                }
            }

            let last_page = body
                .get("isLastPage")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if last_page || values.is_empty() {
                return Ok(names.into_iter().collect());
            }
            start += REQUEST_TYPE_PAGE;
        }
    }

    /// Detect the display name of the request-type JQL field. Jira Cloud
    /// usually calls it "Request Type", but renamed and legacy sites
    /// differ, so fall back through fuzzier matches before defaulting.
    async fn detect_request_type_field(&self) -> Result<String> {
        let body = self.get_json(self.url("/rest/api/3/field")?).await?;
        let fields = body.as_array().map(Vec::as_slice).unwrap_or_default();

        fn name_of(f: &Value) -> &str {
            f.get("name").and_then(Value::as_str).unwrap_or_default()
        }

        for exact in ["Request Type", "Customer Request Type"] {
            if fields.iter().any(|f| name_of(f) == exact) {
                return Ok(exact.to_string());
            }
        }

        if let Some(field) = fields.iter().find(|f| {
            let name = name_of(f).to_lowercase();
            (name.contains("request type") || name.contains("requesttype"))
                && !name.contains("participants")
        }) {
            return Ok(name_of(field).to_string());
        }

        if let Some(field) = fields.iter().find(|f| {
            let custom = f
                .get("schema")
                .and_then(|s| s.get("custom"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();
            custom.contains("servicedesk") && custom.contains("request")
        }) {
            return Ok(name_of(field).to_string());
        }

        Ok(REQUEST_TYPE_FIELD_DEFAULT.to_string())
    }
}

#[async_trait]
impl SearchApi for JiraClient {
    async fn search_page(
        &self,
        jql: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let mut url = self.url("/rest/api/3/search/jql")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("jql", jql)
                .append_pair("maxResults", &max_results.to_string())
                .append_pair("fields", &SEARCH_FIELDS.join(","))
                .append_pair(
                    "expand",
                    &format!("{}.requestType", super::normalize::REQUEST_TYPE_FIELD_ID),
                );
            if let Some(token) = page_token {
                pairs.append_pair("nextPageToken", token);
            }
        }

        let body = self.get_json(url).await?;

        let issues = body
            .get("issues")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(normalize_issue)
            .collect::<Result<Vec<_>>>()?;

        let next_page_token = body
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let is_last = body
            .get("isLast")
            .and_then(Value::as_bool)
            .unwrap_or(next_page_token.is_none());

        Ok(SearchPage {
            issues,
            next_page_token,
            is_last,
        })
    }

    async fn attachment_content(&self, id: &str) -> Result<AttachmentContent> {
        let url = self.url(&format!("/rest/api/3/attachment/content/{}", id))?;
        let response = self
            .http
            .get(url)
            .basic_auth(&self.email, Some(self.api_token.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GantryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(AttachmentContent {
            bytes,
            content_type,
        })
    }

    /// Compose the option lists for a project. Only the initial project
    /// lookup is fatal; each option source degrades to empty when its
    /// endpoint fails, so one broken API never blanks the whole form.
    async fn project_options(&self, project_key: &str) -> Result<ProjectOptions> {
        let project = self
            .get_json(self.url(&format!("/rest/api/3/project/{}", project_key))?)
            .await?;
        let project_id = id_string(project.get("id")).unwrap_or_default();

        let statuses = self
            .fetch_project_statuses(project_key)
            .await
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "status options unavailable");
                Vec::new()
            });

        let priorities = self.fetch_priorities().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "priority options unavailable");
            Vec::new()
        });

        let assignees = self
            .fetch_assignable_users(project_key)
            .await
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "assignable users unavailable");
                Vec::new()
            });

        let request_types = match self.find_service_desk_id(&project_id).await {
            Ok(Some(desk_id)) => self.fetch_request_types(&desk_id).await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "request types unavailable");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "service desk lookup failed");
                Vec::new()
            }
        };

        let request_type_field = self
            .detect_request_type_field()
            .await
            .unwrap_or_else(|_| REQUEST_TYPE_FIELD_DEFAULT.to_string());

        Ok(ProjectOptions {
            project_key: project_key.to_string(),
            request_type_field,
            statuses,
            priorities,
            assignees,
            request_types,
        })
    }
}

/// Jira mixes string and numeric ids across APIs; normalize either to a
/// string for comparison.
fn id_string(val: Option<&Value>) -> Option<String> {
    match val? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
