//! Normalization of raw Jira issue JSON into the stable [`Issue`] shape.
//!
//! Total over missing optional fields: absent users collapse to `None`,
//! absent arrays to empty, absent counters to zero. Only a record with
//! no id or key is rejected.

use serde_json::Value;

use crate::error::{GantryError, Result};
use crate::types::{Attachment, Issue, UserRef, Worklog};

/// Custom field carrying the service-desk request type.
pub const REQUEST_TYPE_FIELD_ID: &str = "customfield_10010";
/// Custom field carrying the multi-value mechanics selection.
pub const MECHANICS_FIELD_ID: &str = "customfield_10267";

/// Map one raw search-result record to an [`Issue`].
pub fn normalize_issue(raw: &Value) -> Result<Issue> {
    let id = required_str(raw, "id")?;
    let key = required_str(raw, "key")?;

    let empty = Value::Null;
    let f = raw.get("fields").unwrap_or(&empty);

    let timetracking = f.get("timetracking");
    let time_spent_seconds = timetracking
        .and_then(|t| t.get("timeSpentSeconds"))
        .and_then(Value::as_u64)
        .or_else(|| f.get("timespent").and_then(Value::as_u64))
        .unwrap_or(0);
    let remaining_estimate_seconds = timetracking
        .and_then(|t| t.get("remainingEstimateSeconds"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let request_type_raw = f.get(REQUEST_TYPE_FIELD_ID);
    let mechanics_raw = f.get(MECHANICS_FIELD_ID).cloned().unwrap_or(Value::Null);

    Ok(Issue {
        id,
        key,
        summary: str_field(f, "summary"),
        status: f
            .get("status")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        status_category: f
            .get("status")
            .and_then(|s| s.get("statusCategory"))
            .and_then(|c| c.get("key"))
            .and_then(Value::as_str)
            .map(str::to_string),
        priority: f
            .get("priority")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        assignee: f.get("assignee").and_then(user_ref),
        reporter: f.get("reporter").and_then(user_ref),
        created: str_field(f, "created"),
        updated: str_field(f, "updated"),
        resolved: f
            .get("resolutiondate")
            .and_then(Value::as_str)
            .map(str::to_string),
        time_spent_seconds,
        remaining_estimate_seconds,
        issue_type: f
            .get("issuetype")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        project: f
            .get("project")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        request_type: request_type_raw
            .and_then(|r| r.get("requestType"))
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        request_url: request_type_raw
            .and_then(|r| r.get("_links"))
            .and_then(|l| l.get("agent"))
            .and_then(Value::as_str)
            .map(str::to_string),
        description: f.get("description").and_then(adf_to_text),
        mechanics: mechanics_names(&mechanics_raw),
        mechanics_raw,
        worklogs: worklogs(f),
        attachments: attachments(f),
    })
}

/// Flatten an Atlassian Document Format tree into plain text.
///
/// Good enough for short descriptions: paragraphs and headings end a
/// line, list items get a bullet prefix, everything else just recurses.
pub fn adf_to_text(doc: &Value) -> Option<String> {
    if !doc.is_object() {
        return None;
    }

    let mut out = String::new();
    walk_children(doc, &mut out);
    let text = collapse_blank_runs(&out).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn walk(node: &Value, out: &mut String) {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(t) = node.get("text").and_then(Value::as_str) {
                out.push_str(t);
            }
        }
        Some("paragraph") | Some("heading") => {
            walk_children(node, out);
            out.push('\n');
        }
        Some("hardBreak") => out.push('\n'),
        Some("listItem") => {
            out.push_str("\u{2022} ");
            walk_children(node, out);
            out.push('\n');
        }
        _ => walk_children(node, out),
    }
}

fn walk_children(node: &Value, out: &mut String) {
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            walk(child, out);
        }
    }
}

fn collapse_blank_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut newlines = 0;
    for c in s.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}

/// Extract display names from the mechanics field, which upstream may
/// send as an option array, a single option object, or a scalar.
pub fn mechanics_names(val: &Value) -> Vec<String> {
    fn label(v: &Value) -> Option<String> {
        for key in ["displayName", "name", "value", "label", "key"] {
            if let Some(s) = v.get(key).and_then(Value::as_str)
                && !s.is_empty()
            {
                return Some(s.to_string());
            }
        }
        None
    }

    match val {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(label).collect(),
        Value::Object(_) => label(val).into_iter().collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}

fn user_ref(val: &Value) -> Option<UserRef> {
    let obj = val.as_object()?;
    Some(UserRef {
        account_id: obj
            .get("accountId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        display_name: obj
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        avatar: obj
            .get("avatarUrls")
            .and_then(|a| a.get("24x24"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn worklogs(fields: &Value) -> Vec<Worklog> {
    fields
        .get("worklog")
        .and_then(|w| w.get("worklogs"))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|w| Worklog {
                    id: str_field(w, "id"),
                    author: w.get("author").and_then(user_ref),
                    started: str_field(w, "started"),
                    time_spent_seconds: w
                        .get("timeSpentSeconds")
                        .and_then(Value::as_u64)
                        .unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn attachments(fields: &Value) -> Vec<Attachment> {
    fields
        .get("attachment")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|a| Attachment {
                    id: str_field(a, "id"),
                    filename: str_field(a, "filename"),
                    mime_type: a
                        .get("mimeType")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    size: a.get("size").and_then(Value::as_u64),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(val: &Value, key: &str) -> String {
    val.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn required_str(val: &Value, key: &str) -> Result<String> {
    val.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GantryError::MalformedResponse(format!("issue record missing '{}'", key)))
}
