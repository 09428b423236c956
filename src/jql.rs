//! JQL query construction from a structured filter set.
//!
//! The builder is a pure function: one `Filters` value in, one query
//! string out, always ending in an explicit `ORDER BY` clause. All user
//! text passes through [`quote`], so embedded quotes and backslashes
//! cannot break clause boundaries.

use crate::types::{AssigneeFilter, Filters};

/// Build the JQL string for a filter set.
///
/// Each non-empty filter field contributes exactly one clause; clauses
/// are joined with `AND`.
pub fn build_jql(filters: &Filters) -> String {
    let mut clauses: Vec<String> = Vec::new();

    if !filters.project.is_empty() {
        clauses.push(format!("project = {}", quote(&filters.project)));
    }

    let text = filters.text.trim();
    if !text.is_empty() {
        clauses.push(format!("text ~ {}", quote(text)));
    }

    if !filters.statuses.is_empty() {
        clauses.push(format!("status IN ({})", quote_list(&filters.statuses)));
    }

    if !filters.priorities.is_empty() {
        clauses.push(format!("priority IN ({})", quote_list(&filters.priorities)));
    }

    if !filters.request_types.is_empty() {
        clauses.push(format!(
            "{} IN ({})",
            quote(&filters.request_type_field),
            quote_list(&filters.request_types)
        ));
    }

    match &filters.assignee {
        AssigneeFilter::Any => {}
        AssigneeFilter::Me => clauses.push("assignee = currentUser()".to_string()),
        AssigneeFilter::Unassigned => clauses.push("assignee IS EMPTY".to_string()),
        AssigneeFilter::Account(id) => clauses.push(format!("assignee = {}", quote(id))),
    }

    if let Some(from) = &filters.created_from {
        clauses.push(format!("created >= {}", quote(from)));
    }
    if let Some(to) = &filters.created_to {
        clauses.push(format!("created <= {}", quote(to)));
    }

    let order = format!("ORDER BY {}", filters.order_by.jql());
    if clauses.is_empty() {
        order
    } else {
        format!("{} {}", clauses.join(" AND "), order)
    }
}

/// Quote a value for JQL, escaping embedded `"` and `\`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| quote(v))
        .collect::<Vec<_>>()
        .join(", ")
}
