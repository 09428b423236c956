//! Terminal rendering: issue tables, the detail view, and the small
//! formatting helpers they share.

use jiff::Timestamp;
use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::types::Issue;

const SUMMARY_WIDTH: usize = 60;

/// Render worklog seconds as "2h 15m" / "45m".
pub fn fmt_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}m", ((seconds as f64) / 60.0).round() as u64);
    }
    let hours = seconds / 3600;
    let minutes = (((seconds % 3600) as f64) / 60.0).round() as u64;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Compact "HH:MM MM/DD" rendering of an ISO 8601 timestamp; falls back
/// to a prefix of the raw string when it does not parse.
pub fn short_datetime(iso: &str) -> String {
    match iso.parse::<Timestamp>() {
        Ok(ts) => ts.strftime("%H:%M %m/%d").to_string(),
        Err(_) => iso.chars().take(16).collect(),
    }
}

/// Truncate to `max` characters, ellipsis included.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "KEY")]
    key: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "PRIORITY")]
    priority: String,
    #[tabled(rename = "ASSIGNEE")]
    assignee: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "SUMMARY")]
    summary: String,
}

/// Render issues as a table for the list view.
pub fn issue_table(issues: &[Issue]) -> String {
    let rows: Vec<IssueRow> = issues
        .iter()
        .map(|i| IssueRow {
            key: i.key.clone(),
            status: i.status.clone(),
            priority: i.priority.clone().unwrap_or_else(|| "-".to_string()),
            assignee: i
                .assignee
                .as_ref()
                .map(|a| a.display_name.clone())
                .unwrap_or_else(|| "-".to_string()),
            created: short_datetime(&i.created),
            summary: truncate(&i.summary, SUMMARY_WIDTH),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

/// Color a status name by its upstream category.
fn colored_status(issue: &Issue) -> String {
    let category = issue.status_category.as_deref().unwrap_or_default();
    match category.to_lowercase().as_str() {
        "done" => issue.status.green().to_string(),
        "indeterminate" => issue.status.yellow().to_string(),
        _ => issue.status.clone(),
    }
}

/// Render the full detail view for one issue.
pub fn issue_detail(issue: &Issue) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}\n",
        issue.key.bold(),
        issue.summary.bold()
    ));
    out.push_str(&format!("Status:    {}\n", colored_status(issue)));
    if let Some(priority) = &issue.priority {
        out.push_str(&format!("Priority:  {}\n", priority));
    }
    if let Some(request_type) = &issue.request_type {
        out.push_str(&format!("Request:   {}\n", request_type));
    }
    out.push_str(&format!("Type:      {}\n", issue.issue_type));
    out.push_str(&format!("Project:   {}\n", issue.project));
    out.push_str(&format!("Created:   {}\n", short_datetime(&issue.created)));
    out.push_str(&format!("Updated:   {}\n", short_datetime(&issue.updated)));
    if let Some(resolved) = &issue.resolved {
        out.push_str(&format!("Resolved:  {}\n", short_datetime(resolved)));
    }

    let name = |user: &Option<crate::types::UserRef>| {
        user.as_ref()
            .map(|u| u.display_name.clone())
            .unwrap_or_else(|| "\u{2014}".to_string())
    };
    out.push_str(&format!("Reporter:  {}\n", name(&issue.reporter)));
    out.push_str(&format!("Assignee:  {}\n", name(&issue.assignee)));

    if issue.time_spent_seconds > 0 || issue.remaining_estimate_seconds > 0 {
        out.push_str(&format!(
            "Time:      {} spent, {} remaining\n",
            fmt_duration(issue.time_spent_seconds),
            fmt_duration(issue.remaining_estimate_seconds)
        ));
    }

    if !issue.mechanics.is_empty() {
        out.push_str(&format!("Mechanics: {}\n", issue.mechanics.join(", ")));
    }

    if let Some(description) = &issue.description {
        out.push_str(&format!("\n{}\n", description));
    }

    if !issue.worklogs.is_empty() {
        out.push_str(&format!("\nWorklogs ({}):\n", issue.worklogs.len()));
        for worklog in &issue.worklogs {
            out.push_str(&format!(
                "  {} {} by {}\n",
                short_datetime(&worklog.started),
                fmt_duration(worklog.time_spent_seconds),
                worklog
                    .author
                    .as_ref()
                    .map(|a| a.display_name.as_str())
                    .unwrap_or("\u{2014}")
            ));
        }
    }

    if !issue.attachments.is_empty() {
        out.push_str(&format!("\nAttachments ({}):\n", issue.attachments.len()));
        for attachment in &issue.attachments {
            out.push_str(&format!(
                "  [{}] {}{}\n",
                attachment.id,
                attachment.filename,
                attachment
                    .mime_type
                    .as_deref()
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default()
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attachment, UserRef};

    #[test]
    fn durations_render_like_the_dashboard() {
        assert_eq!(fmt_duration(0), "0m");
        assert_eq!(fmt_duration(45), "1m");
        assert_eq!(fmt_duration(20), "0m");
        assert_eq!(fmt_duration(900), "15m");
        assert_eq!(fmt_duration(3600), "1h 0m");
        assert_eq!(fmt_duration(5400), "1h 30m");
        assert_eq!(fmt_duration(3599), "60m");
    }

    #[test]
    fn short_datetime_formats_or_falls_back() {
        assert_eq!(short_datetime("2025-02-10T08:15:00Z"), "08:15 02/10");
        assert_eq!(short_datetime("not a date"), "not a date");
    }

    #[test]
    fn truncate_is_char_aware() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("a very long summary", 10), "a very lo\u{2026}");
        assert_eq!(truncate("ąžuolas pjūklas", 8), "ąžuolas\u{2026}");
    }

    #[test]
    fn table_contains_key_fields_and_placeholders() {
        let issues = vec![Issue {
            key: "MECH-7".to_string(),
            summary: "Dust extraction check".to_string(),
            status: "Pending".to_string(),
            created: "2025-02-10T08:15:00Z".to_string(),
            ..Issue::default()
        }];
        let table = issue_table(&issues);
        assert!(table.contains("MECH-7"));
        assert!(table.contains("Dust extraction check"));
        assert!(table.contains("Pending"));
        assert!(table.contains('-'));
    }

    #[test]
    fn detail_lists_worklogs_and_attachments() {
        let issue = Issue {
            key: "MECH-8".to_string(),
            summary: "Hydraulic lift service".to_string(),
            status: "Done".to_string(),
            status_category: Some("done".to_string()),
            assignee: Some(UserRef {
                account_id: "abc".to_string(),
                display_name: "Rūta J.".to_string(),
                avatar: None,
            }),
            time_spent_seconds: 5400,
            attachments: vec![Attachment {
                id: "900".to_string(),
                filename: "lift.pdf".to_string(),
                mime_type: Some("application/pdf".to_string()),
                size: None,
            }],
            ..Issue::default()
        };

        let detail = issue_detail(&issue);
        assert!(detail.contains("MECH-8"));
        assert!(detail.contains("Rūta J."));
        assert!(detail.contains("1h 30m"));
        assert!(detail.contains("lift.pdf"));
        assert!(detail.contains("application/pdf"));
    }
}
