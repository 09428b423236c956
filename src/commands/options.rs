//! The `options` command: show the filter choices a project offers.

use owo_colors::OwoColorize;

use crate::config::Config;
use crate::error::Result;
use crate::jira::{JiraClient, SearchApi};

pub async fn cmd_options(project: Option<&str>, json: bool) -> Result<()> {
    let config = Config::load()?;
    let project_key = config.project_key(project)?;
    let client = JiraClient::from_config(&config)?;

    let options = client.project_options(&project_key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    println!("{} {}", "Project:".bold(), options.project_key);
    println!(
        "{} {}",
        "Request-type field:".bold(),
        options.request_type_field
    );

    print_section("Statuses", &options.statuses);
    print_section("Priorities", &options.priorities);
    print_section("Request types", &options.request_types);

    println!("\n{}", "Assignees:".bold());
    if options.assignees.is_empty() {
        println!("  (none)");
    }
    for user in &options.assignees {
        println!("  {}  {}", user.account_id, user.display_name);
    }

    Ok(())
}

fn print_section(title: &str, values: &[String]) {
    println!("\n{}", format!("{}:", title).bold());
    if values.is_empty() {
        println!("  (none)");
    }
    for value in values {
        println!("  {}", value);
    }
}
