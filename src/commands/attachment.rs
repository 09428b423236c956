//! The `attachment` command: download one attachment's content.

use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::jira::{JiraClient, SearchApi};

pub async fn cmd_attachment(id: &str, output: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let client = JiraClient::from_config(&config)?;

    let content = client.attachment_content(id).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(format!("attachment-{}", id)));
    fs::write(&path, &content.bytes)?;

    println!(
        "wrote {} bytes ({}) to {}",
        content.bytes.len(),
        content.content_type,
        path.display()
    );
    Ok(())
}
