//! Configuration handling for the Jira connection.
//!
//! Settings come from environment variables first (`JIRA_BASE`,
//! `JIRA_EMAIL`, `JIRA_API_TOKEN`, `JIRA_PROJECT`), then from
//! `config.yaml` in the user config directory. Base URL, email, and
//! token are required; the default project key is optional and can be
//! overridden per command.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{GantryError, Result};

/// On-disk configuration file shape. Every field is optional; resolution
/// against the environment decides what is actually missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Resolved configuration with all required values present.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project: Option<String>,
}

impl Config {
    /// Path to the user config file, if a home directory can be found.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gantry").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Load configuration: environment variables take precedence over the
    /// config file.
    pub fn load() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path)?;
                serde_yaml_ng::from_str(&content)?
            }
            _ => FileConfig::default(),
        };
        Self::resolve(file)
    }

    /// Resolve a file config against the current environment.
    pub fn resolve(file: FileConfig) -> Result<Self> {
        let base_url = env_or("JIRA_BASE", file.base_url).ok_or_else(|| {
            GantryError::Config(
                "Jira base URL not configured. Set JIRA_BASE (e.g. https://example.atlassian.net) \
                 or base_url in config.yaml"
                    .to_string(),
            )
        })?;
        let email = env_or("JIRA_EMAIL", file.email).ok_or_else(|| {
            GantryError::Config(
                "Jira account email not configured. Set JIRA_EMAIL or email in config.yaml"
                    .to_string(),
            )
        })?;
        let api_token = env_or("JIRA_API_TOKEN", file.api_token).ok_or_else(|| {
            GantryError::Auth(
                "Jira API token not configured. Set JIRA_API_TOKEN or api_token in config.yaml"
                    .to_string(),
            )
        })?;
        let project = env_or("JIRA_PROJECT", file.project);

        Ok(Config {
            base_url,
            email,
            api_token,
            project,
        })
    }

    /// The project key to search, preferring an explicit override.
    pub fn project_key(&self, override_key: Option<&str>) -> Result<String> {
        override_key
            .map(str::to_string)
            .or_else(|| self.project.clone())
            .ok_or_else(|| {
                GantryError::Config(
                    "no project key given. Pass --project or set JIRA_PROJECT".to_string(),
                )
            })
    }
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => fallback.filter(|v| !v.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_parses_yaml() {
        let yaml = "base_url: https://example.atlassian.net\nemail: staff@example.com\napi_token: t0ken\nproject: MECH\n";
        let file: FileConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(file.base_url.as_deref(), Some("https://example.atlassian.net"));
        assert_eq!(file.project.as_deref(), Some("MECH"));
    }

    #[test]
    fn file_config_tolerates_missing_fields() {
        let file: FileConfig = serde_yaml_ng::from_str("email: staff@example.com\n").unwrap();
        assert!(file.base_url.is_none());
        assert!(file.api_token.is_none());
    }

    #[test]
    fn resolve_reports_missing_credentials() {
        // Only meaningful when the JIRA_* vars are not set in the test
        // environment; the file provides everything but the token.
        if env::var("JIRA_API_TOKEN").is_ok() {
            return;
        }
        let file = FileConfig {
            base_url: Some("https://example.atlassian.net".to_string()),
            email: Some("staff@example.com".to_string()),
            api_token: None,
            project: None,
        };
        let err = Config::resolve(file).unwrap_err();
        assert!(matches!(err, GantryError::Auth(_)));
    }

    #[test]
    fn project_key_prefers_override() {
        let config = Config {
            base_url: "https://example.atlassian.net".to_string(),
            email: "staff@example.com".to_string(),
            api_token: "t0ken".to_string(),
            project: Some("MECH".to_string()),
        };
        assert_eq!(config.project_key(Some("OPS")).unwrap(), "OPS");
        assert_eq!(config.project_key(None).unwrap(), "MECH");

        let without_default = Config {
            project: None,
            ..config
        };
        assert!(without_default.project_key(None).is_err());
    }
}
