use thiserror::Error;

#[derive(Error, Debug)]
pub enum GantryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("Jira API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed Jira response: {0}")]
    MalformedResponse(String),

    #[error("issue '{0}' not found")]
    IssueNotFound(String),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GantryError>;
