use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown workspace: {0}")]
    UnknownWorkspace(String),

    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Not a relayed message: {0}")]
    OriginTag(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
