use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum JournalError {
    #[error("front matter field {0} is missing or invalid")]
    Validation(&'static str),

    #[error("document does not exist: {0}")]
    NotFound(String),

    #[error("invalid document name: {0:?}")]
    InvalidFilename(String),

    #[error("`{step}` failed ({status})")]
    ExternalTool { step: String, status: ToolStatus },

    #[error("wrong id or password")]
    Auth,

    #[error("site configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub(crate) enum ToolStatus {
    Exited(ExitStatus),
    Spawn(std::io::Error),
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Exited(status) => write!(f, "{status}"),
            ToolStatus::Spawn(e) => write!(f, "could not start: {e}"),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, JournalError>;
