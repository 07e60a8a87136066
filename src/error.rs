use thiserror::Error;

use crate::jenkins::Headers;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("HTTP {status} returned by {url}")]
    Transport {
        status: u16,
        url: String,
        body: String,
        headers: Headers,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Build #{0} does not exist")]
    BuildNotFound(String),

    #[error("Build was cancelled")]
    Cancelled,

    #[error("Something went wrong with the Jenkins API: {0}")]
    Protocol(String),

    #[error("Gave up waiting for {what} after {attempts} polls")]
    Timeout { what: &'static str, attempts: u32 },

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LauncherError {
    /// HTTP status of a failed request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
