//! Error types shared by the cache, resolver and index builder

use thiserror::Error;

/// Errors produced by the gitpix core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value (cache capacity, repository identity, ...)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A call to the remote repository failed
    #[error("upstream request failed{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Response body or transport error text
        message: String,
    },

    /// Snapshot storage failed
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The file cannot be stored as an image
    #[error("unsupported image file: {0}")]
    UnsupportedFile(String),
}

impl Error {
    /// Build an upstream error from an HTTP status
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status of an upstream failure
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Suggested next step for failures the user can fix
    pub const fn hint(&self) -> Option<&'static str> {
        match self.status_code() {
            Some(401) => Some("the access token was rejected; run: gitpix auth"),
            Some(403) => Some("the token lacks permission or the rate limit was hit"),
            Some(404) => Some("repository not found; check: gitpix config"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Result alias for the gitpix core
pub type Result<T, E = Error> = std::result::Result<T, E>;
