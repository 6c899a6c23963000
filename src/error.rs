use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the repo-extract library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The repository URL was rejected before any clone was attempted.
    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The git executable could not be started.
    #[error("Unable to run '{program}': {message}. Is git installed and on PATH?")]
    GitUnavailable {
        /// Program that was invoked
        program: String,
        /// Error message
        message: String,
    },

    /// git ran but the clone failed.
    #[error(
        "Error cloning repository '{url}': {message}. \
        Please ensure the URL is correct and that you have the necessary permissions."
    )]
    CloneFailed {
        /// Repository URL
        url: String,
        /// Last meaningful line reported by git
        message: String,
    },

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        // tera keeps the useful part of parse errors in the source chain
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(&source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = std::error::Error::source(inner);
        }

        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Creates an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an error for a git executable that could not be spawned.
    #[must_use]
    pub fn git_unavailable(program: impl Into<String>, source: &std::io::Error) -> Self {
        Self::GitUnavailable {
            program: program.into(),
            message: source.to_string(),
        }
    }

    /// Creates a clone failure error.
    #[must_use]
    pub fn clone_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CloneFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Returns true if the repository could not be materialized.
    ///
    /// Covers rejected URLs, a missing git executable and failed clones.
    #[must_use]
    pub const fn is_materialization(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::GitUnavailable { .. } | Self::CloneFailed { .. }
        )
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
