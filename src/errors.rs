/*!
 * Error types for the submod application.
 *
 * Each stage of the pipeline has its own error type, defined with the
 * thiserror crate. Load and write errors are fatal for a run; provider and
 * reconciliation errors are contained to the batch that produced them.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a text-completion provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider answered but the answer carried no text
    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

impl ProviderError {
    /// Map a non-success HTTP status and body to the matching variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Map a transport-level reqwest failure
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised while loading a subtitle file
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file is missing or unreadable
    #[error("Failed to read subtitle file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid SRT
    #[error("Invalid subtitle syntax at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Errors raised while mapping a provider response back onto a batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationError {
    /// Not a single `<n>. <text>` line could be found in the response
    #[error("Response contains no numbered lines (expected {expected})")]
    NoNumberedLines { expected: usize },

    /// The recorded per-entry line counts disagree with the aligned lines
    #[error("Line count mismatch: entries account for {recorded} lines, {aligned} were aligned")]
    LineCountMismatch { recorded: usize, aligned: usize },
}

/// Errors raised while writing output artifacts
#[derive(Error, Debug)]
pub enum WriteError {
    /// An artifact could not be created or written
    #[error("Failed to write {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The intermediate artifact could not be read back
    #[error("Failed to read back {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The intermediate artifact could not be removed
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error loading the input subtitles
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error writing the output
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
