//! Error types for vidgrab

use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, one per failure family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // User errors
    InvalidRequest,
    InvalidConfig,

    // External tool errors
    DownloadFailed,
    MissingDependency,

    // System errors
    FileMissing,
    FileError,
}

/// Main error type for vidgrab
#[derive(Error, Debug)]
pub enum VidgrabError {
    /// Malformed or incomplete user input. Recoverable by asking again.
    #[error("Invalid {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    /// The downloader or transcoder reported a failure.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// The downloader reported success but the output is not on disk.
    #[error("Downloaded file not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("Missing dependency: {0}. Please install it.")]
    MissingDependency(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl VidgrabError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            field,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::DownloadFailed(_) => ErrorCode::DownloadFailed,
            Self::FileMissing(_) => ErrorCode::FileMissing,
            Self::MissingDependency(_) => ErrorCode::MissingDependency,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::File(_) => ErrorCode::FileError,
            Self::Json(_) => ErrorCode::InvalidConfig,
            Self::Prompt(_) => ErrorCode::FileError,
        }
    }
}

pub type Result<T> = std::result::Result<T, VidgrabError>;
