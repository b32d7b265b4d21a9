//! Error types for separation jobs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for separation operations.
pub type SeparatorResult<T> = Result<T, SeparatorError>;

/// Errors that can occur while driving a separation container.
#[derive(Debug, Error)]
pub enum SeparatorError {
    /// Docker Engine API call failed (list/pull/create/start).
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// The image build log carried an error message.
    #[error("Image build failed for {image}: {message}")]
    ImageBuildFailed { image: String, message: String },

    #[error("Build context not found: {0}")]
    BuildContextNotFound(PathBuf),

    /// Error observed on the wait stream while the container ran, distinct
    /// from errors raised at creation or start.
    #[error("Container wait failed: {message}")]
    ContainerWait { message: String },

    #[error("Container exited with status {status_code}")]
    ContainerExited { status_code: i64 },

    #[error("Invalid input path: {0}")]
    InvalidInput(PathBuf),

    #[error("Separation output not found at {0}")]
    OutputMissing(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SeparatorError {
    /// Create a wait-stream failure error.
    pub fn container_wait(message: impl Into<String>) -> Self {
        Self::ContainerWait {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
