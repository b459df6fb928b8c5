//! Error types for the sequenced file log

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Result type for file log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while operating on the log file
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation on an open log file failed
    #[error("{0}: {1}")]
    Io(&'static str, #[source] io::Error),

    /// Failed to create the directory holding the log file
    #[error("failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to create the (empty) log file
    #[error("failed to create log file at {path}: {source}")]
    CreateFile {
        /// The log file path
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to open the log file for update
    #[error("failed to open log file at {path}: {source}")]
    Open {
        /// The log file path
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// The log file holds bytes that are not valid UTF-8
    #[error("log file at {path} is not valid UTF-8: {source}")]
    Decode {
        /// The log file path
        path: PathBuf,
        /// The underlying error
        source: FromUtf8Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The worker is gone, so the operation was never run
    #[error("log worker stopped: operation was not run")]
    WorkerStopped,
}
