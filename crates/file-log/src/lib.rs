//! Append-only, asynchronous text log backed by a single file
//!
//! This crate provides a small leveled logger for client applications:
//! - One background worker executes every write, clear and read in the
//!   order it was submitted
//! - Writes and clears are fire-and-forget; reads resolve through a future
//!   or a completion callback
//! - An optional header line is written at the top of each fresh file
//! - Every write is synced to disk before the next operation starts

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod config;
mod entry;
mod error;
mod header;
mod logger;
mod paths;
mod sequencer;
mod store;

pub use config::{FileLogConfig, FileLogConfigBuilder, TimestampFormat};
pub use entry::Level;
pub use error::{Error, Result};
pub use header::{HeaderProvider, HeaderSource};
pub use logger::FileLog;
pub use paths::{DEFAULT_FILE_NAME, default_log_path};
