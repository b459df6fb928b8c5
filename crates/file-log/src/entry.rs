//! Log levels and the single-line entry format

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::config::TimestampFormat;
use crate::error::Error;

/// Severity tag written in front of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Level {
    /// Debug-level messages
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl Level {
    /// The tag as it appears in the log file
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            other => Err(Error::Configuration(format!("unknown log level: {other}"))),
        }
    }
}

/// Render the timestamp for an entry written at `now`
pub(crate) fn format_timestamp(now: DateTime<Utc>, format: TimestampFormat) -> String {
    match format {
        TimestampFormat::Rfc3339 => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        TimestampFormat::Local => now
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S%.3f %z")
            .to_string(),
    }
}

/// Build one record line, `"<timestamp> <LEVEL> <message>\n"`.
///
/// The message is written as given.
pub(crate) fn format_line(timestamp: &str, level: Level, message: &str) -> String {
    format!("{timestamp} {level} {message}\n")
}
