//! Configuration for the file log

use crate::error::{Error, Result};
use crate::header::{HeaderProvider, HeaderSource};

use std::path::PathBuf;
use std::sync::Arc;

/// How entry timestamps are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// RFC 3339 in UTC with millisecond precision, e.g. `2017-04-01T12:30:45.123Z`
    #[default]
    Rfc3339,
    /// Local time with offset, e.g. `2017-04-01 14:30:45.123 +0200`
    Local,
}

/// Configuration for a [`FileLog`](crate::FileLog)
#[derive(Debug, Clone)]
pub struct FileLogConfig {
    /// Absolute path of the log file
    pub path: PathBuf,
    /// Optional header written at the top of every fresh file
    pub header: Option<HeaderSource>,
    /// Timestamp rendering for entries
    pub timestamp_format: TimestampFormat,
    /// Re-emit every written line as a tracing event on `seqlog::console`
    pub mirror_to_console: bool,
    /// Create missing parent directories before creating the file
    pub create_parent_dirs: bool,
}

impl FileLogConfig {
    /// Configuration with defaults for everything but the path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header: None,
            timestamp_format: TimestampFormat::default(),
            mirror_to_console: false,
            create_parent_dirs: true,
        }
    }

    /// Start a builder
    pub fn builder() -> FileLogConfigBuilder {
        FileLogConfigBuilder::default()
    }
}

/// Builder for [`FileLogConfig`]
#[derive(Debug, Default)]
pub struct FileLogConfigBuilder {
    path: Option<PathBuf>,
    header: Option<HeaderSource>,
    timestamp_format: TimestampFormat,
    mirror_to_console: bool,
    create_parent_dirs: Option<bool>,
}

impl FileLogConfigBuilder {
    /// Set the log file path
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Header provider owned by the logger
    #[must_use]
    pub fn header<P: HeaderProvider>(mut self, provider: P) -> Self {
        self.header = Some(HeaderSource::shared(provider));
        self
    }

    /// Header provider owned elsewhere; skipped once its owner drops it
    #[must_use]
    pub fn weak_header<P: HeaderProvider>(mut self, provider: &Arc<P>) -> Self {
        self.header = Some(HeaderSource::weak(provider));
        self
    }

    /// Set the header source directly
    #[must_use]
    pub fn header_source(mut self, source: HeaderSource) -> Self {
        self.header = Some(source);
        self
    }

    /// Set the timestamp format
    #[must_use]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Mirror written lines to the console via tracing
    #[must_use]
    pub fn mirror_to_console(mut self, mirror: bool) -> Self {
        self.mirror_to_console = mirror;
        self
    }

    /// Whether missing parent directories are created
    #[must_use]
    pub fn create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = Some(create);
        self
    }

    /// Validate and build the configuration.
    ///
    /// A relative path is resolved against the current directory here, once.
    pub fn build(self) -> Result<FileLogConfig> {
        let path = self
            .path
            .ok_or_else(|| Error::Configuration("log file path is required".to_string()))?;

        if path.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "log file path must not be empty".to_string(),
            ));
        }

        if path.file_name().is_none() {
            return Err(Error::Configuration(format!(
                "log file path {} does not name a file",
                path.display()
            )));
        }

        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(|e| Error::Io("error resolving current directory", e))?
                .join(path)
        };

        Ok(FileLogConfig {
            path,
            header: self.header,
            timestamp_format: self.timestamp_format,
            mirror_to_console: self.mirror_to_console,
            create_parent_dirs: self.create_parent_dirs.unwrap_or(true),
        })
    }
}
