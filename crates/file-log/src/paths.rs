//! Default location for the log file

use crate::error::{Error, Result};

use std::path::PathBuf;

/// File name used when the caller does not pick one
pub const DEFAULT_FILE_NAME: &str = "app.log";

/// Resolve `file_name` inside the user's cache directory.
pub fn default_log_path(file_name: &str) -> Result<PathBuf> {
    if file_name.is_empty() {
        return Err(Error::Configuration(
            "log file name must not be empty".to_string(),
        ));
    }

    let cache_dir = dirs::cache_dir().ok_or_else(|| {
        Error::Configuration("no cache directory available on this platform".to_string())
    })?;

    Ok(cache_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_name() {
        assert!(matches!(
            default_log_path(""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_joins_cache_dir() {
        // Not every CI environment has a cache dir; only check when it does.
        if let Some(cache_dir) = dirs::cache_dir() {
            let path = default_log_path(DEFAULT_FILE_NAME).unwrap();
            assert_eq!(path, cache_dir.join("app.log"));
        }
    }
}
