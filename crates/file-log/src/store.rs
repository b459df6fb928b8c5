//! Physical access to the log file
//!
//! Every method here is only ever called from the sequencer worker, so a
//! handle is never shared between two operations.

use crate::error::{Error, Result};

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// The on-disk log file, addressed by a fixed path
#[derive(Debug, Clone)]
pub(crate) struct RecordFile {
    path: PathBuf,
    create_parent_dirs: bool,
}

impl RecordFile {
    pub(crate) fn new(path: impl Into<PathBuf>, create_parent_dirs: bool) -> Self {
        Self {
            path: path.into(),
            create_parent_dirs,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty file if nothing exists at the path yet.
    pub(crate) async fn ensure_created(&self) -> Result<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }

        if self.create_parent_dirs {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|source| Error::CreateDirectory {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                }
            }
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(_) => Ok(()),
            // Lost a race with something outside this process; the file is there.
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(source) => Err(Error::CreateFile {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Open the file for combined reading and writing.
    pub(crate) async fn open_for_update(&self) -> Result<RecordHandle<'_>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .await
            .map_err(|source| Error::Open {
                path: self.path.clone(),
                source,
            })?;

        Ok(RecordHandle {
            file,
            path: &self.path,
        })
    }
}

/// An open handle on the log file, scoped to a single operation
#[derive(Debug)]
pub(crate) struct RecordHandle<'a> {
    file: File,
    path: &'a Path,
}

impl RecordHandle<'_> {
    /// Seek to end-of-file and return the resulting offset.
    pub(crate) async fn seek_end(&mut self) -> Result<u64> {
        self.file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| Error::Io("error seeking to end of log file", e))
    }

    /// Append `bytes` at end-of-file and sync them to disk.
    ///
    /// Returns the offset the bytes were written at.
    pub(crate) async fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.seek_end().await?;

        self.file
            .write_all(bytes)
            .await
            .map_err(|e| Error::Io("error writing log file", e))?;
        self.sync().await?;

        Ok(offset)
    }

    /// Drop all content and sync.
    pub(crate) async fn truncate(&mut self) -> Result<()> {
        self.file
            .set_len(0)
            .await
            .map_err(|e| Error::Io("error truncating log file", e))?;
        self.file
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|e| Error::Io("error seeking log file", e))?;
        self.sync().await
    }

    /// Read the whole file from the start and decode it as UTF-8.
    pub(crate) async fn read_all(&mut self) -> Result<String> {
        self.file
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|e| Error::Io("error seeking log file", e))?;

        let mut bytes = Vec::new();
        self.file
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| Error::Io("error reading log file", e))?;

        String::from_utf8(bytes).map_err(|source| Error::Decode {
            path: self.path.to_path_buf(),
            source,
        })
    }

    /// Close the handle, waiting for any in-flight operation to settle first.
    pub(crate) async fn close(self) {
        let file = self.file.into_std().await;
        drop(file);
    }

    async fn sync(&mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| Error::Io("error flushing log file", e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| Error::Io("error syncing log file", e))
    }
}
