//! Single-worker task queue that owns all access to the log file

use crate::config::{FileLogConfig, TimestampFormat};
use crate::entry::{self, Level};
use crate::error::Result;
use crate::header::HeaderSource;
use crate::store::{RecordFile, RecordHandle};

use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Target used for console mirroring of written lines
pub(crate) const CONSOLE_TARGET: &str = "seqlog::console";

/// Callback form of a read result sink
pub(crate) type ReadCallback = Box<dyn FnOnce(Option<String>) + Send + 'static>;

/// Where the result of a read goes
pub(crate) enum ReadSink {
    Channel(oneshot::Sender<Result<String>>),
    Callback(ReadCallback),
}

impl ReadSink {
    /// Hand over the result. Called exactly once per sink.
    pub(crate) fn deliver(self, result: Result<String>) {
        match self {
            // The receiver may have been dropped; the caller no longer cares.
            Self::Channel(tx) => {
                let _ = tx.send(result);
            }
            Self::Callback(callback) => {
                let contents = result.ok();
                if catch_unwind(AssertUnwindSafe(move || callback(contents))).is_err() {
                    error!("log read callback panicked");
                }
            }
        }
    }
}

/// A file operation, run in submission order
pub(crate) enum Operation {
    Write { level: Level, message: String },
    Clear,
    Read(ReadSink),
}

/// A unit of work on the queue
pub(crate) enum Task {
    Op(Operation),
    /// Resolves once every earlier task has completed
    Barrier(oneshot::Sender<()>),
    /// Stop accepting tasks, drain what is queued, then acknowledge
    Shutdown(oneshot::Sender<()>),
}

/// Executes tasks against the log file, one at a time
pub(crate) struct Sequencer {
    store: RecordFile,
    header: Option<HeaderSource>,
    timestamp_format: TimestampFormat,
    mirror_to_console: bool,
}

impl Sequencer {
    pub(crate) fn new(config: FileLogConfig) -> Self {
        Self {
            store: RecordFile::new(config.path, config.create_parent_dirs),
            header: config.header,
            timestamp_format: config.timestamp_format,
            mirror_to_console: config.mirror_to_console,
        }
    }

    /// Worker loop. Ends when every sender is gone or a shutdown was requested,
    /// and in both cases only after the queue is empty.
    pub(crate) async fn run(self, mut rx: mpsc::UnboundedReceiver<Task>) {
        debug!(path = %self.store.path().display(), "log worker started");

        let mut shutdown_acks = Vec::new();

        while let Some(task) = rx.recv().await {
            match task {
                Task::Op(op) => self.execute(op).await,
                Task::Barrier(ack) => {
                    let _ = ack.send(());
                }
                Task::Shutdown(ack) => {
                    rx.close();
                    shutdown_acks.push(ack);
                }
            }
        }

        debug!(path = %self.store.path().display(), "log worker stopped");

        for ack in shutdown_acks {
            let _ = ack.send(());
        }
    }

    async fn execute(&self, op: Operation) {
        let path = self.store.path();

        match op {
            Operation::Write { level, message } => {
                if let Err(e) = self.write_entry(level, &message).await {
                    error!(path = %path.display(), error = %e, "failed to write log entry");
                }
            }
            Operation::Clear => {
                if let Err(e) = self.clear().await {
                    error!(path = %path.display(), error = %e, "failed to clear log file");
                }
            }
            Operation::Read(sink) => {
                let result = self.read_contents().await;
                if let Err(e) = &result {
                    error!(path = %path.display(), error = %e, "failed to read log file");
                }
                sink.deliver(result);
            }
        }
    }

    /// Make sure the file exists, then open it.
    ///
    /// A creation failure is only reported; the open that follows decides
    /// whether the operation can go ahead.
    async fn acquire(&self) -> Result<RecordHandle<'_>> {
        if let Err(e) = self.store.ensure_created().await {
            warn!(path = %self.store.path().display(), error = %e, "failed to create log file");
        }

        self.store.open_for_update().await
    }

    async fn write_entry(&self, level: Level, message: &str) -> Result<()> {
        let mut handle = self.acquire().await?;
        let result = self.append_entry(&mut handle, level, message).await;
        handle.close().await;
        result
    }

    async fn append_entry(
        &self,
        handle: &mut RecordHandle<'_>,
        level: Level,
        message: &str,
    ) -> Result<()> {
        // Header only goes in front of the first entry of an empty file.
        if handle.seek_end().await? == 0 {
            if let Some(header) = self.header.as_ref().and_then(HeaderSource::resolve) {
                handle.append(format!("{header}\n").as_bytes()).await?;
                self.mirror(&header);
            }
        }

        let timestamp = entry::format_timestamp(Utc::now(), self.timestamp_format);
        let line = entry::format_line(&timestamp, level, message);
        handle.append(line.as_bytes()).await?;
        self.mirror(line.trim_end_matches('\n'));

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut handle = self.acquire().await?;
        let result = handle.truncate().await;
        handle.close().await;
        result
    }

    async fn read_contents(&self) -> Result<String> {
        let mut handle = self.acquire().await?;
        let result = handle.read_all().await;
        handle.close().await;
        result
    }

    fn mirror(&self, line: &str) {
        if self.mirror_to_console {
            info!(target: CONSOLE_TARGET, "{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use tempfile::tempdir;

    fn sequencer(path: &Path, header: Option<HeaderSource>) -> Sequencer {
        let mut config = FileLogConfig::new(path);
        config.header = header;
        Sequencer::new(config)
    }

    fn write(level: Level, message: &str) -> Task {
        Task::Op(Operation::Write {
            level,
            message: message.to_string(),
        })
    }

    #[tokio::test]
    async fn test_drains_queue_in_order_before_exit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(write(Level::Info, "first")).unwrap();
        tx.send(write(Level::Warn, "second")).unwrap();
        tx.send(Task::Op(Operation::Clear)).unwrap();
        tx.send(write(Level::Error, "third")).unwrap();
        drop(tx);

        sequencer(&path, None).run(rx).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("first"));
        assert!(!contents.contains("second"));
        assert!(contents.ends_with(" ERROR third\n"));
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_acks_after_queued_tasks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(sequencer(&path, None).run(rx));

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(write(Level::Info, "before shutdown")).unwrap();
        tx.send(Task::Shutdown(ack_tx)).unwrap();

        ack_rx.await.unwrap();
        worker.await.unwrap();

        // Queue is closed once shutdown has been processed.
        assert!(tx.send(write(Level::Info, "after shutdown")).is_err());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("INFO before shutdown"));
        assert!(!contents.contains("after shutdown"));
    }

    #[tokio::test]
    async fn test_header_once_per_epoch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let header = HeaderSource::shared(|| Some("== header ==".to_string()));
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(write(Level::Info, "a")).unwrap();
        tx.send(write(Level::Info, "b")).unwrap();
        drop(tx);
        sequencer(&path, Some(header)).run(rx).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "== header ==");
        assert!(lines[1].ends_with("INFO a"));
        assert!(lines[2].ends_with("INFO b"));
    }

    #[tokio::test]
    async fn test_failed_task_does_not_poison_queue() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "plain file").unwrap();
        let path = blocker.join("app.log");

        let (tx, rx) = mpsc::unbounded_channel();
        let (read_tx, read_rx) = oneshot::channel();
        let (barrier_tx, barrier_rx) = oneshot::channel();

        tx.send(write(Level::Info, "lost")).unwrap();
        tx.send(Task::Op(Operation::Read(ReadSink::Channel(read_tx))))
            .unwrap();
        tx.send(Task::Barrier(barrier_tx)).unwrap();
        drop(tx);

        sequencer(&path, None).run(rx).await;

        assert!(read_rx.await.unwrap().is_err());
        barrier_rx.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_callback_is_contained() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let (tx, rx) = mpsc::unbounded_channel();
        let (read_tx, read_rx) = oneshot::channel();

        let callback: ReadCallback = Box::new(|_| panic!("callback failure"));
        tx.send(Task::Op(Operation::Read(ReadSink::Callback(callback))))
            .unwrap();
        tx.send(write(Level::Info, "still running")).unwrap();
        tx.send(Task::Op(Operation::Read(ReadSink::Channel(read_tx))))
            .unwrap();
        drop(tx);

        sequencer(&path, None).run(rx).await;

        let contents = read_rx.await.unwrap().unwrap();
        assert!(contents.contains("INFO still running"));
    }

    #[tokio::test]
    async fn test_panicking_header_provider_is_contained() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let header = HeaderSource::shared(|| -> Option<String> { panic!("header failure") });
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(write(Level::Info, "first")).unwrap();
        tx.send(write(Level::Info, "second")).unwrap();
        drop(tx);
        sequencer(&path, Some(header)).run(rx).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO first"));
        assert!(lines[1].ends_with("INFO second"));
    }
}
