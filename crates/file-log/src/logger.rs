//! Caller-facing handle to the sequenced file log

use crate::config::FileLogConfig;
use crate::entry::Level;
use crate::error::{Error, Result};
use crate::sequencer::{Operation, ReadSink, Sequencer, Task};

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

/// Append-only text log backed by a single file.
///
/// Every operation is queued and executed by one background worker in the
/// order it was submitted, so an operation always observes the full effect
/// of everything submitted before it. Writes and clears never block and
/// never fail at the call site; failures are reported through `tracing`.
///
/// The worker runs on its own thread with its own runtime, so it outlives
/// whatever runtime the caller happens to use. Cloning is cheap and all
/// clones feed the same queue. Dropping the last clone blocks until the
/// queued work is on disk; [`FileLog::shutdown`] does the same without
/// dropping.
#[derive(Clone, Debug)]
pub struct FileLog {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    tx: mpsc::UnboundedSender<Task>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Ask the worker to drain and stop, then wait for its thread to exit.
    fn stop_worker(&self) -> Result<()> {
        let (ack, _) = oneshot::channel();
        let _ = self.tx.send(Task::Shutdown(ack));

        let Some(worker) = self.worker.lock().take() else {
            return Ok(());
        };

        // The last handle can be dropped by a read callback on the worker
        // itself; it exits on its own once the queue is drained.
        if worker.thread().id() == thread::current().id() {
            return Ok(());
        }

        worker.join().map_err(|_| Error::WorkerStopped)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.stop_worker().is_err() {
            error!(path = %self.path.display(), "log worker panicked");
        }
    }
}

impl FileLog {
    /// Start a logger for the configured file.
    ///
    /// Spawns the worker thread. The file itself is not touched until the
    /// first operation runs.
    pub fn new(config: FileLogConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Io("error creating log worker runtime", e))?;

        let path = config.path.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let sequencer = Sequencer::new(config);

        let worker = thread::Builder::new()
            .name("seqlog-worker".to_string())
            .spawn(move || runtime.block_on(sequencer.run(rx)))
            .map_err(|e| Error::Io("error spawning log worker thread", e))?;

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Queue an entry with the given level.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let op = Operation::Write {
            level,
            message: message.into(),
        };

        if self.enqueue(Task::Op(op)).is_err() {
            warn!(path = %self.inner.path.display(), "log worker stopped, dropping entry");
        }
    }

    /// Queue an `INFO` entry.
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    /// Queue a `WARN` entry.
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    /// Queue an `ERROR` entry.
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    /// Queue truncation of the log file.
    ///
    /// The next entry written afterwards gets a fresh header.
    pub fn clear(&self) {
        if self.enqueue(Task::Op(Operation::Clear)).is_err() {
            warn!(path = %self.inner.path.display(), "log worker stopped, dropping clear");
        }
    }

    /// Queue a read of the whole file.
    ///
    /// The read is queued right away, before the returned future is polled,
    /// so it sees every operation submitted before this call and none
    /// submitted after. A missing file reads as an empty string.
    ///
    /// Fails with [`Error::Open`] when the file could not be opened,
    /// [`Error::Decode`] when its bytes are not UTF-8, and
    /// [`Error::WorkerStopped`] when the worker is gone.
    pub fn read_all(&self) -> impl Future<Output = Result<String>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let queued = self
            .enqueue(Task::Op(Operation::Read(ReadSink::Channel(tx))))
            .map_err(|_| Error::WorkerStopped);

        async move {
            queued?;
            rx.await.map_err(|_| Error::WorkerStopped)?
        }
    }

    /// Queue a read of the whole file, handing the result to `completion`.
    ///
    /// `completion` runs exactly once, on the worker, with `None` if the read
    /// failed. If the worker has already stopped it runs immediately on the
    /// calling thread with `None`.
    pub fn read_all_with<F>(&self, completion: F)
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        let task = Task::Op(Operation::Read(ReadSink::Callback(Box::new(completion))));

        if let Err(Task::Op(Operation::Read(sink))) = self.enqueue(task) {
            warn!(path = %self.inner.path.display(), "log worker stopped, read not run");
            sink.deliver(Err(Error::WorkerStopped));
        }
    }

    /// Resolves once everything queued before this call is on disk.
    pub fn flush(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let queued = self
            .enqueue(Task::Barrier(tx))
            .map_err(|_| Error::WorkerStopped);

        async move {
            queued?;
            rx.await.map_err(|_| Error::WorkerStopped)
        }
    }

    /// Stop the worker after it has run everything queued so far.
    ///
    /// Operations submitted after shutdown are dropped and reported. Calling
    /// this more than once, or from several clones, is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.enqueue(Task::Shutdown(tx)).is_ok() {
            // A dropped ack means the worker ended some other way; joining
            // below tells us how.
            let _ = rx.await;
        }

        // The ack is the worker's last action, so the join is short.
        self.inner.stop_worker()
    }

    fn enqueue(&self, task: Task) -> std::result::Result<(), Task> {
        self.inner.tx.send(task).map_err(|e| e.0)
    }
}
