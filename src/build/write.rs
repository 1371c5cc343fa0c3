//! Concurrent output writing.
//!
//! Every output file becomes one independent task. All tasks are started
//! before any is awaited, and the build waits for every one of them to
//! settle. A failed task is logged and counted; it never cancels the others.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures_util::future::join_all;
use tracing::{debug, error};

use super::document::RenderResult;

/// A scheduled write that resolves to the path written, or why it wasn't.
pub type WriteTask = Pin<Box<dyn Future<Output = Result<PathBuf, WriteError>> + Send>>;

#[derive(thiserror::Error, Debug)]
#[error("{}: {message}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    pub message: String,
}

impl WriteError {
    pub fn new(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Outcome of waiting on a batch of writes.
#[derive(Debug, Default)]
pub struct WriteSummary {
    pub written: usize,
    pub failed: Vec<WriteError>,
}

/// Collects write tasks for one build.
#[derive(Default)]
pub struct WriteQueue {
    tasks: Vec<tokio::task::JoinHandle<Result<PathBuf, WriteError>>>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a task now; its result is collected by [`WriteQueue::settle`].
    pub fn spawn(&mut self, task: WriteTask) {
        self.tasks.push(tokio::spawn(task));
    }

    /// Schedule writing a rendered document under `output_dir`.
    pub fn write_result(&mut self, output_dir: &Path, result: RenderResult) {
        let path = result.destination.path_in(output_dir);
        self.spawn(Box::pin(write_file(path, result.content.into_bytes())));
    }

    /// Schedule a verbatim copy of `from` to `to`.
    pub fn copy(&mut self, from: PathBuf, to: PathBuf) {
        self.spawn(Box::pin(copy_file(from, to)));
    }

    /// Wait for every scheduled task, logging each outcome.
    pub async fn settle(self) -> WriteSummary {
        let mut summary = WriteSummary::default();

        for outcome in join_all(self.tasks).await {
            let outcome = outcome.unwrap_or_else(|e| Err(WriteError::new("<task>", e)));
            match outcome {
                Ok(path) => {
                    debug!("file {} written", path.display());
                    summary.written += 1;
                }
                Err(e) => {
                    error!("write failed: {e}");
                    summary.failed.push(e);
                }
            }
        }

        summary
    }
}

/// Write `content` to `path`, creating parent folders first.
pub async fn write_file(path: PathBuf, content: Vec<u8>) -> Result<PathBuf, WriteError> {
    if let Some(parent) = path.parent() {
        // create_dir_all is a no-op for folders that already exist
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| WriteError::new(&path, e))?;
    }
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| WriteError::new(&path, e))?;
    Ok(path)
}

/// Copy `from` to `to`, creating parent folders first.
pub async fn copy_file(from: PathBuf, to: PathBuf) -> Result<PathBuf, WriteError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| WriteError::new(&to, e))?;
    }
    tokio::fs::copy(&from, &to)
        .await
        .map_err(|e| WriteError::new(&from, e))?;
    Ok(to)
}
