//! File watching for automatic rebuilds.
//!
//! Uses `notify-debouncer-full` to watch the project root. Any relevant
//! change outside the destination folder triggers a full rebuild; there is
//! no incremental behavior.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};

/// Quiet period before a burst of changes is reported.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Events sent from the file watcher.
#[derive(Debug)]
pub enum WatchEvent {
    /// Files changed, rebuild needed.
    FilesChanged(Vec<PathBuf>),
    /// Watcher error occurred.
    Error(String),
}

/// Decides which changed paths matter to a build.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    /// Absolute destination folder; its own writes never trigger a build
    output_dir: PathBuf,
    /// Version control folder, skipped unless git inclusion is on
    git_dir: Option<PathBuf>,
}

impl ChangeFilter {
    pub fn new(root: &Path, output_dir: PathBuf, include_git: bool) -> Self {
        Self {
            output_dir,
            git_dir: (!include_git).then(|| root.join(".git")),
        }
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        if path.starts_with(&self.output_dir) {
            return false;
        }
        !self.git_dir.as_ref().is_some_and(|git| path.starts_with(git))
    }
}

/// Watches a project root and reports debounced batches of changes.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    rx: Receiver<WatchEvent>,
}

impl FileWatcher {
    /// Start watching `root` recursively.
    pub fn new(root: &Path, filter: ChangeFilter, debounce: Duration) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();

        let callback = move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changes: Vec<PathBuf> = events
                    .iter()
                    .filter(|event| is_relevant_event(&event.kind))
                    .flat_map(|event| event.paths.iter())
                    .filter(|path| filter.is_relevant(path))
                    .cloned()
                    .collect();

                if !changes.is_empty() {
                    let _ = tx.send(WatchEvent::FilesChanged(changes));
                }
            }
            Err(errors) => {
                for e in errors {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            }
        };

        let mut debouncer = new_debouncer(debounce, None, callback)?;
        debouncer.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Receive the next watch event (blocking).
    pub fn recv(&self) -> Option<WatchEvent> {
        self.rx.recv().ok()
    }
}

/// Check if an event kind is relevant for rebuilds.
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
    )
}
