mod builder;
mod classify;
mod document;
mod extract;
pub mod format;
mod markdown;
mod paths;
mod project;
mod render;
mod styles;
mod watch;
mod write;

pub use builder::{BuildOptions, Builder};
pub use paths::validate_dest;
pub use watch::{ChangeFilter, DEFAULT_DEBOUNCE, FileWatcher, WatchEvent};
