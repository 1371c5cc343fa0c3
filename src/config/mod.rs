//! Configuration loading and types for kiln.
//!
//! - Type definitions for `_config.yml` (`types`)
//! - Loading and saving the file (`load`)

mod load;
mod types;

use std::path::PathBuf;

pub use types::{FolderConfig, MarkdownConfig, SiteConfig};

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "_config.yml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{} not found, won't build", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Validation(String),
}
