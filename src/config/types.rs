//! Configuration type definitions.
//!
//! These types mirror `_config.yml`. They are pure data - no I/O.

use serde::{Deserialize, Serialize};

/// Destination folder used when neither the command line nor the config names one.
pub const DEFAULT_DEST: &str = "site";

// =============================================================================
// Site configuration
// =============================================================================

/// The project configuration loaded from `_config.yml`.
///
/// Only a handful of keys mean something to the build. Everything else is
/// kept in `extra`, in file order, so it can be handed to templates as
/// `site.*` and written back untouched when the config is saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Output folder, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,

    /// Overrides for the reserved input folder names
    #[serde(default, skip_serializing_if = "FolderConfig::is_default")]
    pub folders: FolderConfig,

    /// Markdown rendering options
    #[serde(default, skip_serializing_if = "MarkdownConfig::is_default")]
    pub markdown: MarkdownConfig,

    /// Any other site settings
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

impl SiteConfig {
    /// The destination from the config, falling back to [`DEFAULT_DEST`].
    pub fn dest_or_default(&self) -> &str {
        self.dest
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DEST)
    }
}

// =============================================================================
// Reserved folders
// =============================================================================

/// Names of the reserved top-level input folders.
///
/// Every name must start with `_`; anything else at the top level is
/// treated as ordinary site content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    pub public: String,
    pub posts: String,
    pub includes: String,
    pub layouts: String,
    pub sass: String,
    pub stylus: String,
    pub data: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            public: "_public".to_string(),
            posts: "_posts".to_string(),
            includes: "_includes".to_string(),
            layouts: "_layout".to_string(),
            sass: "_sass".to_string(),
            stylus: "_stylus".to_string(),
            data: "_data".to_string(),
        }
    }
}

impl FolderConfig {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// All configured names, for validation.
    pub fn names(&self) -> [&str; 7] {
        [
            &self.public,
            &self.posts,
            &self.includes,
            &self.layouts,
            &self.sass,
            &self.stylus,
            &self.data,
        ]
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

impl MarkdownConfig {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
