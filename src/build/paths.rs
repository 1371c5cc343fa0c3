//! Path and URL conversion utilities.
//!
//! This module handles:
//! - Validating the destination folder given on the command line or in config
//! - Post URLs and their output locations
//! - URLs for pages, derived from their output location

use std::path::{Component, Path, PathBuf};

use super::document::Destination;

/// URL prefix shared by all posts.
pub const BLOG_PREFIX: &str = "blog";

/// Why a destination folder was refused.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DestError {
    #[error("won't build to a parent directory: {0}")]
    ParentTraversal(String),

    #[error("won't build to the project root itself: {0:?}")]
    ProjectRoot(String),

    #[error("destination must be relative to the project root: {0}")]
    Absolute(String),
}

/// Validate a destination folder and normalize it to a clean relative path.
///
/// Refuses any `..` segment, absolute paths, and anything that resolves to
/// the project root (`.`, `./`, empty). `./out/` normalizes to `out`.
pub fn validate_dest(dest: &str) -> Result<PathBuf, DestError> {
    let mut normalized = PathBuf::new();

    for component in Path::new(dest).components() {
        match component {
            Component::ParentDir => return Err(DestError::ParentTraversal(dest.to_string())),
            Component::RootDir | Component::Prefix(_) => {
                return Err(DestError::Absolute(dest.to_string()));
            }
            Component::CurDir => {}
            Component::Normal(segment) => normalized.push(segment),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(DestError::ProjectRoot(dest.to_string()));
    }

    Ok(normalized)
}

/// Build a post URL from an already-slugified category and slug.
///
/// Empty segments are dropped, so a post without a category lives directly
/// under `/blog`.
///
/// # Examples
/// ```ignore
/// post_url("news", "hello-world") => "/blog/news/hello-world"
/// post_url("", "hello-world") => "/blog/hello-world"
/// ```
pub fn post_url(category: &str, slug: &str) -> String {
    let segments: Vec<&str> = [BLOG_PREFIX, category, slug]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Output location for a post URL: `<url>/index.html`.
pub fn post_destination(url: &str) -> Destination {
    let folder: PathBuf = url.split('/').filter(|s| !s.is_empty()).collect();
    Destination {
        folder,
        file: "index.html".to_string(),
    }
}

/// The site-absolute URL of a destination.
///
/// # Examples
/// ```ignore
/// { folder: "docs", file: "guide.html" } => "/docs/guide.html"
/// { folder: "", file: "index.html" } => "/index.html"
/// ```
pub fn destination_url(destination: &Destination) -> String {
    let mut url = String::from("/");
    for component in destination.folder.components() {
        if let Component::Normal(segment) = component {
            url.push_str(&segment.to_string_lossy());
            url.push('/');
        }
    }
    url.push_str(&destination.file);
    url
}

/// Swap a file name's extension (`guide.md` -> `guide.html`).
pub fn with_output_extension(name: &str, extension: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    format!("{stem}.{extension}")
}
