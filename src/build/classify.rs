//! File classification.
//!
//! Every entry found by the project walk is assigned to exactly one
//! [`Bucket`]. Buckets are decided from the entry's path segments relative
//! to the project root and the configured reserved folder names, never from
//! substring matches on the full path.

use std::path::{Component, Path, PathBuf};

use crate::config::FolderConfig;

/// Version-control directory skipped by default.
const GIT_DIR: &str = ".git";

/// Prefix that marks a top-level folder as reserved.
const RESERVED_PREFIX: char = '_';

/// Prefix that marks a stylesheet as a partial (imported, never compiled alone).
const PARTIAL_PREFIX: char = '_';

// =============================================================================
// File entries
// =============================================================================

/// One filesystem node discovered by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the project root (e.g., "blog/intro.md")
    pub relative: PathBuf,
    /// Relative parent directory (empty for top-level entries)
    pub base_dir: PathBuf,
    /// File name including extension
    pub name: String,
    /// Extension without the dot, empty if none
    pub extension: String,
    pub is_dir: bool,
}

impl FileEntry {
    /// Create an entry for `path`, which must lie strictly inside `root`.
    pub fn new(root: &Path, path: PathBuf, is_dir: bool) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?.to_path_buf();
        if relative.as_os_str().is_empty() {
            return None;
        }

        let name = relative.file_name()?.to_string_lossy().into_owned();
        let extension = relative
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_dir = relative
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Some(Self {
            path,
            relative,
            base_dir,
            name,
            extension,
            is_dir,
        })
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// The first segment of the relative path.
    fn top_level(&self) -> Option<&str> {
        match self.relative.components().next()? {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        }
    }
}

// =============================================================================
// Buckets
// =============================================================================

/// The role an entry plays in the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    /// Inside the destination or version control; not part of the build
    Skip,
    /// Pass-through asset under the public folder (directories included)
    Public,
    Post,
    /// Partial template
    Include,
    /// Layout template, keyed by file stem
    Layout(String),
    /// SCSS/Sass entry point
    Style,
    /// Stylus entry point
    Stylus,
    /// JSON dataset
    Data,
    /// Under a reserved folder but matching no rule
    Ignored,
    /// Generic candidate for rendering or verbatim copy
    File,
}

/// The inputs classification depends on, fixed for one build.
#[derive(Debug, Clone)]
pub struct ClassifyRules {
    pub folders: FolderConfig,
    /// Destination folder, relative to the project root
    pub dest: PathBuf,
    /// Treat `.git` as ordinary content
    pub include_git: bool,
}

impl ClassifyRules {
    /// Whether the walk should skip an entry (and, for directories, its subtree).
    pub fn is_skipped(&self, entry: &FileEntry) -> bool {
        if entry.relative.starts_with(&self.dest) {
            return true;
        }
        !self.include_git && entry.top_level() == Some(GIT_DIR) && entry.name != ".gitignore"
    }
}

/// Decide which bucket an entry belongs to. First match wins.
pub fn classify(entry: &FileEntry, rules: &ClassifyRules) -> Bucket {
    if rules.is_skipped(entry) {
        return Bucket::Skip;
    }

    let Some(top) = entry.top_level() else {
        return Bucket::File;
    };
    if !top.starts_with(RESERVED_PREFIX) {
        return Bucket::File;
    }

    let folders = &rules.folders;
    let is_file = !entry.is_dir;
    let is_partial = entry.name.starts_with(PARTIAL_PREFIX);

    if top == folders.public {
        Bucket::Public
    } else if top == folders.posts && is_file {
        Bucket::Post
    } else if top == folders.includes && is_file {
        Bucket::Include
    } else if top == folders.layouts && is_file {
        Bucket::Layout(entry.stem().to_string())
    } else if top == folders.sass && is_file && !is_partial {
        Bucket::Style
    } else if top == folders.stylus && is_file && !is_partial {
        Bucket::Stylus
    } else if top == folders.data && is_file {
        Bucket::Data
    } else {
        Bucket::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ClassifyRules {
        ClassifyRules {
            folders: FolderConfig::default(),
            dest: PathBuf::from("site"),
            include_git: false,
        }
    }

    fn file(relative: &str) -> FileEntry {
        FileEntry::new(Path::new("/project"), Path::new("/project").join(relative), false).unwrap()
    }

    fn dir(relative: &str) -> FileEntry {
        FileEntry::new(Path::new("/project"), Path::new("/project").join(relative), true).unwrap()
    }

    #[test]
    fn test_file_entry_fields() {
        let entry = file("blog/2024/intro.md");
        assert_eq!(entry.relative, PathBuf::from("blog/2024/intro.md"));
        assert_eq!(entry.base_dir, PathBuf::from("blog/2024"));
        assert_eq!(entry.name, "intro.md");
        assert_eq!(entry.extension, "md");
        assert_eq!(entry.stem(), "intro");

        let entry = file("README");
        assert_eq!(entry.base_dir, PathBuf::new());
        assert_eq!(entry.extension, "");
    }

    #[test]
    fn test_root_is_not_an_entry() {
        assert!(FileEntry::new(Path::new("/project"), PathBuf::from("/project"), true).is_none());
        assert!(FileEntry::new(Path::new("/project"), PathBuf::from("/elsewhere/a"), false).is_none());
    }

    #[test]
    fn test_reserved_folders() {
        let rules = rules();
        assert_eq!(classify(&file("_public/img/logo.png"), &rules), Bucket::Public);
        assert_eq!(classify(&dir("_public/img"), &rules), Bucket::Public);
        assert_eq!(classify(&file("_posts/hello.md"), &rules), Bucket::Post);
        assert_eq!(classify(&file("_includes/header.html"), &rules), Bucket::Include);
        assert_eq!(
            classify(&file("_layout/post.html"), &rules),
            Bucket::Layout("post".to_string())
        );
        assert_eq!(classify(&file("_sass/main.scss"), &rules), Bucket::Style);
        assert_eq!(classify(&file("_stylus/main.styl"), &rules), Bucket::Stylus);
        assert_eq!(classify(&file("_data/authors.json"), &rules), Bucket::Data);
    }

    #[test]
    fn test_directories_under_content_folders_are_ignored() {
        let rules = rules();
        for path in ["_posts", "_posts/2024", "_includes", "_layout", "_data", "_sass/mixins"] {
            assert_eq!(classify(&dir(path), &rules), Bucket::Ignored, "{path}");
        }
    }

    #[test]
    fn test_stylesheet_partials_are_ignored() {
        let rules = rules();
        assert_eq!(classify(&file("_sass/_variables.scss"), &rules), Bucket::Ignored);
        assert_eq!(classify(&file("_stylus/_mixins.styl"), &rules), Bucket::Ignored);
        assert_eq!(classify(&file("_sass/themes/dark.scss"), &rules), Bucket::Style);
    }

    #[test]
    fn test_unknown_reserved_folder_is_ignored() {
        let rules = rules();
        assert_eq!(classify(&file("_drafts/wip.md"), &rules), Bucket::Ignored);
        assert_eq!(classify(&file("_config.yml"), &rules), Bucket::Ignored);
    }

    #[test]
    fn test_generic_files() {
        let rules = rules();
        assert_eq!(classify(&file("index.html"), &rules), Bucket::File);
        assert_eq!(classify(&file("docs/guide.md"), &rules), Bucket::File);
        assert_eq!(classify(&dir("docs"), &rules), Bucket::File);
    }

    #[test]
    fn test_segment_comparison_not_substring() {
        let rules = rules();
        // Reserved names deeper in the tree carry no meaning
        assert_eq!(classify(&file("docs/_posts/a.md"), &rules), Bucket::File);
        assert_eq!(classify(&file("x_public/a.png"), &rules), Bucket::File);
        // A reserved name as a prefix of another folder is not a match
        assert_eq!(classify(&file("_postscript/a.md"), &rules), Bucket::Ignored);
        // The destination name as a prefix of another folder is not skipped
        assert_eq!(classify(&file("sitemap/a.html"), &rules), Bucket::File);
    }

    #[test]
    fn test_destination_is_skipped() {
        let rules = rules();
        assert_eq!(classify(&dir("site"), &rules), Bucket::Skip);
        assert_eq!(classify(&file("site/index.html"), &rules), Bucket::Skip);
    }

    #[test]
    fn test_git_directory() {
        let mut rules = rules();
        assert_eq!(classify(&dir(".git"), &rules), Bucket::Skip);
        assert_eq!(classify(&file(".git/HEAD"), &rules), Bucket::Skip);
        assert_eq!(classify(&file(".gitignore"), &rules), Bucket::File);

        rules.include_git = true;
        assert_eq!(classify(&file(".git/HEAD"), &rules), Bucket::File);
    }

    #[test]
    fn test_custom_folder_names() {
        let mut rules = rules();
        rules.folders.posts = "_articles".to_string();

        assert_eq!(classify(&file("_articles/a.md"), &rules), Bucket::Post);
        assert_eq!(classify(&file("_posts/a.md"), &rules), Bucket::Ignored);
    }

    #[test]
    fn test_partition_is_total() {
        // Every entry under a reserved folder lands in exactly one bucket or is ignored
        let rules = rules();
        let entries = [
            file("_public/a.css"),
            dir("_public"),
            file("_posts/a.md"),
            dir("_posts"),
            file("_includes/a.html"),
            file("_layout/a.html"),
            file("_sass/a.scss"),
            file("_sass/_a.scss"),
            file("_stylus/a.styl"),
            file("_data/a.json"),
            file("_other/a.txt"),
        ];
        for entry in &entries {
            let bucket = classify(entry, &rules);
            assert!(
                !matches!(bucket, Bucket::File | Bucket::Skip),
                "{} classified as {bucket:?}",
                entry.relative.display()
            );
        }
    }
}
