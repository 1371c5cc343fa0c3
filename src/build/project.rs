//! Per-build project state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::classify::{Bucket, ClassifyRules, FileEntry, classify};
use crate::config::SiteConfig;

#[derive(thiserror::Error, Debug)]
#[error("failed to walk {}: {message}", path.display())]
pub struct WalkError {
    pub path: PathBuf,
    pub message: String,
}

/// Everything one build knows about the project.
///
/// A new `Project` is created for every build, so nothing carries over
/// between repeated builds in the same process.
#[derive(Debug, Default)]
pub struct Project {
    pub config: SiteConfig,
    pub files: Vec<FileEntry>,
    pub public: Vec<FileEntry>,
    pub posts: Vec<FileEntry>,
    pub includes: Vec<FileEntry>,
    /// Layouts keyed by file stem
    pub layouts: BTreeMap<String, FileEntry>,
    pub styles: Vec<FileEntry>,
    pub stylus: Vec<FileEntry>,
    pub jsondata: Vec<FileEntry>,
}

impl Project {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Walk `root` once and bucket every entry.
    ///
    /// Skipped directories are pruned so their contents are never visited.
    /// Entries are visited in file-name order so repeated builds see the
    /// same sequence.
    pub fn collect(&mut self, root: &Path, rules: &ClassifyRules) -> Result<(), WalkError> {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                FileEntry::new(root, e.path().to_path_buf(), e.file_type().is_dir())
                    .is_none_or(|entry| !rules.is_skipped(&entry))
            });

        for entry in walker {
            let entry = entry.map_err(|e| WalkError {
                path: e.path().unwrap_or(root).to_path_buf(),
                message: e.to_string(),
            })?;

            let Some(file) =
                FileEntry::new(root, entry.path().to_path_buf(), entry.file_type().is_dir())
            else {
                continue;
            };

            let bucket = classify(&file, rules);
            self.add(file, bucket);
        }

        Ok(())
    }

    /// Append an entry to the collection for its bucket.
    pub fn add(&mut self, entry: FileEntry, bucket: Bucket) {
        match bucket {
            Bucket::Skip => {}
            Bucket::Public => self.public.push(entry),
            Bucket::Post => self.posts.push(entry),
            Bucket::Include => self.includes.push(entry),
            Bucket::Layout(name) => {
                if let Some(previous) = self.layouts.get(&name) {
                    warn!(
                        "layout '{}' defined by both {} and {}; using the latter",
                        name,
                        previous.relative.display(),
                        entry.relative.display()
                    );
                }
                self.layouts.insert(name, entry);
            }
            Bucket::Style => self.styles.push(entry),
            Bucket::Stylus => self.stylus.push(entry),
            Bucket::Data => self.jsondata.push(entry),
            Bucket::Ignored => debug!("ignoring {}", entry.relative.display()),
            Bucket::File => self.files.push(entry),
        }
    }
}
