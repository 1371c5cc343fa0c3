//! Stylesheet compilation.
//!
//! SCSS/Sass sources are compiled in-process with grass. Stylus has no
//! Rust implementation, so Stylus sources go through the `stylus`
//! executable.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::classify::FileEntry;
use super::document::Destination;
use super::paths::with_output_extension;

/// Default Stylus executable.
pub const STYLUS_PROGRAM: &str = "stylus";

#[derive(thiserror::Error, Debug)]
pub enum StyleError {
    #[error("sass error in {}: {message}", path.display())]
    Sass { path: PathBuf, message: String },

    #[error("failed to run {program} for {}: {source}", path.display())]
    Spawn {
        program: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stylus failed for {}: {message}", path.display())]
    Stylus { path: PathBuf, message: String },

    #[error("stylesheet compiler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Which compiler a stylesheet goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Sass,
    Stylus,
}

impl StyleKind {
    /// Output subfolder for compiled CSS.
    pub fn output_folder(self) -> &'static str {
        match self {
            StyleKind::Sass => "sass",
            StyleKind::Stylus => "stylus",
        }
    }

    /// Where the compiled CSS for `entry` goes (`sass/main.css`).
    pub fn destination(self, entry: &FileEntry) -> Destination {
        Destination {
            folder: PathBuf::from(self.output_folder()),
            file: with_output_extension(&entry.name, "css"),
        }
    }
}

/// Compiles stylesheet entries to CSS.
#[derive(Debug, Clone)]
pub struct StyleCompiler {
    /// Stylus executable to invoke
    pub stylus_program: String,
}

impl Default for StyleCompiler {
    fn default() -> Self {
        Self {
            stylus_program: STYLUS_PROGRAM.to_string(),
        }
    }
}

impl StyleCompiler {
    /// Compile one stylesheet. `load_path` is the folder imports resolve against.
    pub async fn compile(
        &self,
        kind: StyleKind,
        entry: &FileEntry,
        load_path: &Path,
    ) -> Result<String, StyleError> {
        match kind {
            StyleKind::Sass => compile_sass(entry.path.clone(), load_path.to_path_buf()).await,
            StyleKind::Stylus => self.compile_stylus(&entry.path, load_path).await,
        }
    }

    async fn compile_stylus(&self, path: &Path, load_path: &Path) -> Result<String, StyleError> {
        let output = Command::new(&self.stylus_program)
            .arg("--include")
            .arg(load_path)
            .arg("--print")
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| StyleError::Spawn {
                program: self.stylus_program.clone(),
                path: path.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(StyleError::Stylus {
                path: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// grass is synchronous, so it runs on the blocking pool.
async fn compile_sass(path: PathBuf, load_path: PathBuf) -> Result<String, StyleError> {
    tokio::task::spawn_blocking(move || {
        let options = grass::Options::default().load_path(&load_path);
        grass::from_path(&path, &options).map_err(|e| StyleError::Sass {
            path: path.clone(),
            message: e.to_string(),
        })
    })
    .await?
}
