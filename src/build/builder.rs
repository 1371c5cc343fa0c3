use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SiteConfig};

use super::classify::{ClassifyRules, FileEntry};
use super::document::{Document, RenderResult};
use super::extract::{ExtractError, extract};
use super::format::FormatRegistry;
use super::paths::{DestError, validate_dest};
use super::project::{Project, WalkError};
use super::render::{RenderError, Renderer, SiteData};
use super::styles::{StyleCompiler, StyleKind};
use super::write::{WriteError, WriteQueue, WriteSummary, write_file};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid destination: {0}")]
    Dest(#[from] DestError),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("invalid JSON in {}: {source}", path.display())]
    Data {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to prepare {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to build template data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How a build was invoked. Templates see these as `args`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOptions {
    /// Destination folder; falls back to the config, then `site`
    pub dest: Option<String>,
    /// Empty the destination before building
    pub clear: bool,
    /// Treat `.git` as ordinary content
    pub git: bool,
    /// Write the resolved destination back to `_config.yml`
    pub save: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            dest: None,
            clear: true,
            git: false,
            save: true,
        }
    }
}

/// What a finished build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub public: usize,
    pub pages: usize,
    pub posts: usize,
    pub sass: usize,
    pub stylus: usize,
    pub json: usize,
    pub others: usize,
    pub ignored: usize,
    /// Documents replaced by a later one with the same output path
    pub overwritten: usize,
    pub failed: Vec<WriteError>,
    pub elapsed: Duration,
}

impl BuildReport {
    fn log_summary(&self) {
        info!("# of public files: {}", self.public);
        info!("# of pages: {}", self.pages);
        info!("# of posts: {}", self.posts);
        info!("# of sass files: {}", self.sass);
        info!("# of stylus files: {}", self.stylus);
        info!("# of JSON files: {}", self.json);
        info!("# of other files: {}", self.others);
        if self.ignored > 0 {
            info!("# of ignored documents: {}", self.ignored);
        }
        if self.overwritten > 0 {
            warn!("# of overwritten documents: {}", self.overwritten);
        }
        if !self.failed.is_empty() {
            warn!("# of failed writes: {}", self.failed.len());
        }
        info!("Build time: {:.2?}", self.elapsed);
    }
}

/// Builds one project. Every call to [`Builder::build`] starts from scratch.
pub struct Builder {
    root: PathBuf,
    options: BuildOptions,
    styles: StyleCompiler,
}

impl Builder {
    pub fn new(root: PathBuf, options: BuildOptions) -> Self {
        Self {
            root,
            options,
            styles: StyleCompiler::default(),
        }
    }

    /// The destination given on the command line, if any.
    fn requested_dest(&self) -> Option<&str> {
        self.options.dest.as_deref().filter(|d| !d.is_empty())
    }

    pub async fn build(&self) -> Result<BuildReport, BuildError> {
        // Build pipeline:
        // 1. Validate destination and config (nothing is written before this passes)
        // 2. Clear the destination
        // 3. Walk and classify, then copy public files
        // 4. Register partials/layouts, schedule stylesheets, load data
        // 5. Extract and render pages, then posts
        // 6. Wait for every write to settle
        let started = Instant::now();

        // Step 1: Validate
        if let Some(dest) = self.requested_dest() {
            validate_dest(dest)?;
        }
        let mut config = SiteConfig::load(&self.root)?;
        let dest_name = self
            .requested_dest()
            .unwrap_or_else(|| config.dest_or_default())
            .to_string();
        let dest = validate_dest(&dest_name)?;

        if self.options.save && config.dest.as_deref() != Some(dest_name.as_str()) {
            config.dest = Some(dest_name.clone());
            config.save(&self.root)?;
            debug!("saved dest '{}' to config", dest_name);
        }

        // Step 2: Clear
        let output_dir = self.root.join(&dest);
        if self.options.clear {
            clear_dir(&output_dir).await?;
        }
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(output_error(&output_dir))?;

        // Step 3: Walk
        let rules = ClassifyRules {
            folders: config.folders.clone(),
            dest,
            include_git: self.options.git,
        };
        let mut project = Project::new(config);
        project.collect(&self.root, &rules)?;
        debug!(
            "walked {}: {} files, {} posts, {} includes, {} layouts",
            self.root.display(),
            project.files.len(),
            project.posts.len(),
            project.includes.len(),
            project.layouts.len()
        );

        let mut report = BuildReport {
            output_dir: output_dir.clone(),
            ..Default::default()
        };

        // Every public entry counts, folders included
        report.public = project.public.len();
        let public = self.copy_public(&project, &output_dir).await;
        debug!("copied {} public files", public.written);
        report.failed.extend(public.failed);

        // Step 4: Partials, layouts, stylesheets and data
        let mut renderer = Renderer::new(FormatRegistry::with_defaults(), &project.config.markdown)?;
        renderer.register_partials(&project.includes)?;
        renderer.register_layouts(&project.layouts)?;

        let mut queue = WriteQueue::new();
        let folders = &project.config.folders;
        report.sass = self.schedule_styles(
            &mut queue,
            StyleKind::Sass,
            &project.styles,
            &self.root.join(&folders.sass),
            &output_dir,
        );
        report.stylus = self.schedule_styles(
            &mut queue,
            StyleKind::Stylus,
            &project.stylus,
            &self.root.join(&folders.stylus),
            &output_dir,
        );

        let data = load_data(&project.jsondata)?;
        report.json = project.jsondata.len();

        // Step 5: Pages and posts
        let mut pages = Vec::new();
        for entry in project.files.iter().filter(|e| !e.is_dir) {
            let Some(extension) = renderer.output_extension(&entry.extension) else {
                queue.copy(entry.path.clone(), output_dir.join(&entry.relative));
                report.others += 1;
                continue;
            };

            let extracted = extract(entry, extension)?;
            if extracted.front_matter.ignore() {
                debug!("ignoring {}", entry.relative.display());
                report.ignored += 1;
                continue;
            }
            pages.push(Document::page(entry.clone(), extracted));
        }

        let mut posts = Vec::new();
        for entry in &project.posts {
            let Some(extension) = renderer.output_extension(&entry.extension) else {
                warn!(
                    "no format for post {}, skipping it",
                    entry.relative.display()
                );
                continue;
            };

            let extracted = extract(entry, extension)?;
            if extracted.front_matter.ignore() {
                debug!("ignoring {}", entry.relative.display());
                report.ignored += 1;
                continue;
            }
            posts.push(Document::post(entry.clone(), extracted));
        }

        let site = SiteData {
            site: serde_json::to_value(&project.config)?,
            args: serde_json::to_value(&self.options)?,
            data,
            posts: posts
                .iter()
                .map(|post| serde_json::to_value(post.view()))
                .collect::<Result<_, _>>()?,
        }
        .context();

        // One write per output path; a later document replaces an earlier one
        let mut outputs: BTreeMap<PathBuf, (&Path, RenderResult)> = BTreeMap::new();
        for doc in pages.iter().chain(posts.iter()) {
            let result = renderer.render(doc, &site)?;
            let source = doc.entry().source.relative.as_path();
            let target = result.destination.path_in(&output_dir);
            if let Some((previous, _)) = outputs.insert(target, (source, result)) {
                warn!(
                    "{} and {} render to the same file; using the latter",
                    previous.display(),
                    source.display()
                );
                report.overwritten += 1;
            }
        }
        for (_, result) in outputs.into_values() {
            queue.write_result(&output_dir, result);
        }
        report.pages = pages.len();
        report.posts = posts.len();

        // Step 6: Wait for every scheduled write
        let summary = queue.settle().await;
        report.failed.extend(summary.failed);
        report.elapsed = started.elapsed();
        report.log_summary();

        Ok(report)
    }

    /// Copy the public folder's contents into the destination root.
    async fn copy_public(&self, project: &Project, output_dir: &Path) -> WriteSummary {
        let mut queue = WriteQueue::new();
        let public_dir = Path::new(&project.config.folders.public);

        for entry in &project.public {
            let Ok(inner) = entry.relative.strip_prefix(public_dir) else {
                continue;
            };
            if inner.as_os_str().is_empty() {
                continue;
            }

            let target = output_dir.join(inner);
            if entry.is_dir {
                // Keep empty folders; files create their own parents
                if let Err(e) = tokio::fs::create_dir_all(&target).await {
                    warn!("failed to create {}: {}", target.display(), e);
                }
            } else {
                queue.copy(entry.path.clone(), target);
            }
        }

        queue.settle().await
    }

    /// Schedule compile-and-write tasks for stylesheets. Returns how many were scheduled.
    fn schedule_styles(
        &self,
        queue: &mut WriteQueue,
        kind: StyleKind,
        entries: &[FileEntry],
        load_path: &Path,
        output_dir: &Path,
    ) -> usize {
        for entry in entries {
            let entry = entry.clone();
            let compiler = self.styles.clone();
            let load_path = load_path.to_path_buf();
            let target = kind.destination(&entry).path_in(output_dir);

            queue.spawn(Box::pin(async move {
                let css = compiler
                    .compile(kind, &entry, &load_path)
                    .await
                    .map_err(|e| WriteError::new(&entry.relative, e))?;
                write_file(target, css.into_bytes()).await
            }));
        }
        entries.len()
    }
}

/// Remove everything inside `dir`, keeping `dir` itself.
async fn clear_dir(dir: &Path) -> Result<(), BuildError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(output_error(dir)(e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(output_error(dir))? {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(output_error(&path))?;
        if file_type.is_dir() {
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(output_error(&path))?;
        } else {
            tokio::fs::remove_file(&path)
                .await
                .map_err(output_error(&path))?;
        }
    }

    debug!("cleared {}", dir.display());
    Ok(())
}

fn output_error(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + use<> {
    let path = path.to_path_buf();
    move |source| BuildError::Output { path, source }
}

/// Parse every data file, keyed by file stem.
fn load_data(entries: &[FileEntry]) -> Result<BTreeMap<String, serde_json::Value>, BuildError> {
    let mut data = BTreeMap::new();
    for entry in entries {
        let raw = std::fs::read_to_string(&entry.path).map_err(|e| BuildError::Read {
            path: entry.path.clone(),
            source: e,
        })?;
        let value = serde_json::from_str(&raw).map_err(|e| BuildError::Data {
            path: entry.relative.clone(),
            source: e,
        })?;
        if data.insert(entry.stem().to_string(), value).is_some() {
            warn!(
                "data '{}' defined more than once; using {}",
                entry.stem(),
                entry.relative.display()
            );
        }
    }
    Ok(data)
}
