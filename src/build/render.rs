use std::collections::BTreeMap;
use std::error::Error as _;
use std::path::PathBuf;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

use super::classify::FileEntry;
use super::document::{Document, RenderResult};
use super::format::{FormatContext, FormatRegistry};
use super::markdown::{MarkdownError, markdown_options};
use crate::config::MarkdownConfig;

/// Namespace layouts are registered under (`layouts/post`).
pub const LAYOUT_NAMESPACE: &str = "layouts";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template error in {}: {message}", path.display())]
    Template { path: PathBuf, message: String },

    #[error("no format registered for {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error(transparent)]
    Markdown(#[from] MarkdownError),
}

impl RenderError {
    fn template(path: &std::path::Path, error: tera::Error) -> Self {
        // tera's top-level message rarely says what went wrong; the cause chain does
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        RenderError::Template {
            path: path.to_path_buf(),
            message,
        }
    }
}

/// Site-wide data every template can see.
#[derive(Debug, Serialize)]
pub struct SiteData {
    /// The project configuration
    pub site: serde_json::Value,
    /// The arguments the build was invoked with
    pub args: serde_json::Value,
    /// JSON datasets keyed by file stem
    pub data: BTreeMap<String, serde_json::Value>,
    /// Every post, as seen through `Document::view`
    pub posts: Vec<serde_json::Value>,
}

impl SiteData {
    pub fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("args", &self.args);
        context.insert("data", &self.data);
        context.insert("posts", &self.posts);
        context
    }
}

/// The template renderer, wrapping Tera.
///
/// Includes are registered under their file stem (`{% include "header" %}`)
/// and layouts under `layouts/<name>`, so layouts can also extend one
/// another (`{% extends "layouts/base" %}`).
pub struct Renderer {
    tera: Tera,
    formats: FormatRegistry,
    format_ctx: FormatContext,
}

impl Renderer {
    pub fn new(formats: FormatRegistry, markdown: &MarkdownConfig) -> Result<Self, RenderError> {
        Ok(Self {
            tera: Tera::default(),
            formats,
            format_ctx: FormatContext {
                markdown_options: markdown_options(markdown)?,
            },
        })
    }

    /// Output extension for a source extension, if it is renderable.
    pub fn output_extension(&self, extension: &str) -> Option<&'static str> {
        self.formats
            .for_extension(extension)
            .map(|f| f.output_extension())
    }

    /// Register every include as a partial.
    pub fn register_partials(&mut self, includes: &[FileEntry]) -> Result<(), RenderError> {
        let templates = includes
            .iter()
            .map(|entry| -> Result<_, RenderError> {
                Ok((entry.stem().to_string(), read_template(entry)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.add_templates(templates)
    }

    /// Register every layout under the layout namespace.
    pub fn register_layouts(
        &mut self,
        layouts: &BTreeMap<String, FileEntry>,
    ) -> Result<(), RenderError> {
        let templates = layouts
            .iter()
            .map(|(name, entry)| -> Result<_, RenderError> {
                Ok((layout_template_name(name), read_template(entry)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.add_templates(templates)
    }

    fn add_templates(&mut self, templates: Vec<(String, String)>) -> Result<(), RenderError> {
        if templates.is_empty() {
            return Ok(());
        }
        self.tera
            .add_raw_templates(templates)
            .map_err(|e| RenderError::template(std::path::Path::new("templates"), e))
    }

    /// Render a document with the site-wide context.
    ///
    /// The body is first expanded as a template (unless the front matter
    /// says `raw: true`), then converted by the document's format, then
    /// wrapped in its layout. A layout that isn't registered is reported
    /// and skipped.
    pub fn render(&mut self, doc: &Document, site: &Context) -> Result<RenderResult, RenderError> {
        let entry = doc.entry();
        let source = &entry.source.relative;

        let mut context = site.clone();
        context.insert("page", &doc.view());

        let expanded = if entry.front_matter.raw() {
            entry.body.clone()
        } else {
            self.tera
                .render_str(&entry.body, &context)
                .map_err(|e| RenderError::template(source, e))?
        };

        let format = self
            .formats
            .for_extension(&entry.kind)
            .ok_or_else(|| RenderError::UnknownFormat(source.clone()))?;
        let html = format.render(&expanded, &self.format_ctx);

        let content = match entry.front_matter.layout() {
            Some(layout) => {
                let name = layout_template_name(&layout);
                if self.tera.get_template_names().any(|n| n == name) {
                    context.insert("content", &html);
                    self.tera
                        .render(&name, &context)
                        .map_err(|e| RenderError::template(source, e))?
                } else {
                    warn!(
                        "layout '{}' not found for {}, writing content without it",
                        layout,
                        source.display()
                    );
                    html
                }
            }
            None => html,
        };

        Ok(RenderResult {
            destination: entry.destination.clone(),
            content,
        })
    }
}

fn layout_template_name(name: &str) -> String {
    format!("{LAYOUT_NAMESPACE}/{name}")
}

fn read_template(entry: &FileEntry) -> Result<String, RenderError> {
    std::fs::read_to_string(&entry.path).map_err(|e| RenderError::Read {
        path: entry.path.clone(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::build::document::{Destination, FrontMatter};
    use crate::build::extract::Extracted;

    fn write_entry(root: &Path, relative: &str, content: &str) -> FileEntry {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        FileEntry::new(root, path, false).unwrap()
    }

    fn page(root: &Path, relative: &str, front_matter: serde_json::Value, body: &str) -> Document {
        let source = write_entry(root, relative, body);
        Document::page(
            source,
            Extracted {
                front_matter: FrontMatter(front_matter.as_object().cloned().unwrap_or_default()),
                content: body.to_string(),
                destination: Destination {
                    folder: PathBuf::new(),
                    file: "out.html".to_string(),
                },
            },
        )
    }

    fn site() -> Context {
        SiteData {
            site: serde_json::json!({"title": "Notebook"}),
            args: serde_json::json!({"dest": "site"}),
            data: BTreeMap::from([("menu".to_string(), serde_json::json!(["home", "blog"]))]),
            posts: vec![],
        }
        .context()
    }

    fn renderer() -> Renderer {
        Renderer::new(FormatRegistry::with_defaults(), &MarkdownConfig::default()).unwrap()
    }

    #[test]
    fn test_render_markdown_with_layout_and_partial() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let header = write_entry(root, "_includes/header.html", "<h1>{{ site.title }}</h1>");
        let layout = write_entry(
            root,
            "_layout/default.html",
            "<html>{% include \"header\" %}<main>{{ content }}</main></html>",
        );

        let mut renderer = renderer();
        renderer.register_partials(&[header]).unwrap();
        renderer
            .register_layouts(&BTreeMap::from([("default".to_string(), layout)]))
            .unwrap();

        let doc = page(
            root,
            "index.md",
            serde_json::json!({"layout": "default", "title": "Home"}),
            "# {{ page.title }}",
        );
        let result = renderer.render(&doc, &site()).unwrap();

        assert_eq!(result.destination.file, "out.html");
        assert!(result.content.starts_with("<html><h1>Notebook</h1><main>"));
        assert!(result.content.contains("<h1>Home</h1>"));
        assert!(result.content.ends_with("</main></html>"));
    }

    #[test]
    fn test_render_data_in_body() {
        let dir = tempfile::tempdir().unwrap();
        let doc = page(
            dir.path(),
            "menu.html",
            serde_json::json!({}),
            "{% for item in data.menu %}[{{ item }}]{% endfor %}",
        );

        let result = renderer().render(&doc, &site()).unwrap();
        assert_eq!(result.content, "[home][blog]");
    }

    #[test]
    fn test_missing_layout_falls_back_to_content() {
        let dir = tempfile::tempdir().unwrap();
        let doc = page(
            dir.path(),
            "a.html",
            serde_json::json!({"layout": "nowhere"}),
            "<p>hi</p>",
        );

        let result = renderer().render(&doc, &site()).unwrap();
        assert_eq!(result.content, "<p>hi</p>");
    }

    #[test]
    fn test_template_error_names_source() {
        let dir = tempfile::tempdir().unwrap();
        let doc = page(dir.path(), "broken.html", serde_json::json!({}), "{% if %}");

        let err = renderer().render(&doc, &site()).unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
        assert!(err.to_string().contains("broken.html"));
    }

    #[test]
    fn test_raw_body_keeps_template_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let body = "Write `{{ name }}` to print a variable.";

        let doc = page(dir.path(), "guide.md", serde_json::json!({}), body);
        let err = renderer().render(&doc, &site()).unwrap_err();
        assert!(err.to_string().contains("guide.md"));

        let doc = page(dir.path(), "guide.md", serde_json::json!({"raw": true}), body);
        let result = renderer().render(&doc, &site()).unwrap();
        assert!(result.content.contains("<code>{{ name }}</code>"));
    }

    #[test]
    fn test_raw_body_still_gets_layout() {
        let dir = tempfile::tempdir().unwrap();
        let layout = write_entry(dir.path(), "_layout/default.html", "<main>{{ content }}</main>");
        let mut renderer = renderer();
        renderer
            .register_layouts(&BTreeMap::from([("default".to_string(), layout)]))
            .unwrap();

        let doc = page(
            dir.path(),
            "a.html",
            serde_json::json!({"layout": "default", "raw": "true"}),
            "{% raw %}",
        );
        let result = renderer.render(&doc, &site()).unwrap();
        assert_eq!(result.content, "<main>{% raw %}</main>");
    }

    #[test]
    fn test_layouts_can_extend_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let base = write_entry(
            root,
            "_layout/base.html",
            "<body>{% block main %}{% endblock main %}</body>",
        );
        let post = write_entry(
            root,
            "_layout/post.html",
            "{% extends \"layouts/base\" %}{% block main %}<article>{{ content }}</article>{% endblock main %}",
        );

        let mut renderer = renderer();
        renderer
            .register_layouts(&BTreeMap::from([
                ("base".to_string(), base),
                ("post".to_string(), post),
            ]))
            .unwrap();

        let doc = page(root, "p.html", serde_json::json!({"layout": "post"}), "x");
        let result = renderer.render(&doc, &site()).unwrap();
        assert_eq!(result.content, "<body><article>x</article></body>");
    }

    #[test]
    fn test_output_extension() {
        let renderer = renderer();
        assert_eq!(renderer.output_extension("md"), Some("html"));
        assert_eq!(renderer.output_extension("css"), None);
    }
}
