//! Content formats.
//!
//! A generic project file becomes a page only if a format is registered
//! for its extension. Everything else is copied to the output verbatim.
//! Formats turn a (template-expanded) body into an HTML fragment.

use pulldown_cmark::Options;

use crate::build::markdown::render_markdown;

/// A content format that can render a document body to HTML.
pub trait ContentFormat: Send + Sync {
    /// The name of this format (e.g., "markdown").
    #[allow(dead_code)]
    fn name(&self) -> &'static str;

    /// File extensions this format handles (lowercase, without dot).
    fn extensions(&self) -> &[&'static str];

    /// Extension of the rendered output file.
    fn output_extension(&self) -> &'static str {
        "html"
    }

    /// Render a body to HTML.
    fn render(&self, content: &str, ctx: &FormatContext) -> String;
}

/// Context available during format rendering.
pub struct FormatContext {
    pub markdown_options: Options,
}

/// Markdown bodies, rendered with pulldown-cmark.
pub struct MarkdownFormat;

impl ContentFormat for MarkdownFormat {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extensions(&self) -> &[&'static str] {
        &["md", "markdown"]
    }

    fn render(&self, content: &str, ctx: &FormatContext) -> String {
        render_markdown(content, ctx.markdown_options)
    }
}

/// HTML bodies, passed through unchanged.
pub struct HtmlFormat;

impl ContentFormat for HtmlFormat {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extensions(&self) -> &[&'static str] {
        &["html", "htm"]
    }

    fn render(&self, content: &str, _ctx: &FormatContext) -> String {
        content.to_string()
    }
}

/// Registry of content formats, looked up by extension.
pub struct FormatRegistry {
    formats: Vec<Box<dyn ContentFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// A registry with Markdown and HTML.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MarkdownFormat);
        registry.register(HtmlFormat);
        registry
    }

    /// Register a new format. Later registrations take precedence.
    pub fn register<F: ContentFormat + 'static>(&mut self, format: F) {
        self.formats.push(Box::new(format));
    }

    /// Find the format for a file extension (case-insensitive).
    pub fn for_extension(&self, ext: &str) -> Option<&dyn ContentFormat> {
        let ext_lower = ext.to_lowercase();
        self.formats
            .iter()
            .rev()
            .find(|f| f.extensions().iter().any(|e| *e == ext_lower))
            .map(|f| f.as_ref())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
