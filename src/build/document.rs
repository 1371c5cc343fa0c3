use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use super::classify::FileEntry;
use super::extract::Extracted;
use super::paths::{destination_url, post_destination, post_url};
use crate::util::slugify;

/// Layout applied to posts that don't name one.
pub const DEFAULT_POST_LAYOUT: &str = "post";

// =============================================================================
// Front matter
// =============================================================================

/// Front matter metadata parsed from a document.
///
/// Arbitrary keys are allowed; `layout`, `url`, `category` and `ignore`
/// are the ones the build itself reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter(pub Map<String, Value>);

impl FrontMatter {
    /// A scalar field as text. Numbers and booleans are stringified,
    /// `null` and structured values are treated as absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn layout(&self) -> Option<String> {
        self.get_str("layout").filter(|l| !l.is_empty())
    }

    pub fn url(&self) -> Option<String> {
        self.get_str("url")
    }

    pub fn category(&self) -> Option<String> {
        self.get_str("category")
    }

    /// Whether the document is excluded from output.
    pub fn ignore(&self) -> bool {
        self.flag("ignore")
    }

    /// `raw: true` keeps the body out of the template engine.
    pub fn raw(&self) -> bool {
        self.flag("raw")
    }

    fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }
}

// =============================================================================
// Destinations and results
// =============================================================================

/// Where a rendered document is written, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub folder: PathBuf,
    pub file: String,
}

impl Destination {
    /// The full output path under `output_dir`.
    pub fn path_in(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.folder).join(&self.file)
    }
}

/// The rendered form of one document.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub destination: Destination,
    pub content: String,
}

// =============================================================================
// Documents
// =============================================================================

/// A templated source file ready for rendering.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The file this entry was extracted from
    pub source: FileEntry,
    pub front_matter: FrontMatter,
    /// Body without the front matter block
    pub body: String,
    pub destination: Destination,
    /// Source extension (e.g., "md"), selects the content format
    pub kind: String,
    /// Site-absolute URL (e.g., "/blog/news/hello-world")
    pub url: String,
}

/// A document is either a standalone page or a blog post.
#[derive(Debug, Clone)]
pub enum Document {
    Page(Entry),
    Post(Entry),
}

impl Document {
    /// Build a page from an extracted file.
    pub fn page(source: FileEntry, extracted: Extracted) -> Self {
        let url = destination_url(&extracted.destination);
        Document::Page(Entry {
            kind: source.extension.clone(),
            source,
            front_matter: extracted.front_matter,
            body: extracted.content,
            destination: extracted.destination,
            url,
        })
    }

    /// Build a post from an extracted file.
    ///
    /// Posts default to the `post` layout and live at
    /// `/blog/<category>/<url>/index.html`, both parts slugified. The
    /// front matter `url` falls back to the file stem.
    pub fn post(source: FileEntry, extracted: Extracted) -> Self {
        let mut front_matter = extracted.front_matter;
        if front_matter.layout().is_none() {
            front_matter.set("layout", DEFAULT_POST_LAYOUT);
        }

        let category = front_matter
            .category()
            .map(|c| slugify(&c))
            .unwrap_or_default();
        let slug = front_matter
            .url()
            .map(|u| slugify(&u))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(source.stem()));

        let url = post_url(&category, &slug);
        let destination = post_destination(&url);

        Document::Post(Entry {
            kind: source.extension.clone(),
            source,
            front_matter,
            body: extracted.content,
            destination,
            url,
        })
    }

    pub fn entry(&self) -> &Entry {
        match self {
            Document::Page(entry) | Document::Post(entry) => entry,
        }
    }

    /// The view of this document handed to templates as `page` (or as an
    /// element of `posts`).
    pub fn view(&self) -> PageView<'_> {
        let entry = self.entry();
        PageView {
            front_matter: &entry.front_matter,
            url: &entry.url,
            kind: &entry.kind,
            name: &entry.source.name,
            path: entry.source.relative.to_string_lossy().replace('\\', "/"),
            data: &entry.front_matter,
            body: &entry.body,
        }
    }
}

/// Template-facing view of a document.
///
/// Front matter keys are promoted to the top level (`page.title`); the
/// computed fields are written after them and take precedence.
#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    #[serde(flatten)]
    pub front_matter: &'a FrontMatter,
    pub url: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub name: &'a str,
    pub path: String,
    /// The front matter again, as a nested mapping
    pub data: &'a FrontMatter,
    /// Raw body, before rendering
    pub body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(front_matter: Value, folder: &str, file: &str) -> Extracted {
        Extracted {
            front_matter: FrontMatter(front_matter.as_object().cloned().unwrap_or_default()),
            content: "Body".to_string(),
            destination: Destination {
                folder: PathBuf::from(folder),
                file: file.to_string(),
            },
        }
    }

    fn source(relative: &str) -> FileEntry {
        FileEntry::new(Path::new("/p"), Path::new("/p").join(relative), false).unwrap()
    }

    #[test]
    fn test_front_matter_accessors() {
        let fm = FrontMatter(
            serde_json::json!({
                "layout": "default",
                "url": 2024,
                "ignore": "true",
                "tags": ["a", "b"],
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        assert_eq!(fm.layout().as_deref(), Some("default"));
        assert_eq!(fm.url().as_deref(), Some("2024"));
        assert_eq!(fm.category(), None);
        assert_eq!(fm.get_str("tags"), None);
        assert!(fm.ignore());
    }

    #[test]
    fn test_page_keeps_extracted_destination() {
        let doc = Document::page(
            source("docs/guide.md"),
            extracted(serde_json::json!({"title": "Guide"}), "docs", "guide.html"),
        );

        let entry = doc.entry();
        assert!(matches!(doc, Document::Page(_)));
        assert_eq!(entry.kind, "md");
        assert_eq!(entry.url, "/docs/guide.html");
        assert_eq!(entry.front_matter.layout(), None);
    }

    #[test]
    fn test_post_url_and_layout() {
        let doc = Document::post(
            source("_posts/hello.md"),
            extracted(
                serde_json::json!({"url": "Hello World", "category": "News"}),
                "_posts",
                "hello.html",
            ),
        );

        let entry = doc.entry();
        assert!(matches!(doc, Document::Post(_)));
        assert_eq!(entry.url, "/blog/news/hello-world");
        assert_eq!(entry.front_matter.layout().as_deref(), Some("post"));
        assert_eq!(
            entry.destination,
            Destination {
                folder: PathBuf::from("blog/news/hello-world"),
                file: "index.html".to_string(),
            }
        );
    }

    #[test]
    fn test_post_without_category() {
        let doc = Document::post(
            source("_posts/hello.md"),
            extracted(serde_json::json!({"url": "Hello World"}), "_posts", "hello.html"),
        );

        assert_eq!(doc.entry().url, "/blog/hello-world");
    }

    #[test]
    fn test_post_keeps_explicit_layout() {
        let doc = Document::post(
            source("_posts/hello.md"),
            extracted(serde_json::json!({"layout": "essay"}), "_posts", "hello.html"),
        );

        assert_eq!(doc.entry().front_matter.layout().as_deref(), Some("essay"));
    }

    #[test]
    fn test_post_url_falls_back_to_stem() {
        let doc = Document::post(
            source("_posts/First_Steps.md"),
            extracted(serde_json::json!({}), "_posts", "First_Steps.html"),
        );

        assert_eq!(doc.entry().url, "/blog/first-steps");
    }

    #[test]
    fn test_view_promotes_front_matter() {
        let doc = Document::post(
            source("_posts/hello.md"),
            extracted(
                serde_json::json!({"title": "Hi", "url": "Hello World"}),
                "_posts",
                "hello.html",
            ),
        );

        let value = serde_json::to_value(doc.view()).unwrap();
        assert_eq!(value["title"], "Hi");
        assert_eq!(value["type"], "md");
        assert_eq!(value["url"], "/blog/hello-world");
        assert_eq!(value["data"]["url"], "Hello World");
        assert_eq!(value["path"], "_posts/hello.md");
    }
}
