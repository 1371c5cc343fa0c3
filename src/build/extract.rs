//! Front matter extraction.
//!
//! Splits a templated source file into its front matter and body, and
//! works out where the rendered result goes.

use std::path::PathBuf;

use serde_json::Value;

use super::classify::FileEntry;
use super::document::{Destination, FrontMatter};
use super::paths::with_output_extension;

/// Line that opens and closes a front matter block.
const DELIMITER: &str = "---";

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed front matter in {}: {message}", path.display())]
    FrontMatter { path: PathBuf, message: String },
}

/// Result of parsing front matter from a document.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The content without the front matter block
    pub content: String,
}

/// A file split into metadata, body and output location.
#[derive(Debug)]
pub struct Extracted {
    pub front_matter: FrontMatter,
    pub content: String,
    pub destination: Destination,
}

/// Read `entry` and extract its front matter, body and destination.
///
/// The destination mirrors the entry's folder, with the file extension
/// replaced by `output_extension`.
pub fn extract(entry: &FileEntry, output_extension: &str) -> Result<Extracted, ExtractError> {
    let raw = std::fs::read_to_string(&entry.path).map_err(|e| ExtractError::Read {
        path: entry.path.clone(),
        source: e,
    })?;

    let parsed = parse_front_matter(&raw).map_err(|message| ExtractError::FrontMatter {
        path: entry.relative.clone(),
        message,
    })?;

    Ok(Extracted {
        front_matter: parsed.front_matter,
        content: parsed.content,
        destination: Destination {
            folder: entry.base_dir.clone(),
            file: with_output_extension(&entry.name, output_extension),
        },
    })
}

/// Parse front matter from document content.
///
/// Front matter is a YAML mapping delimited by `---` lines at the start of
/// the file:
///
/// ```markdown
/// ---
/// title: My Page
/// layout: default
/// ---
///
/// # Content starts here
/// ```
///
/// Content without an opening delimiter, or without a closing one, has no
/// front matter. A block that is present but isn't a valid YAML mapping is
/// an error.
pub fn parse_front_matter(content: &str) -> Result<ParsedContent, String> {
    let content = content.trim_start_matches('\u{feff}');
    let no_front_matter = || ParsedContent {
        front_matter: FrontMatter::default(),
        content: content.to_string(),
    };

    let Some(rest) = content.strip_prefix(DELIMITER) else {
        return Ok(no_front_matter());
    };
    let Some((opening, after_opening)) = rest.split_once('\n') else {
        return Ok(no_front_matter());
    };
    if !opening.trim().is_empty() {
        return Ok(no_front_matter());
    }

    // Find the closing delimiter line
    let mut offset = 0;
    let mut block = None;
    for line in after_opening.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            block = Some((&after_opening[..offset], &after_opening[offset + line.len()..]));
            break;
        }
        offset += line.len();
    }

    let Some((yaml, body)) = block else {
        return Ok(no_front_matter());
    };

    Ok(ParsedContent {
        front_matter: parse_yaml_mapping(yaml)?,
        content: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

fn parse_yaml_mapping(yaml: &str) -> Result<FrontMatter, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

    match value {
        serde_yaml::Value::Null => Ok(FrontMatter::default()),
        serde_yaml::Value::Mapping(_) => match serde_json::to_value(&value) {
            Ok(Value::Object(map)) => Ok(FrontMatter(map)),
            Ok(_) => Err("front matter must be a mapping".to_string()),
            Err(e) => Err(e.to_string()),
        },
        _ => Err("front matter must be a mapping".to_string()),
    }
}
