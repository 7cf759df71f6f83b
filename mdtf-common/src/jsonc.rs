//! JSON-with-comments table loading
//!
//! Vocabulary and field-list tables are JSON files that may carry `//`
//! comments, either on a line of their own or trailing a value. A delimiter
//! inside a double-quoted string (e.g. a URL) is not a comment.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Comment delimiter used by the tables
pub const COMMENT_DELIMITER: &str = "//";

/// Remove `delimiter` comments and blank lines from `text`
///
/// A delimiter only starts a comment when an even number of `"` precede it
/// on the line.
pub fn strip_comments(text: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        return text.to_string();
    }
    text.lines()
        .map(|line| {
            let mut quotes = 0;
            let mut offset = 0;
            for part in line.split(delimiter) {
                if quotes % 2 == 0 && offset > 0 {
                    return &line[..offset - delimiter.len()];
                }
                quotes += part.matches('"').count();
                offset += part.len() + delimiter.len();
            }
            line
        })
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse commented JSON text into `T`
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(&strip_comments(text, COMMENT_DELIMITER))?)
}

/// Read and parse a commented JSON file
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Couldn't read JSON file {}: {}", path.display(), e))
    })?;
    parse(&text)
}
