//! Line-oriented data files with `//` comment lines.
//!
//! Comment lines are hoisted above the data on every rewrite, followed by a
//! single blank line.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{StoreError, StoreResult};

pub const COMMENT_PREFIX: &str = "//";

/// Non-comment, non-blank lines, trimmed and lower-cased
pub fn data_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
        .filter(|line| !is_sentinel(line))
        .collect()
}

/// Comment lines, trimmed but otherwise verbatim
pub fn comment_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(COMMENT_PREFIX))
        .map(str::to_string)
        .collect()
}

pub fn render<S: AsRef<str>>(comments: &[String], data: &[S]) -> String {
    let mut out = String::new();
    for line in comments {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    for line in data {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// Read a data file, seeding it from `default` when it does not exist yet
pub fn read_or_seed(path: &Path, default: &str) -> StoreResult<String> {
    if path.exists() {
        return fs::read_to_string(path).map_err(|e| StoreError::io(path, e));
    }

    info!("Seeding {} from built-in template", path.display());
    write(path, default)?;
    Ok(default.to_string())
}

pub fn read(path: &Path) -> StoreResult<String> {
    fs::read_to_string(path).map_err(|e| StoreError::io(path, e))
}

pub fn write(path: &Path, content: &str) -> StoreResult<()> {
    fs::write(path, content).map_err(|e| StoreError::io(path, e))
}

/// Existing comment lines of `path`, empty when the file is missing
pub fn existing_comments(path: &Path) -> StoreResult<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(comment_lines(&read(path)?))
}

fn is_sentinel(line: &str) -> bool {
    line.replace(' ', "").contains("datatype=\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "// DO NOT REMOVE THIS LINE [datatype=\"historical-data\"]\r\n\
                          // Demo file\r\n\
                          \r\n\
                          \tAnimal, Bird \r\n\
                          \r\n\
                          \x20 // trailing note\r\n\
                          fog, forest\r\n";

    #[test]
    fn test_data_lines_skip_comments_and_blanks() {
        assert_eq!(data_lines(SAMPLE), vec!["animal, bird", "fog, forest"]);
    }

    #[test]
    fn test_comment_lines_are_hoisted() {
        let comments = comment_lines(SAMPLE);
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[2], "// trailing note");

        let rendered = render(&comments, &["a, b"]);
        assert!(rendered.starts_with("// DO NOT REMOVE THIS LINE"));
        assert!(rendered.ends_with("// trailing note\n\na, b\n"));
    }

    #[test]
    fn test_sentinel_data_line_is_skipped() {
        let content = "datatype=\"notify-data\"\nspam\n";
        assert_eq!(data_lines(content), vec!["spam"]);
    }
}
