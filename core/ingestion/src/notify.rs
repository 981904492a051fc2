use predictive_schemas::normalize_tag;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::defaults;
use crate::error::StoreResult;
use crate::textfile;

/// Tags that should not be suggested or exported silently (`notify-data.txt`)
pub struct NotifyList {
    path: PathBuf,
    tags: Vec<String>,
}

impl NotifyList {
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let content = textfile::read_or_seed(&path, defaults::NOTIFY_DATA)?;

        let mut list = Self {
            path,
            tags: Vec::new(),
        };
        for line in textfile::data_lines(&content) {
            list.insert(&line);
        }

        info!(
            "Loaded {} notify tags from {}",
            list.tags.len(),
            list.path.display()
        );
        Ok(list)
    }

    /// Add a tag in memory. Returns false when already present or empty.
    pub fn add(&mut self, tag: &str) -> bool {
        self.insert(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        self.tags.iter().any(|t| *t == tag)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    /// Tags of `tags` that are on the list, in input order
    pub fn intersect<S: AsRef<str>>(&self, tags: &[S]) -> Vec<String> {
        tags.iter()
            .map(|t| normalize_tag(t.as_ref()))
            .filter(|t| self.contains(t))
            .collect()
    }

    /// Set-merge another notify-data file; existing comments are kept.
    pub fn merge_content(&mut self, content: &str) -> StoreResult<usize> {
        let mut merged = self.tags.clone();
        for line in textfile::data_lines(content) {
            let tag = normalize_tag(&line);
            if !tag.is_empty() && !merged.contains(&tag) {
                merged.push(tag);
            }
        }

        let added = merged.len() - self.tags.len();
        let comments = textfile::existing_comments(&self.path)?;
        textfile::write(&self.path, &textfile::render(&comments, &merged))?;

        self.tags = merged;
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }
}
