use predictive_indexing::AssociationRanker;
use predictive_schemas::{TagMetadata, Tagset};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::defaults;
use crate::error::StoreResult;
use crate::textfile;

/// Historical tagsets backed by `historical-data.txt`
pub struct TagsetStore {
    path: PathBuf,
    tagsets: Vec<Tagset>,
    seen: HashSet<Tagset>,
    ranker: AssociationRanker,
}

impl TagsetStore {
    /// Load from `path`, seeding the file from the built-in template when missing
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let content = textfile::read_or_seed(&path, defaults::HISTORICAL_DATA)?;

        let mut store = Self {
            path,
            tagsets: Vec::new(),
            seen: HashSet::new(),
            ranker: AssociationRanker::new(),
        };
        for line in textfile::data_lines(&content) {
            store.insert(Tagset::parse_line(&line));
        }

        info!(
            "Loaded {} tagsets from {}",
            store.tagsets.len(),
            store.path.display()
        );
        Ok(store)
    }

    /// Add an exported tagset. Returns false for duplicates and empty input.
    pub fn add<I, S>(&mut self, tags: I) -> StoreResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tagset = Tagset::from_tags(tags);
        if !self.insert(tagset.clone()) {
            debug!("Tagset '{}' already stored or empty", tagset);
            return Ok(false);
        }

        if let Err(e) = self.save() {
            self.tagsets.pop();
            self.seen.remove(&tagset);
            return Err(e);
        }

        info!("Stored new tagset: {}", tagset);
        Ok(true)
    }

    /// Set-merge the data lines of another historical-data file into this one.
    ///
    /// The existing file keeps its comments; the incoming comments are dropped.
    /// Returns the number of tagsets added.
    pub fn merge_content(&mut self, content: &str) -> StoreResult<usize> {
        let mut merged = Vec::new();
        let mut seen = self.seen.clone();
        for line in textfile::data_lines(content) {
            let tagset = Tagset::parse_line(&line);
            if !tagset.is_empty() && seen.insert(tagset.clone()) {
                merged.push(tagset);
            }
        }

        let added = merged.len();
        let all: Vec<&Tagset> = self.tagsets.iter().chain(merged.iter()).collect();
        self.write_lines(all.iter().map(|t| t.to_line()))?;

        self.tagsets.extend(merged);
        self.seen = seen;
        Ok(added)
    }

    pub fn associated_tag_counts(&self, key_tag: &str) -> Vec<TagMetadata> {
        self.ranker.associated_tag_counts(key_tag, &self.tagsets)
    }

    /// Whether any stored tagset containing `tag` also holds another tag
    pub fn has_multi_tag_match(&self, tag: &str) -> bool {
        self.tagsets.iter().any(|t| t.len() > 1 && t.contains(tag))
    }

    pub fn tagsets(&self) -> &[Tagset] {
        &self.tagsets
    }

    pub fn len(&self) -> usize {
        self.tagsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tagsets.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&mut self, tagset: Tagset) -> bool {
        if tagset.is_empty() || !self.seen.insert(tagset.clone()) {
            return false;
        }
        self.tagsets.push(tagset);
        true
    }

    fn save(&self) -> StoreResult<()> {
        self.write_lines(self.tagsets.iter().map(Tagset::to_line))
    }

    fn write_lines(&self, lines: impl Iterator<Item = String>) -> StoreResult<()> {
        let comments = textfile::existing_comments(&self.path)?;
        let lines: Vec<String> = lines.collect();
        textfile::write(&self.path, &textfile::render(&comments, &lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(content: &str) -> (TempDir, TagsetStore) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("historical-data.txt");
        std::fs::write(&path, content).unwrap();
        let store = TagsetStore::open(&path).unwrap();
        (temp, store)
    }

    #[test]
    fn test_seeds_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("historical-data.txt");

        let store = TagsetStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(!store.is_empty());
        assert!(store.has_multi_tag_match("owl"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let (_temp, mut store) = store_with("// header\n");

        assert!(store.add(["Owl", "forest"]).unwrap());
        assert!(!store.add(["FOREST", " owl "]).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.tagsets()[0].to_line(), "forest, owl");

        let reloaded = TagsetStore::open(store.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_add_rejects_empty() {
        let (_temp, mut store) = store_with("");
        assert!(!store.add(["", "  "]).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_preserves_comments() {
        let (_temp, mut store) =
            store_with("// DO NOT REMOVE THIS LINE [datatype=\"historical-data\"]\n\nowl, forest\n");
        store.add(["sea", "beach"]).unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            written,
            "// DO NOT REMOVE THIS LINE [datatype=\"historical-data\"]\n\nforest, owl\nbeach, sea\n"
        );
    }

    #[test]
    fn test_duplicates_collapse_on_load() {
        let (_temp, store) = store_with("owl, forest\nForest, OWL\nbird\n");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_single_tag_sets_do_not_hint() {
        let (_temp, store) = store_with("owl\nbird, wildlife\n");
        assert!(!store.has_multi_tag_match("owl"));
        assert!(store.has_multi_tag_match("Bird"));
    }

    #[test]
    fn test_merge_is_set_union() {
        let (_temp, mut store) = store_with("// mine\nowl, forest\n");

        let added = store
            .merge_content("// theirs\nforest, owl\nsea, beach\n")
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len(), 2);

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert!(written.contains("// mine"));
        assert!(!written.contains("// theirs"));
    }
}
