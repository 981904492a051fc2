use predictive_schemas::{normalize_tag, TagMetadata, Tagset};
use std::collections::HashMap;
use tracing::debug;

/// Co-occurrence ranker over historical tagsets
#[derive(Debug, Default, Clone, Copy)]
pub struct AssociationRanker;

impl AssociationRanker {
    pub fn new() -> Self {
        Self
    }

    /// Rank every tag that appears alongside `key_tag`.
    ///
    /// Counts are the number of matching tagsets containing the tag. The key
    /// tag itself is included. Ties keep first-seen order: store order of the
    /// matching tagsets, then sorted order inside each tagset.
    pub fn associated_tag_counts(&self, key_tag: &str, tagsets: &[Tagset]) -> Vec<TagMetadata> {
        let key = normalize_tag(key_tag);
        if key.is_empty() {
            return Vec::new();
        }

        let matches: Vec<&Tagset> = tagsets.iter().filter(|t| t.contains(&key)).collect();

        let mut ranked: Vec<TagMetadata> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for tagset in &matches {
            for tag in tagset.tags() {
                match positions.get(tag.as_str()) {
                    Some(&idx) => ranked[idx].count += 1,
                    None => {
                        positions.insert(tag.as_str(), ranked.len());
                        ranked.push(TagMetadata {
                            name: tag.clone(),
                            count: 1,
                        });
                    }
                }
            }
        }

        // Stable: equal counts stay in first-seen order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));

        debug!(
            "Ranked {} associated tags for '{}' across {} tagsets",
            ranked.len(),
            key,
            matches.len()
        );

        ranked
    }
}
