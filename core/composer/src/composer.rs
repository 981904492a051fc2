use predictive_ingestion::{LearnLedger, NotifyList, Stores, TagsetStore};
use predictive_schemas::{same_tag, Suggestion};
use std::collections::HashMap;
use tracing::debug;

/// Builds the suggestion list for a selected tag
#[derive(Debug, Default, Clone, Copy)]
pub struct SuggestionComposer;

impl SuggestionComposer {
    pub fn new() -> Self {
        Self
    }

    /// Promoted suggestions followed by historical ones, notify-listed tags removed
    pub fn compose(
        &self,
        tag: &str,
        ledger: &LearnLedger,
        tagsets: &TagsetStore,
        notify: &NotifyList,
    ) -> Vec<Suggestion> {
        without_notify_tags(self.rank(tag, ledger, tagsets), notify)
    }

    pub fn compose_from(&self, tag: &str, stores: &Stores) -> Vec<Suggestion> {
        self.compose(tag, stores.ledger(), stores.tagsets(), stores.notify())
    }

    /// The composed list before notify filtering; this is what gets cached
    pub fn rank(&self, tag: &str, ledger: &LearnLedger, tagsets: &TagsetStore) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = ledger
            .query(tag)
            .into_iter()
            .filter(|s| !same_tag(&s.suggest, tag))
            .map(|s| Suggestion::promoted(s.suggest, s.band))
            .collect();
        let promoted = suggestions.len();

        for meta in tagsets.associated_tag_counts(tag) {
            if same_tag(&meta.name, tag)
                || suggestions[..promoted]
                    .iter()
                    .any(|s| same_tag(&s.text, &meta.name))
            {
                continue;
            }
            suggestions.push(Suggestion::historical(meta.name));
        }

        debug!(
            "Composed {} suggestions for '{}' ({} promoted)",
            suggestions.len(),
            tag,
            promoted
        );
        suggestions
    }
}

/// Drop every suggestion that is on the notify list
pub fn without_notify_tags(suggestions: Vec<Suggestion>, notify: &NotifyList) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .filter(|s| !notify.contains(&s.text))
        .collect()
}

/// Case-insensitive starts-with filter
pub fn filter_by_prefix(suggestions: &[Suggestion], prefix: &str) -> Vec<Suggestion> {
    let prefix = prefix.trim().to_lowercase();
    suggestions
        .iter()
        .filter(|s| s.text.to_lowercase().starts_with(&prefix))
        .cloned()
        .collect()
}

/// Composed lists remembered per tag slot, valid only while the slot text is unchanged
#[derive(Debug, Default)]
pub struct SuggestionCache {
    slots: HashMap<usize, CachedList>,
}

#[derive(Debug)]
struct CachedList {
    tag: String,
    suggestions: Vec<Suggestion>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list for `slot`. A different tag text misses and evicts the slot.
    pub fn get(&mut self, slot: usize, tag: &str) -> Option<&[Suggestion]> {
        let stale = match self.slots.get(&slot) {
            Some(cached) => !same_tag(&cached.tag, tag),
            None => return None,
        };
        if stale {
            self.slots.remove(&slot);
            return None;
        }
        self.slots.get(&slot).map(|c| c.suggestions.as_slice())
    }

    pub fn insert(&mut self, slot: usize, tag: &str, suggestions: Vec<Suggestion>) {
        self.slots.insert(
            slot,
            CachedList {
                tag: tag.to_string(),
                suggestions,
            },
        );
    }

    /// Forget `slot`, e.g. after its text changed
    pub fn invalidate(&mut self, slot: usize) {
        self.slots.remove(&slot);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictive_schemas::DataKind;
    use predictive_ingestion::DataPaths;
    use tempfile::TempDir;

    const EMPTY_LEDGER: &str = "<root datatype=\"learn-data\" comment=\"\"></root>\n";

    fn stores_with(historical: &str, learn: &str, notify: &str) -> (TempDir, Stores) {
        let temp = TempDir::new().unwrap();
        let paths = DataPaths::new(temp.path());
        std::fs::write(paths.path(DataKind::HistoricalData), historical).unwrap();
        std::fs::write(paths.path(DataKind::LearnData), learn).unwrap();
        std::fs::write(paths.path(DataKind::NotifyData), notify).unwrap();
        let stores = Stores::open(temp.path()).unwrap();
        (temp, stores)
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_historical_only() {
        let (_temp, stores) =
            stores_with("bird, owl, wildlife\nowl, forest\n", EMPTY_LEDGER, "");
        let composed = SuggestionComposer::new().compose_from("owl", &stores);

        assert_eq!(texts(&composed), vec!["bird", "wildlife", "forest"]);
        assert!(composed.iter().all(|s| !s.promoted));
    }

    #[test]
    fn test_promoted_first_without_duplicates() {
        let (_temp, stores) = stores_with(
            "bird, owl, wildlife\nowl, forest\n",
            r#"<root datatype="learn-data" comment="">
  <item tag="owl" suggest="forest" score="3" />
  <item tag="owl" suggest="night" score="1" />
  <item tag="owl" suggest="owl" score="9" />
</root>"#,
            "",
        );
        let composed = SuggestionComposer::new().compose_from("OWL", &stores);

        assert_eq!(texts(&composed), vec!["forest", "night", "bird", "wildlife"]);
        assert!(composed[0].promoted && composed[1].promoted);
        assert!(composed[0].priority > composed[1].priority);
        assert_eq!(composed[2].priority, 0);
    }

    #[test]
    fn test_notify_tags_are_filtered() {
        let (_temp, stores) = stores_with(
            "bird, owl, wildlife\nowl, forest\n",
            r#"<root datatype="learn-data" comment="">
  <item tag="owl" suggest="spam" score="3" />
</root>"#,
            "spam\nforest\n",
        );
        let composer = SuggestionComposer::new();

        let ranked = composer.rank("owl", stores.ledger(), stores.tagsets());
        assert_eq!(texts(&ranked), vec!["spam", "bird", "wildlife", "forest"]);

        let composed = composer.compose_from("owl", &stores);
        assert_eq!(texts(&composed), vec!["bird", "wildlife"]);
    }

    #[test]
    fn test_unknown_tag_is_empty() {
        let (_temp, stores) = stores_with("bird, owl\n", EMPTY_LEDGER, "");
        assert!(SuggestionComposer::new()
            .compose_from("submarine", &stores)
            .is_empty());
    }

    #[test]
    fn test_filter_by_prefix() {
        let list = vec![
            Suggestion::historical("wildlife"),
            Suggestion::historical("bird"),
            Suggestion::historical("Wilderness"),
        ];
        assert_eq!(
            texts(&filter_by_prefix(&list, " WIL")),
            vec!["wildlife", "Wilderness"]
        );
        assert_eq!(filter_by_prefix(&list, "").len(), 3);
    }

    #[test]
    fn test_cache_evicts_on_text_change() {
        let mut cache = SuggestionCache::new();
        cache.insert(0, "owl", vec![Suggestion::historical("bird")]);
        cache.insert(1, "sea", vec![Suggestion::historical("beach")]);

        assert_eq!(cache.get(0, "Owl").map(|l| l.len()), Some(1));
        assert!(cache.get(0, "owls").is_none());
        assert!(cache.get(0, "owl").is_none());

        cache.invalidate(1);
        assert!(cache.is_empty());
    }
}
