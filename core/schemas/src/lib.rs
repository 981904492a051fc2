use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Tag Normalization
// ============================================================================

/// Canonical form of a single tag: commas stripped, trimmed, lower-cased.
pub fn normalize_tag(raw: &str) -> String {
    raw.replace(',', "").trim().to_lowercase()
}

/// Tag comparison on canonical forms, so it agrees with [`normalize_tag`]
pub fn same_tag(a: &str, b: &str) -> bool {
    normalize_tag(a) == normalize_tag(b)
}

// ============================================================================
// Tagset Schema
// ============================================================================

/// A set of tags exported together.
///
/// Tags are normalized, de-duplicated and kept sorted ascending, so two
/// tagsets are equal exactly when their sorted, lower-cased joins are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tagset(Vec<String>);

impl Tagset {
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = tags
            .into_iter()
            .map(|t| normalize_tag(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        tags.sort();
        tags.dedup();
        Self(tags)
    }

    /// Parse a `tag1, tag2, tag3` data line
    pub fn parse_line(line: &str) -> Self {
        Self::from_tags(line.split(','))
    }

    /// Serialize as a data line (comma-space separated)
    pub fn to_line(&self) -> String {
        self.0.join(", ")
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        self.0.iter().any(|t| *t == tag)
    }
}

impl fmt::Display for Tagset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

// ============================================================================
// Learned Association Schema
// ============================================================================

/// Explicit association between a tag and an accepted suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnEntry {
    pub tag: String,
    pub suggest: String,
    pub score: u32,
}

impl LearnEntry {
    pub fn new(tag: &str, suggest: &str, score: u32) -> Self {
        Self {
            tag: normalize_tag(tag),
            suggest: normalize_tag(suggest),
            score,
        }
    }

    pub fn matches(&self, tag: &str, suggest: &str) -> bool {
        same_tag(&self.tag, tag) && same_tag(&self.suggest, suggest)
    }
}

// ============================================================================
// Ranking Results
// ============================================================================

/// Co-occurrence count for one associated tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMetadata {
    pub name: String,
    pub count: usize,
}

/// Display priority derived from a learned score tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBand {
    /// Tier index, 0 for the lowest distinct score
    pub tier: usize,
    /// Number of distinct scores for the queried tag
    pub tiers: usize,
    pub priority: u8,
}

/// A learned suggestion together with its band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandedSuggestion {
    pub suggest: String,
    pub score: u32,
    pub band: PriorityBand,
}

/// Priority carried by suggestions that come from historical co-occurrence only
pub const NEUTRAL_PRIORITY: u8 = 0;

/// One entry of a composed suggestion list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub promoted: bool,
    pub priority: u8,
}

impl Suggestion {
    pub fn promoted(text: impl Into<String>, band: PriorityBand) -> Self {
        Self {
            text: text.into(),
            promoted: true,
            priority: band.priority,
        }
    }

    pub fn historical(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            promoted: false,
            priority: NEUTRAL_PRIORITY,
        }
    }
}

// ============================================================================
// Data File Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    #[serde(rename = "learn-data")]
    LearnData,
    #[serde(rename = "historical-data")]
    HistoricalData,
    #[serde(rename = "notify-data")]
    NotifyData,
    #[serde(rename = "config")]
    Config,
}

impl DataKind {
    pub const ALL: [DataKind; 4] = [
        DataKind::LearnData,
        DataKind::HistoricalData,
        DataKind::NotifyData,
        DataKind::Config,
    ];

    /// Value of the `datatype="..."` marker
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::LearnData => "learn-data",
            DataKind::HistoricalData => "historical-data",
            DataKind::NotifyData => "notify-data",
            DataKind::Config => "config",
        }
    }

    /// Expected file extension, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            DataKind::LearnData | DataKind::Config => ".xml",
            DataKind::HistoricalData | DataKind::NotifyData => ".txt",
        }
    }

    /// File name inside the data directory
    pub fn file_name(&self) -> String {
        format!("{}{}", self.as_str(), self.extension())
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(marker.trim()))
    }

    pub fn supports_merge(&self) -> bool {
        !matches!(self, DataKind::Config)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    #[serde(rename = "merge")]
    Merge,
    #[serde(rename = "replace")]
    Replace,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Merge => "merge",
            MergeMode::Replace => "replace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagset_normalization() {
        let tagset = Tagset::from_tags(["  Wildlife", "OWL ", "bird", "owl", ""]);
        assert_eq!(tagset.tags(), &["bird", "owl", "wildlife"]);
        assert_eq!(tagset.to_line(), "bird, owl, wildlife");
        assert!(tagset.contains("Owl"));
        assert!(!tagset.contains("forest"));
    }

    #[test]
    fn test_same_tag_matches_normalized_form() {
        assert!(same_tag(" Rock,Roll ", "rockroll"));
        assert!(same_tag("OWL", "owl"));
        assert!(!same_tag("owl", "owls"));
    }

    #[test]
    fn test_tagset_equality_ignores_order_and_case() {
        let a = Tagset::parse_line("Forest, owl");
        let b = Tagset::parse_line("owl,FOREST");
        assert_eq!(a, b);
    }

    #[test]
    fn test_data_kind_markers() {
        assert_eq!(DataKind::from_marker("Learn-Data"), Some(DataKind::LearnData));
        assert_eq!(DataKind::from_marker("notify-data"), Some(DataKind::NotifyData));
        assert_eq!(DataKind::from_marker("playlist"), None);
        assert_eq!(DataKind::HistoricalData.file_name(), "historical-data.txt");
        assert_eq!(DataKind::Config.extension(), ".xml");
        assert!(!DataKind::Config.supports_merge());
    }

    #[test]
    fn test_suggestion_serialization() {
        let band = PriorityBand {
            tier: 1,
            tiers: 2,
            priority: 85,
        };
        let suggestion = Suggestion::promoted("art", band);

        let json = serde_json::to_string(&suggestion).unwrap();
        let deserialized: Suggestion = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, suggestion);
        assert!(deserialized.promoted);
        assert_eq!(deserialized.priority, 85);

        let historical = Suggestion::historical("forest");
        assert_eq!(historical.priority, NEUTRAL_PRIORITY);
    }

    #[test]
    fn test_data_kind_serialization() {
        let json = serde_json::to_string(&DataKind::HistoricalData).unwrap();
        assert_eq!(json, "\"historical-data\"");
    }
}
