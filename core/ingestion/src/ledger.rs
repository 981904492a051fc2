use predictive_indexing::{band_entries, dense_ranks};
use predictive_schemas::{normalize_tag, same_tag, BandedSuggestion, LearnEntry};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::defaults;
use crate::error::{StoreError, StoreResult};
use crate::textfile::{self, COMMENT_PREFIX};

const DATATYPE: &str = "learn-data";

/// Explicit tag → suggestion associations backed by `learn-data.xml`
pub struct LearnLedger {
    path: PathBuf,
    entries: Vec<LearnEntry>,
    comment: Option<String>,
}

impl LearnLedger {
    /// Load from `path`, seeding the file when missing.
    ///
    /// A document that fails to parse leaves the ledger empty and the file
    /// untouched; a successful load rewrites the file in canonical order.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let content = textfile::read_or_seed(&path, defaults::LEARN_DATA)?;

        let mut ledger = Self {
            path,
            entries: Vec::new(),
            comment: None,
        };

        match parse_learn_document(&content) {
            Ok(parsed) => {
                ledger.entries = parsed.entries;
                ledger.comment = parsed.comment;
                if let Err(e) = ledger.save() {
                    warn!("Failed to rewrite {}: {}", ledger.path.display(), e);
                }
            }
            Err(e) => {
                warn!(
                    "Failed to parse {}: {}; starting with an empty ledger",
                    ledger.path.display(),
                    e
                );
            }
        }

        info!(
            "Loaded {} learn entries from {}",
            ledger.entries.len(),
            ledger.path.display()
        );
        Ok(ledger)
    }

    /// Reinforce `tag` → `suggestion`, returning the new score
    pub fn record_association(&mut self, tag: &str, suggestion: &str) -> StoreResult<u32> {
        let (tag, suggestion) = normalized_pair(tag, suggestion)?;

        let score = match self.position(&tag, &suggestion) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.score = entry.score.saturating_add(1);
                let score = entry.score;
                if let Err(e) = self.save() {
                    self.entries[idx].score -= 1;
                    return Err(e);
                }
                score
            }
            None => {
                self.entries.push(LearnEntry::new(&tag, &suggestion, 1));
                if let Err(e) = self.save() {
                    self.entries.pop();
                    return Err(e);
                }
                1
            }
        };

        debug!("Association {} -> {} now at score {}", tag, suggestion, score);
        Ok(score)
    }

    /// Unrelate `tag` and `suggestion`. Returns false when no entry matched.
    pub fn remove_association(&mut self, tag: &str, suggestion: &str) -> StoreResult<bool> {
        let Some(idx) = self.position(tag, suggestion) else {
            return Ok(false);
        };

        let removed = self.entries.remove(idx);
        if let Err(e) = self.save() {
            self.entries.insert(idx, removed);
            return Err(e);
        }

        info!("Removed association {} -> {}", removed.tag, removed.suggest);
        Ok(true)
    }

    /// Promoted suggestions for `tag`, highest score first
    pub fn query(&self, tag: &str) -> Vec<BandedSuggestion> {
        band_entries(self.entries.iter().filter(|e| same_tag(&e.tag, tag)))
    }

    pub fn has_entries(&self, tag: &str) -> bool {
        self.entries.iter().any(|e| same_tag(&e.tag, tag))
    }

    /// Rewrite each tag's scores as dense ranks starting at 1.
    ///
    /// Returns the number of entries whose score changed.
    pub fn normalize<S: AsRef<str>>(&mut self, tags: &[S]) -> StoreResult<usize> {
        let mut seen = HashSet::new();
        let mut normalized = self.entries.clone();
        let mut changed = 0;

        for tag in tags {
            let tag = normalize_tag(tag.as_ref());
            if tag.is_empty() || !seen.insert(tag.clone()) {
                continue;
            }

            let indices: Vec<usize> = normalized
                .iter()
                .enumerate()
                .filter(|(_, e)| e.tag == tag)
                .map(|(i, _)| i)
                .collect();
            let scores: Vec<u32> = indices.iter().map(|&i| normalized[i].score).collect();

            for (&idx, rank) in indices.iter().zip(dense_ranks(&scores)) {
                if normalized[idx].score != rank {
                    normalized[idx].score = rank;
                    changed += 1;
                }
            }
        }

        if seen.is_empty() {
            return Ok(0);
        }

        self.write(&normalized)?;
        self.entries = normalized;

        debug!("Normalized {} tags, {} scores rewritten", seen.len(), changed);
        Ok(changed)
    }

    /// Merge another learn-data document.
    ///
    /// Pairs not yet present are added at the minimum score; existing pairs
    /// keep their rank. The incoming document comment is ignored.
    pub fn merge_content(&mut self, content: &str) -> StoreResult<usize> {
        let incoming = parse_learn_document(content)?;

        let mut merged = self.entries.clone();
        let mut added = 0;
        for entry in incoming.entries {
            if !merged.iter().any(|e| e.matches(&entry.tag, &entry.suggest)) {
                merged.push(LearnEntry { score: 1, ..entry });
                added += 1;
            }
        }

        self.write(&merged)?;
        self.entries = merged;
        Ok(added)
    }

    pub fn entries(&self) -> &[LearnEntry] {
        &self.entries
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn position(&self, tag: &str, suggestion: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.matches(tag, suggestion))
    }

    fn save(&self) -> StoreResult<()> {
        self.write(&self.entries)
    }

    fn write(&self, entries: &[LearnEntry]) -> StoreResult<()> {
        let xml = render_learn_document(entries, self.comment.as_deref().unwrap_or_default())?;
        textfile::write(&self.path, &xml)
    }
}

fn normalized_pair(tag: &str, suggestion: &str) -> StoreResult<(String, String)> {
    let tag = normalize_tag(tag);
    let suggestion = normalize_tag(suggestion);
    if tag.is_empty() || suggestion.is_empty() {
        return Err(StoreError::validation(
            "association",
            "tag and suggestion must not be empty",
        ));
    }
    Ok((tag, suggestion))
}

// ============================================================================
// learn-data document
// ============================================================================

/// Result of parsing a learn-data document
#[derive(Debug, Default)]
pub struct ParsedLedger {
    pub entries: Vec<LearnEntry>,
    pub comment: Option<String>,
    /// Records dropped because a field was missing or invalid
    pub skipped: usize,
}

/// Parse a learn-data document.
///
/// `//` lines and blank lines are stripped first. Invalid records are logged
/// and skipped; duplicate pairs sum their scores.
pub fn parse_learn_document(content: &str) -> StoreResult<ParsedLedger> {
    let data: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
        .collect();
    let data = data.join("\n");

    let mut reader = Reader::from_str(&data);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedLedger::default();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            StoreError::parse(
                DATATYPE,
                format!("at byte {}: {}", reader.buffer_position(), e),
            )
        })?;

        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                let name = element.name();
                if depth == 0 && name.as_ref() == b"root" {
                    saw_root = true;
                    parsed.comment =
                        attribute(element, "comment").map_err(|e| StoreError::parse(DATATYPE, e))?;
                } else if depth == 1 && saw_root && name.as_ref() == b"item" {
                    match parse_item(element) {
                        Ok(entry) => add_or_sum(&mut parsed.entries, entry),
                        Err(reason) => {
                            warn!("Skipping learn-data record: {}", reason);
                            parsed.skipped += 1;
                        }
                    }
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(StoreError::parse(DATATYPE, "missing root element"));
    }

    Ok(parsed)
}

/// Serialize entries sorted by tag ascending, then score descending
pub fn render_learn_document(entries: &[LearnEntry], comment: &str) -> StoreResult<String> {
    let mut sorted: Vec<&LearnEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.tag.cmp(&b.tag).then_with(|| b.score.cmp(&a.score)));

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("root").with_attributes([("datatype", DATATYPE), ("comment", comment)]),
        ))
        .map_err(write_error)?;

    for entry in sorted {
        let score = entry.score.to_string();
        let item = BytesStart::new("item").with_attributes([
            ("tag", entry.tag.as_str()),
            ("suggest", entry.suggest.as_str()),
            ("score", score.as_str()),
        ]);
        writer.write_event(Event::Empty(item)).map_err(write_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("root")))
        .map_err(write_error)?;

    let mut xml = String::from_utf8(writer.into_inner()).map_err(write_error)?;
    xml.push('\n');
    Ok(xml)
}

fn write_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::parse(DATATYPE, format!("failed to serialize: {}", e))
}

fn parse_item(element: &BytesStart) -> Result<LearnEntry, String> {
    let tag = attribute(element, "tag")?.ok_or("missing 'tag'")?;
    let suggest = attribute(element, "suggest")?.ok_or("missing 'suggest'")?;
    let raw_score = attribute(element, "score")?.ok_or("missing 'score'")?;

    let score: u32 = raw_score
        .trim()
        .parse()
        .map_err(|_| format!("non-integer score '{}'", raw_score))?;
    if score == 0 {
        return Err(format!("score must be positive for {} -> {}", tag, suggest));
    }

    let entry = LearnEntry::new(&tag, &suggest, score);
    if entry.tag.is_empty() || entry.suggest.is_empty() {
        return Err("empty tag or suggestion".to_string());
    }
    Ok(entry)
}

fn add_or_sum(entries: &mut Vec<LearnEntry>, entry: LearnEntry) {
    match entries
        .iter_mut()
        .find(|e| e.matches(&entry.tag, &entry.suggest))
    {
        Some(existing) => existing.score = existing.score.saturating_add(entry.score),
        None => entries.push(entry),
    }
}

pub(crate) fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>, String> {
    match element.try_get_attribute(name) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(|e| format!("bad '{}' attribute: {}", name, e)),
        Ok(None) => Ok(None),
        Err(e) => Err(format!("bad '{}' attribute: {}", name, e)),
    }
}
