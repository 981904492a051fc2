use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::defaults;
use crate::error::{StoreError, StoreResult};
use crate::ledger::attribute;
use crate::textfile;

pub const DEFAULT_MAX_TAGS: u32 = 10;
pub const MAX_TAGS_LIMIT: u32 = 250;
pub const MAX_PRESETS: usize = 5;

const PRESET_PATH: &str = "root/presets/preset";

/// A named one-click tag bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub text: String,
    pub tags: Vec<String>,
}

impl Preset {
    /// Presets without a label or without any tag stay hidden
    pub fn is_configured(&self) -> bool {
        !self.text.trim().is_empty() && self.tags.iter().any(|t| !t.trim().is_empty())
    }
}

/// Application settings from `config.xml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub spellchecker: Option<String>,
    pub presets: Vec<Preset>,
    pub max_tags: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spellchecker: None,
            presets: Vec::new(),
            max_tags: DEFAULT_MAX_TAGS,
        }
    }
}

impl AppConfig {
    /// Load from `path`, seeding the file when missing.
    ///
    /// A malformed document yields the default configuration.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = textfile::read_or_seed(path, defaults::CONFIG)?;

        let config = match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        };

        info!(
            "Loaded config from {} ({} configured presets, max {} tags)",
            path.display(),
            config.configured_presets().len(),
            config.max_tags
        );
        Ok(config)
    }

    /// Parse a config document. Invalid settings are logged and defaulted.
    pub fn parse(content: &str) -> StoreResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<String> = Vec::new();
        let mut config = Self::default();
        let mut raw_max: Option<String> = None;
        let mut saw_root = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| StoreError::parse("config", e))?;

            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    if stack.is_empty() {
                        if name != "root" {
                            return Err(StoreError::parse(
                                "config",
                                format!("unexpected root element <{}>", name),
                            ));
                        }
                        saw_root = true;
                    }

                    stack.push(name);
                    if stack.join("/") == PRESET_PATH {
                        config.presets.push(read_preset(element)?);
                    }
                    if matches!(event, Event::Empty(_)) {
                        stack.pop();
                    }
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| StoreError::parse("config", e))?
                        .trim()
                        .to_string();
                    if value.is_empty() {
                        continue;
                    }

                    match stack.join("/").as_str() {
                        "root/language/spellchecker" => config.spellchecker = Some(value),
                        "root/presets/preset/tag" => {
                            if let Some(preset) = config.presets.last_mut() {
                                preset.tags.push(value);
                            }
                        }
                        "root/tags/max" => raw_max = Some(value),
                        _ => {}
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(StoreError::parse("config", "missing root element"));
        }

        if config.presets.len() > MAX_PRESETS {
            let e = StoreError::validation(
                "presets",
                format!(
                    "{} presets defined, at most {} are supported",
                    config.presets.len(),
                    MAX_PRESETS
                ),
            );
            warn!("{}; keeping the first {}", e, MAX_PRESETS);
            config.presets.truncate(MAX_PRESETS);
        }

        if let Some(raw) = raw_max {
            match parse_max_tags(&raw) {
                Ok(max) => config.max_tags = max,
                Err(e) => warn!("{}; using {}", e, DEFAULT_MAX_TAGS),
            }
        }

        Ok(config)
    }

    pub fn configured_presets(&self) -> Vec<&Preset> {
        self.presets.iter().filter(|p| p.is_configured()).collect()
    }
}

fn read_preset(element: &BytesStart) -> StoreResult<Preset> {
    let text = attribute(element, "text").map_err(|e| StoreError::parse("config", e))?;
    Ok(Preset {
        text: text.unwrap_or_default().trim().to_string(),
        tags: Vec::new(),
    })
}

fn parse_max_tags(raw: &str) -> StoreResult<u32> {
    match raw.parse::<u32>() {
        Ok(max) if (1..=MAX_TAGS_LIMIT).contains(&max) => Ok(max),
        _ => Err(StoreError::validation(
            "tags/max",
            format!("'{}' is not an integer in 1..={}", raw, MAX_TAGS_LIMIT),
        )),
    }
}
