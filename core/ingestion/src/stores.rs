use predictive_schemas::{normalize_tag, DataKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{StoreError, StoreResult};
use crate::ledger::LearnLedger;
use crate::notify::NotifyList;
use crate::tagsets::TagsetStore;

/// Diagnostic log written next to the data files
pub const ERROR_LOG: &str = "error.log";

/// File locations inside the data directory
#[derive(Debug, Clone)]
pub struct DataPaths {
    dir: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: DataKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

/// Tags prepared for export, before anything is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPreview {
    /// Normalized tags in entry order
    pub tags: Vec<String>,
    /// The `", "`-joined export text
    pub text: String,
    /// Tags that are on the notify list
    pub flagged: Vec<String>,
}

/// Outcome of a committed export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub text: String,
    pub flagged: Vec<String>,
    /// Whether the tagset was new to the historical data
    pub added: bool,
    /// Learn scores rewritten by normalization
    pub normalized: usize,
}

/// Every store of one data directory
pub struct Stores {
    pub(crate) paths: DataPaths,
    pub(crate) tagsets: TagsetStore,
    pub(crate) notify: NotifyList,
    pub(crate) ledger: LearnLedger,
    pub(crate) config: AppConfig,
}

impl Stores {
    /// Open all stores in `dir`, creating the directory and seeding missing files
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let paths = DataPaths::new(dir);
        fs::create_dir_all(paths.dir()).map_err(|e| StoreError::io(paths.dir(), e))?;

        let stores = Self {
            tagsets: TagsetStore::open(paths.path(DataKind::HistoricalData))?,
            notify: NotifyList::open(paths.path(DataKind::NotifyData))?,
            ledger: LearnLedger::open(paths.path(DataKind::LearnData))?,
            config: AppConfig::load(&paths.path(DataKind::Config))?,
            paths,
        };

        info!("Opened data directory {}", stores.paths.dir().display());
        Ok(stores)
    }

    /// Rebuild one store from disk, swapping it in only when loading succeeds
    pub fn reload(&mut self, kind: DataKind) -> StoreResult<()> {
        let path = self.paths.path(kind);
        match kind {
            DataKind::HistoricalData => self.tagsets = TagsetStore::open(path)?,
            DataKind::NotifyData => self.notify = NotifyList::open(path)?,
            DataKind::LearnData => self.ledger = LearnLedger::open(path)?,
            DataKind::Config => self.config = AppConfig::load(&path)?,
        }
        info!("Reloaded {}", kind);
        Ok(())
    }

    /// Whether selecting `tag` would produce any suggestion
    pub fn has_suggestions(&self, tag: &str) -> bool {
        self.tagsets.has_multi_tag_match(tag) || self.ledger.has_entries(tag)
    }

    pub fn preview_export<S: AsRef<str>>(&self, tags: &[S]) -> StoreResult<ExportPreview> {
        let mut normalized: Vec<String> = Vec::new();
        for tag in tags {
            let tag = normalize_tag(tag.as_ref());
            if !tag.is_empty() && !normalized.contains(&tag) {
                normalized.push(tag);
            }
        }

        if normalized.is_empty() {
            return Err(StoreError::validation("export", "no tags to export"));
        }

        Ok(ExportPreview {
            text: normalized.join(", "),
            flagged: self.notify.intersect(&normalized),
            tags: normalized,
        })
    }

    /// Record an exported tagset and normalize the learn scores of its tags
    pub fn export<S: AsRef<str>>(&mut self, tags: &[S]) -> StoreResult<ExportReport> {
        let preview = self.preview_export(tags)?;
        if !preview.flagged.is_empty() {
            warn!("Exporting notify-listed tags: {}", preview.flagged.join(", "));
        }

        let added = self.tagsets.add(&preview.tags)?;
        let normalized = self.ledger.normalize(&preview.tags)?;

        Ok(ExportReport {
            text: preview.text,
            flagged: preview.flagged,
            added,
            normalized,
        })
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn tagsets(&self) -> &TagsetStore {
        &self.tagsets
    }

    pub fn notify(&self) -> &NotifyList {
        &self.notify
    }

    pub fn ledger(&self) -> &LearnLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut LearnLedger {
        &mut self.ledger
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
