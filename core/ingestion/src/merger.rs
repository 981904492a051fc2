use predictive_schemas::{DataKind, MergeMode};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::stores::Stores;
use crate::textfile;

/// Recognizes data files by their `datatype="..."` marker and extension
pub struct FileSniffer {
    marker: Regex,
}

impl FileSniffer {
    pub fn new() -> StoreResult<Self> {
        let marker = Regex::new(r#"datatype\s?=\s?"(?P<kind>.*?)""#)
            .map_err(|e| StoreError::parse("datatype marker", e))?;
        Ok(Self { marker })
    }

    /// Kind of `content` read from `path`. Both the marker and the extension must agree.
    pub fn detect(&self, path: &Path, content: &str) -> StoreResult<DataKind> {
        let unrecognized = || StoreError::Unrecognized {
            path: path.display().to_string(),
        };

        let captures = self.marker.captures(content).ok_or_else(unrecognized)?;
        let kind = DataKind::from_marker(&captures["kind"]).ok_or_else(unrecognized)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()));
        if extension.as_deref() != Some(kind.extension()) {
            debug!(
                "{} carries a {} marker but has extension {:?}",
                path.display(),
                kind,
                extension
            );
            return Err(unrecognized());
        }

        Ok(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub kind: DataKind,
    /// Mode actually applied; config requests always end up as a replace
    pub mode: MergeMode,
    /// Records new to the store. Always 0 for a replace.
    pub added: usize,
}

impl MergeReport {
    pub fn status_message(&self) -> String {
        let (verb, noun) = match self.mode {
            MergeMode::Merge => ("Merged", "files"),
            MergeMode::Replace => ("Replaced", "file"),
        };
        format!("{} {} {}. Reloaded {}.", verb, self.kind, noun, self.kind)
    }
}

/// Imports foreign data files into the stores
pub struct DataFileMerger {
    sniffer: FileSniffer,
}

impl DataFileMerger {
    pub fn new() -> StoreResult<Self> {
        Ok(Self {
            sniffer: FileSniffer::new()?,
        })
    }

    pub fn import(
        &self,
        stores: &mut Stores,
        source: &Path,
        mode: MergeMode,
    ) -> StoreResult<MergeReport> {
        let content = textfile::read(source)?;
        let kind = self.sniffer.detect(source, &content)?;
        info!("Importing {} as {} ({})", source.display(), kind, mode.as_str());
        self.apply(stores, kind, &content, mode)
    }

    /// Merge or replace the `kind` store with `content`, then reload it from disk
    pub fn apply(
        &self,
        stores: &mut Stores,
        kind: DataKind,
        content: &str,
        mode: MergeMode,
    ) -> StoreResult<MergeReport> {
        let mode = if kind.supports_merge() {
            mode
        } else {
            MergeMode::Replace
        };

        let added = match (mode, kind) {
            (MergeMode::Merge, DataKind::LearnData) => stores.ledger.merge_content(content)?,
            (MergeMode::Merge, DataKind::HistoricalData) => {
                stores.tagsets.merge_content(content)?
            }
            (MergeMode::Merge, DataKind::NotifyData) => stores.notify.merge_content(content)?,
            _ => {
                textfile::write(&stores.paths.path(kind), content)?;
                0
            }
        };

        stores.reload(kind)?;

        let report = MergeReport { kind, mode, added };
        info!("{}", report.status_message());
        Ok(report)
    }
}
