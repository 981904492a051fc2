use anyhow::{Context, Result};
use predictive_ingestion::{
    AppConfig, ExportPreview, ExportReport, MergeReport, StoreHandle, Stores,
};
use predictive_schemas::{MergeMode, Suggestion};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::composer::{filter_by_prefix, without_notify_tags, SuggestionCache, SuggestionComposer};

/// One open data directory: stores, their writer and the suggestion cache
pub struct Engine {
    handle: StoreHandle,
    worker: JoinHandle<()>,
    composer: SuggestionComposer,
    cache: Mutex<SuggestionCache>,
    data_dir: PathBuf,
}

impl Engine {
    /// Open (and seed if needed) the data directory and start the store worker
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let dir = data_dir.clone();
        let stores = tokio::task::spawn_blocking(move || Stores::open(dir))
            .await
            .context("store loader panicked")?
            .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;

        let (handle, worker) = StoreHandle::spawn(stores)?;
        info!("Engine ready on {}", data_dir.display());

        Ok(Self {
            handle,
            worker,
            composer: SuggestionComposer::new(),
            cache: Mutex::new(SuggestionCache::new()),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Suggestions for the tag in `slot`, optionally narrowed to a prefix
    #[instrument(skip(self))]
    pub async fn suggest(&self, slot: usize, tag: &str, prefix: Option<&str>) -> Vec<Suggestion> {
        let ranked = {
            let mut cache = self.cache.lock().await;
            match cache.get(slot, tag).map(|cached| cached.to_vec()) {
                Some(cached) => cached,
                None => {
                    let ranked = self
                        .handle
                        .read(|stores| self.composer.rank(tag, stores.ledger(), stores.tagsets()))
                        .await;
                    cache.insert(slot, tag, ranked.clone());
                    ranked
                }
            }
        };

        let suggestions = self
            .handle
            .read(|stores| without_notify_tags(ranked, stores.notify()))
            .await;

        match prefix {
            Some(prefix) => filter_by_prefix(&suggestions, prefix),
            None => suggestions,
        }
    }

    pub async fn has_suggestions(&self, tag: &str) -> bool {
        self.handle.read(|stores| stores.has_suggestions(tag)).await
    }

    /// The user picked `suggestion` for `tag`
    pub async fn accept(&self, tag: &str, suggestion: &str) -> Result<u32> {
        let score = self.handle.accept(tag, suggestion).await?;
        self.cache.lock().await.clear();
        Ok(score)
    }

    pub async fn unrelate(&self, tag: &str, suggestion: &str) -> Result<bool> {
        let removed = self.handle.unrelate(tag, suggestion).await?;
        self.cache.lock().await.clear();
        Ok(removed)
    }

    /// Export text and notify-listed tags, without persisting anything
    pub async fn preview_export(&self, tags: &[String]) -> Result<ExportPreview> {
        Ok(self.handle.read(|stores| stores.preview_export(tags)).await?)
    }

    pub async fn export(&self, tags: Vec<String>) -> Result<ExportReport> {
        let report = self.handle.export(tags).await?;
        self.cache.lock().await.clear();
        Ok(report)
    }

    pub async fn import(&self, source: PathBuf, mode: MergeMode) -> Result<MergeReport> {
        let report = self.handle.import(source, mode).await?;
        self.cache.lock().await.clear();
        Ok(report)
    }

    pub async fn config(&self) -> AppConfig {
        self.handle.read(|stores| stores.config().clone()).await
    }

    /// Stop the worker once every queued command has been applied
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker.await.context("store worker panicked")?;
        Ok(())
    }
}
