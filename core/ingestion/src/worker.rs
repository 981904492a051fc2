use anyhow::{anyhow, Context, Result};
use predictive_schemas::MergeMode;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::error::StoreResult;
use crate::merger::{DataFileMerger, MergeReport};
use crate::stores::{ExportReport, Stores};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Mutations applied by the [`StoreWorker`], one at a time
pub enum StoreCommand {
    Accept {
        tag: String,
        suggestion: String,
        reply: Reply<u32>,
    },
    Unrelate {
        tag: String,
        suggestion: String,
        reply: Reply<bool>,
    },
    Export {
        tags: Vec<String>,
        reply: Reply<ExportReport>,
    },
    Import {
        source: PathBuf,
        mode: MergeMode,
        reply: Reply<MergeReport>,
    },
}

impl StoreCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StoreCommand::Accept { .. } => "accept",
            StoreCommand::Unrelate { .. } => "unrelate",
            StoreCommand::Export { .. } => "export",
            StoreCommand::Import { .. } => "import",
        }
    }
}

/// Single writer for every store; file I/O runs on the blocking pool
pub struct StoreWorker {
    stores: Arc<Mutex<Stores>>,
    merger: Arc<DataFileMerger>,
    receiver: mpsc::UnboundedReceiver<StoreCommand>,
}

impl StoreWorker {
    pub fn new(
        stores: Arc<Mutex<Stores>>,
        merger: Arc<DataFileMerger>,
        receiver: mpsc::UnboundedReceiver<StoreCommand>,
    ) -> Self {
        Self {
            stores,
            merger,
            receiver,
        }
    }

    /// Process commands until every sender is dropped
    pub async fn run(mut self) {
        info!("Store worker started");

        while let Some(command) = self.receiver.recv().await {
            let span = info_span!("store_command", command = command.name());
            self.process(command).instrument(span).await;
        }

        info!("Store worker stopped - channel closed");
    }

    async fn process(&self, command: StoreCommand) {
        match command {
            StoreCommand::Accept {
                tag,
                suggestion,
                reply,
            } => {
                let result = self
                    .blocking(move |stores| stores.ledger.record_association(&tag, &suggestion))
                    .await;
                respond(reply, result);
            }
            StoreCommand::Unrelate {
                tag,
                suggestion,
                reply,
            } => {
                let result = self
                    .blocking(move |stores| stores.ledger.remove_association(&tag, &suggestion))
                    .await;
                respond(reply, result);
            }
            StoreCommand::Export { tags, reply } => {
                let result = self.blocking(move |stores| stores.export(&tags)).await;
                respond(reply, result);
            }
            StoreCommand::Import {
                source,
                mode,
                reply,
            } => {
                let merger = Arc::clone(&self.merger);
                let result = self
                    .blocking(move |stores| merger.import(stores, &source, mode))
                    .await;
                respond(reply, result);
            }
        }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Stores) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.stores).lock_owned().await;
        let span = Span::current();
        let result = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            op(&mut guard)
        })
        .await
        .context("store task panicked")??;
        Ok(result)
    }
}

fn respond<T>(reply: Reply<T>, result: Result<T>) {
    if let Err(e) = &result {
        error!("Store command failed: {:#}", e);
    }
    if reply.send(result).is_err() {
        debug!("Caller went away before the store command finished");
    }
}

/// Cloneable front door to the stores: reads lock directly, writes go through the worker
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::UnboundedSender<StoreCommand>,
    stores: Arc<Mutex<Stores>>,
}

impl StoreHandle {
    /// Start a worker for `stores` on the current runtime
    pub fn spawn(stores: Stores) -> Result<(Self, JoinHandle<()>)> {
        let merger = Arc::new(DataFileMerger::new()?);
        let stores = Arc::new(Mutex::new(stores));
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = StoreWorker::new(Arc::clone(&stores), merger, receiver);
        let task = tokio::spawn(worker.run());

        Ok((Self { sender, stores }, task))
    }

    pub async fn accept(&self, tag: &str, suggestion: &str) -> Result<u32> {
        let (tag, suggestion) = (tag.to_string(), suggestion.to_string());
        self.request(|reply| StoreCommand::Accept {
            tag,
            suggestion,
            reply,
        })
        .await
    }

    pub async fn unrelate(&self, tag: &str, suggestion: &str) -> Result<bool> {
        let (tag, suggestion) = (tag.to_string(), suggestion.to_string());
        self.request(|reply| StoreCommand::Unrelate {
            tag,
            suggestion,
            reply,
        })
        .await
    }

    pub async fn export(&self, tags: Vec<String>) -> Result<ExportReport> {
        self.request(|reply| StoreCommand::Export { tags, reply })
            .await
    }

    pub async fn import(&self, source: PathBuf, mode: MergeMode) -> Result<MergeReport> {
        self.request(|reply| StoreCommand::Import {
            source,
            mode,
            reply,
        })
        .await
    }

    /// Run a read-only closure against the current stores
    pub async fn read<T>(&self, f: impl FnOnce(&Stores) -> T) -> T {
        let stores = self.stores.lock().await;
        f(&stores)
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> StoreCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        let command = make(reply);
        let name = command.name();

        if self.sender.send(command).is_err() {
            warn!("Store worker is gone; dropping {} command", name);
            return Err(anyhow!("store worker has stopped"));
        }

        response
            .await
            .with_context(|| format!("store worker dropped the {} command", name))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rapid_accepts_are_serialized() {
        let temp = TempDir::new().unwrap();
        let (handle, _task) = StoreHandle::spawn(Stores::open(temp.path()).unwrap()).unwrap();

        let mut pending = Vec::new();
        for _ in 0..20 {
            let handle = handle.clone();
            pending.push(tokio::spawn(async move {
                handle.accept("owl", "night").await
            }));
        }

        let mut scores = Vec::new();
        for task in pending {
            scores.push(task.await.unwrap().unwrap());
        }
        scores.sort_unstable();
        assert_eq!(scores, (1..=20).collect::<Vec<u32>>());

        let score = handle
            .read(|stores| stores.ledger().query("owl")[0].score)
            .await;
        assert_eq!(score, 20);
    }

    #[tokio::test]
    async fn test_failed_command_reports_error() {
        let temp = TempDir::new().unwrap();
        let (handle, _task) = StoreHandle::spawn(Stores::open(temp.path()).unwrap()).unwrap();

        assert!(handle.accept("owl", "").await.is_err());
        assert!(handle
            .import(temp.path().join("missing.txt"), MergeMode::Merge)
            .await
            .is_err());

        // The worker keeps serving after a failure
        assert_eq!(handle.accept("owl", "moon").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_worker_stops_when_handles_drop() {
        let temp = TempDir::new().unwrap();
        let (handle, task) = StoreHandle::spawn(Stores::open(temp.path()).unwrap()).unwrap();

        drop(handle);
        task.await.unwrap();
    }
}
