pub mod config;
pub mod defaults;
pub mod error;
pub mod ledger;
pub mod merger;
pub mod notify;
pub mod stores;
pub mod tagsets;
pub mod textfile;
pub mod worker;

pub use config::{AppConfig, Preset};
pub use error::{StoreError, StoreResult};
pub use ledger::{parse_learn_document, render_learn_document, LearnLedger, ParsedLedger};
pub use merger::{DataFileMerger, FileSniffer, MergeReport};
pub use notify::NotifyList;
pub use stores::{DataPaths, ExportPreview, ExportReport, Stores};
pub use tagsets::TagsetStore;
pub use worker::{StoreCommand, StoreHandle, StoreWorker};
