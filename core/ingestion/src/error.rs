use std::path::Path;

/// Errors raised by the file-backed stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("parse error in {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("invalid {setting}: {reason}")]
    Validation { setting: String, reason: String },

    #[error("unrecognized data file: {path}")]
    Unrecognized { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn parse(context: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Parse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
