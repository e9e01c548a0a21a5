use thiserror::Error;

/// Classifies store errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// File create/read/write failure
    FileError,
    /// Stored data could not be decoded
    InvalidData,
}

/// LinkGuard error types
#[derive(Error, Debug)]
pub enum LinkGuardError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Store error: {message}")]
    StoreError {
        kind: StoreErrorKind,
        message: String,
    },

    #[error("Settings error: {message}")]
    SettingsError {
        kind: StoreErrorKind,
        message: String,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl LinkGuardError {
    pub(crate) fn store(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        LinkGuardError::StoreError {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn settings(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        LinkGuardError::SettingsError {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkGuardError>;
