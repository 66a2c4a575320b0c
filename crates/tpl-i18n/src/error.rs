//! Error types for the tpl-i18n extraction engine.

use thiserror::Error;

/// All errors that can occur while extracting and rewriting a template
#[derive(Error, Debug)]
pub enum TplI18nError {
    #[error("the entry key cannot be empty")]
    EmptyKey,

    #[error("expression cannot be modified independently of key")]
    IllegalMutation,

    #[error("key counter starting at {start} ran out of numbers")]
    KeysExhausted { start: u64 },

    #[error("Invalid edit at {start}..{end}: {reason}")]
    InvalidEdit {
        start: usize,
        end: usize,
        reason: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for tpl-i18n operations
pub type Result<T> = std::result::Result<T, TplI18nError>;
