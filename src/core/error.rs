use std::path::PathBuf;

use thiserror::Error;

use super::Variant;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("unknown expense line item `{category}.{item}` for the {variant} schema")]
    UnknownLineItem {
        variant: Variant,
        category: String,
        item: String,
    },

    #[error("{field} must be a finite number")]
    NonFinite { field: String },

    #[error("at most {max} dependents are supported, got {count}")]
    TooManyDependents { count: usize, max: usize },

    #[error("invalid {kind} argument `{value}`: expected {expected}")]
    MalformedArgument {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, FinanceError>;
