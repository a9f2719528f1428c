use thiserror::Error;

use crate::core::models::Side;

#[derive(Error, Debug)]
pub enum FlashnoteError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("reorder for '{parent}' is not a permutation of the current membership")]
    InvalidOrder { parent: String },

    #[error("eviction queue is empty while the resident count is over the ceiling")]
    EmptyEvictionQueue,

    #[error("unbalanced slot delimiters on the {0} side")]
    UnbalancedDelimiters(Side),

    #[error("template has {expected} slots but {got} values were given")]
    FieldCountMismatch { expected: usize, got: usize },

    #[error("no value given for field '{0}'")]
    MissingFieldValue(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("write conflict: {0}")]
    WriteConflict(String),

    #[error("ID allocation conflict: {0}")]
    AllocationConflict(String),

    #[error("FlashnoteError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for FlashnoteError {
    fn from(error: std::io::Error) -> Self {
        FlashnoteError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for FlashnoteError {
    fn from(error: reqwest::Error) -> Self {
        FlashnoteError::Reqwest(Box::new(error))
    }
}
