use thiserror::Error;

/// Errors surfaced by the miner and its collaborators
#[derive(Debug, Error)]
pub enum MinerError {
    /// A mining threshold was rejected before any counting happened
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameters {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A hand-built level sequence put k-itemsets at the wrong index
    #[error("level table at index {index} holds {cardinality}-itemsets")]
    LevelMismatch { index: usize, cardinality: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encode/decode failure
    #[error("cache error: {0}")]
    Cache(#[from] serde_cbor::Error),

    #[error("unrecognized date `{value}`")]
    InvalidDate { value: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

pub type MinerResult<T> = Result<T, MinerError>;

impl MinerError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        MinerError::InvalidParameters { name, value, reason }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        MinerError::Config { reason: reason.into() }
    }
}
