use thiserror::Error;

use pharmstock_core::ProductId;

/// Failure reported by a collaborator repository (product catalog, movement log).
///
/// Timeouts and retries are the repository's own policy; the engine only sees
/// the final outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    #[error("repository read timed out")]
    Timeout,

    #[error("internal repository error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Single-product request for an id the catalog does not know.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("invalid forecast request: {0}")]
    InvalidInput(String),

    #[error("history read failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("forecast cancelled")]
    Cancelled,
}

impl ForecastError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
