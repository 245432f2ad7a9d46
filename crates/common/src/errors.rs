use thiserror::Error;

/// Error taxonomy of the funding scanner.
///
/// Adapter-level kinds (`NetworkFailure`, `SchemaMismatch`) never leave the
/// adapter boundary; they are logged and turned into an empty venue result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FundingError {
    /// A venue request failed: connection, timeout or non-success status.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// A venue answered with a payload we could not interpret.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Invalid caller input, e.g. an empty venue selection.
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    /// A defect in merge, classification or aggregation. Fatal for the cycle.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FundingError {
    /// True for the kinds that are absorbed by an adapter.
    pub fn is_adapter_level(&self) -> bool {
        matches!(
            self,
            FundingError::NetworkFailure(_) | FundingError::SchemaMismatch(_)
        )
    }
}
