use lakegrant_catalog::LakegrantCatalogError;
use lakegrant_ledger::LakegrantLedgerError;
use lakegrant_resource::LakegrantResourceError;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum LakegrantEngineError {
    /// A statement was missing its effect, actions or resources
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// An external policy simulator failed
    #[error("Policy simulation failed: {0}")]
    Simulation(String),

    /// A resource identifier could not be interpreted
    #[error("Invalid resource: {0}")]
    Resource(String),

    /// A catalog lookup failed
    #[error("Catalog operation failed: {0}")]
    Catalog(String),

    /// A ledger operation failed
    #[error("Ledger operation failed: {0}")]
    Ledger(String),
}

impl From<LakegrantResourceError> for LakegrantEngineError {
    fn from(value: LakegrantResourceError) -> Self {
        LakegrantEngineError::Resource(format!("{value}"))
    }
}

impl From<LakegrantCatalogError> for LakegrantEngineError {
    fn from(value: LakegrantCatalogError) -> Self {
        LakegrantEngineError::Catalog(format!("{value}"))
    }
}

impl From<LakegrantLedgerError> for LakegrantEngineError {
    fn from(value: LakegrantLedgerError) -> Self {
        LakegrantEngineError::Ledger(format!("{value}"))
    }
}
