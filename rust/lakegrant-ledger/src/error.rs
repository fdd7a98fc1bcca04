use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum LakegrantLedgerError {
    /// A record was constructed without any actions
    #[error("A permission record needs at least one action: {0}")]
    EmptyActions(String),

    /// Interchange data could not be read or written
    #[error("Interchange failed: {0}")]
    Interchange(String),
}

impl From<csv_async::Error> for LakegrantLedgerError {
    fn from(value: csv_async::Error) -> Self {
        LakegrantLedgerError::Interchange(format!("{value}"))
    }
}

impl From<std::io::Error> for LakegrantLedgerError {
    fn from(value: std::io::Error) -> Self {
        LakegrantLedgerError::Interchange(format!("{value}"))
    }
}
