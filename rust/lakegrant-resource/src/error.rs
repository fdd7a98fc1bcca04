use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum LakegrantResourceError {
    /// A string did not have the shape of a resource identifier
    #[error("Malformed resource identifier: {0}")]
    MalformedIdentifier(String),

    /// A storage location used a scheme other than the supported ones
    #[error("Unsupported storage location: {0}")]
    UnsupportedLocation(String),
}
