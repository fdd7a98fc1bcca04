use lakegrant_resource::LakegrantResourceError;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum LakegrantCatalogError {
    /// The parent of an entity being added does not exist
    #[error("Catalog entity not found: {0}")]
    EntityNotFound(String),

    /// An entity with the same name already exists under the same parent
    #[error("Catalog entity already exists: {0}")]
    EntityAlreadyExists(String),

    /// An entity names a parent other than the one it is being added to
    #[error("Catalog entity does not belong to its parent: {0}")]
    EntityMismatch(String),

    /// A resource identifier or storage location could not be interpreted
    #[error("Invalid resource: {0}")]
    Resource(String),
}

impl From<LakegrantResourceError> for LakegrantCatalogError {
    fn from(value: LakegrantResourceError) -> Self {
        LakegrantCatalogError::Resource(format!("{value}"))
    }
}
