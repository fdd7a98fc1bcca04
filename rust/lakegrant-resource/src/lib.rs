#![warn(missing_docs)]

//! This crate models the resource identifiers that appear in source
//! permission documents: catalog entities (catalogs, databases and tables)
//! and object-store entities (buckets and objects).
//!
//! Identifiers follow the `arn:partition:service:region:account:resource`
//! shape. Parsing into a [`ResourceIdentifier`] only checks that shape;
//! [`Resource::classify`] then sorts an identifier into one of a closed set
//! of kinds:
//!
//! ```rust
//! # use lakegrant_resource::{Resource, TableRef};
//! let resource = Resource::classify("arn:aws:glue:us-east-1:123456789012:table/sales/orders");
//!
//! assert_eq!(
//!     resource,
//!     Resource::Table(TableRef {
//!         partition: "aws".into(),
//!         region: "us-east-1".into(),
//!         account: "123456789012".into(),
//!         database: "sales".into(),
//!         table: "orders".into(),
//!     })
//! );
//! assert_eq!(
//!     resource.to_string(),
//!     "arn:aws:glue:us-east-1:123456789012:table/sales/orders"
//! );
//! ```
//!
//! Object-store resources convert to and from `s3://` storage locations, see
//! [`to_storage_location`] and [`from_storage_location`].

mod error;
pub use error::*;

mod identifier;
pub use identifier::*;

mod resource;
pub use resource::*;

mod location;
pub use location::*;

/// The token that stands for "every name at this level"
pub const WILDCARD: &str = "*";
