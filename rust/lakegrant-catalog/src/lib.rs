#![warn(missing_docs)]

//! This crate holds the read-only views of the data estate that permission
//! resolution runs against:
//!
//! - [`DataCatalog`]: an in-memory catalog → database → table registry
//!   with uniqueness invariants and wildcard queries
//! - [`LocationTree`]: a path-segment trie over storage locations
//! - [`TableLocator`]: a [`LocationTree`] of every table's storage location,
//!   answering "which tables does this path belong to" and "which tables
//!   live under this prefix"
//!
//! ```rust
//! # use lakegrant_catalog::{Catalog, DataCatalog, Database, Table, TableLocator};
//! # fn main() -> Result<(), lakegrant_catalog::LakegrantCatalogError> {
//! let mut catalog = DataCatalog::default();
//! catalog.add_catalog(Catalog::new("123456789012", "us-east-1"))?;
//! catalog.add_database(Database::new("123456789012", "us-east-1", "sales", None))?;
//! catalog.add_table(Table::new(
//!     "123456789012",
//!     "us-east-1",
//!     "sales",
//!     "orders",
//!     Some("s3://bucket/sales/orders".into()),
//! ))?;
//!
//! let locator = TableLocator::new(&catalog);
//! let tables = locator.tables_enclosing("s3://bucket/sales/orders/dt=2024-01-01/part-0.parquet");
//!
//! assert_eq!(tables.len(), 1);
//! assert_eq!(tables[0].table.table, "orders");
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod catalog;
pub use catalog::*;

mod snapshot;
pub use snapshot::*;

mod tree;
pub use tree::*;

mod locator;
pub use locator::*;

mod data_locations;
pub use data_locations::*;
