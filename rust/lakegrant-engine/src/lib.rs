#![warn(missing_docs)]

//! This crate turns source permission documents into lake grants. A run
//! has four stages, each of which reads and produces a
//! [`lakegrant_ledger::PermissionLedger`]:
//!
//! 1. [`StatementResolver`] expands the wildcards of policy statements
//!    against a catalog and its table locations and layers allow and deny
//!    statements (audit events can be ingested alongside, see
//!    [`ingest_storage_events`] and [`ingest_catalog_events`])
//! 2. [`FilterPipeline`] removes grants that name unknown principals or
//!    resources, or actions that are meaningless at their resource's level
//! 3. [`GrantTranslator`] maps fine actions onto coarse [`GrantVerb`]s,
//!    moving object-store grants onto the tables that own the data
//! 4. [`PostProcessor`]s rewrite the translated grants
//!
//! [`MigrationPipeline`] chains stages 2 to 4.
//!
//! ```rust
//! # use lakegrant_catalog::{Catalog, DataCatalog, Database, Table, TableLocator};
//! # use lakegrant_engine::{Effect, MigrationPipeline, Statement, StatementResolver};
//! # use lakegrant_ledger::PermissionLedger;
//! # fn main() -> Result<(), lakegrant_engine::LakegrantEngineError> {
//! let mut catalog = DataCatalog::default();
//! catalog.add_catalog(Catalog::new("123456789012", "us-east-1"))?;
//! catalog.add_database(Database::new("123456789012", "us-east-1", "sales", None))?;
//! catalog.add_table(Table::new(
//!     "123456789012",
//!     "us-east-1",
//!     "sales",
//!     "orders",
//!     Some("s3://bucket/sales/orders/".into()),
//! ))?;
//! let locator = TableLocator::new(&catalog);
//!
//! let mut resolved = PermissionLedger::default();
//! StatementResolver::new(&catalog, &locator).resolve(
//!     &[Statement::new(
//!         Effect::Allow,
//!         "arn:aws:iam::123456789012:role/analyst",
//!         ["arn:aws:s3:::bucket/sales/*"],
//!         ["s3:GetObject"],
//!     )],
//!     &mut resolved,
//! );
//!
//! let outcome = MigrationPipeline::new(&locator).run(resolved);
//! let grants = outcome.post_processed.actions(
//!     "arn:aws:iam::123456789012:role/analyst",
//!     "arn:aws:glue:us-east-1:123456789012:table/sales/orders",
//! );
//!
//! assert!(grants.is_some_and(|verbs| verbs.contains("SELECT")));
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod action;
pub use action::*;

mod grant;
pub use grant::*;

mod policy;
pub use policy::*;

mod resolver;
pub use resolver::*;

mod filter;
pub use filter::*;

mod translator;
pub use translator::*;

mod post;
pub use post::*;

mod events;
pub use events::*;

mod pipeline;
pub use pipeline::*;
