#![warn(missing_docs)]

//! A [`PermissionLedger`] accumulates resolved grants as a mapping of
//! principal → resource → set of actions.
//!
//! ```rust
//! # use lakegrant_ledger::PermissionLedger;
//! let mut ledger = PermissionLedger::default();
//!
//! assert!(ledger.add("role/analyst", "table/sales/orders", "glue:GetTable"));
//! assert!(!ledger.add("role/analyst", "table/sales/orders", "glue:GetTable"));
//! assert_eq!(ledger.len(), 1);
//!
//! ledger.remove("role/analyst", "table/sales/orders", ["glue:GetTable"]);
//! assert!(ledger.is_empty());
//! ```
//!
//! Ledgers can be exported to (and imported from) a flat, line-oriented
//! interchange format so that pipeline stages can be cached between runs;
//! see [`export_ledger`] and [`import_ledger`].

mod error;
pub use error::*;

mod record;
pub use record::*;

mod ledger;
pub use ledger::*;

mod interchange;
pub use interchange::*;
