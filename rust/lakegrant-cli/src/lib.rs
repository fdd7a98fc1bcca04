#![warn(missing_docs)]

//! The `lakegrant` command line front end. A run is described by a JSON
//! [`Configuration`] that names the input documents (a catalog snapshot,
//! identity and bucket policies, audit events), the filters and
//! post-processors to run, and where to write the resulting grants and any
//! intermediate ledgers.
//!
//! ```json
//! {
//!     "main": { "dry_run": true, "output": "grants.csv" },
//!     "inputs": {
//!         "catalog": "catalog.json",
//!         "identity_policies": "identity-policies.json",
//!         "bucket_policies": "bucket-policies.json"
//!     },
//!     "filters": {
//!         "principal_list": { "enabled": true, "exclude": ["arn:aws:iam::1:role/admin"] }
//!     },
//!     "stage_cache": { "export_resolved": "resolved.csv" }
//! }
//! ```

mod cli;
pub use cli::*;

mod config;
pub use config::*;

mod inputs;
pub use inputs::*;

mod logging;
pub use logging::*;

mod stages;
pub use stages::*;

mod migration;
pub use migration::*;
