//! Grants inferred from audit logs of successful access.
//!
//! The events are the flattened rows an external audit-log query returns.
//! Any field may be missing; events missing what their kind needs are
//! skipped and counted.

use std::ops::AddAssign;

use lakegrant_catalog::TableLocator;
use lakegrant_ledger::PermissionLedger;
use lakegrant_resource::{CatalogRef, DatabaseRef, ObjectRef, TableRef};
use serde::{Deserialize, Serialize};

use crate::{GlueAction, Granularity, S3Action};

/// Objects under directories with this marker are query-engine scratch
/// space and never belong to a table
const STAGING_MARKER: &str = ".hive-staging_";

/// One successful object-store data access
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccessEvent {
    /// The principal that made the call
    #[serde(default)]
    pub principal: Option<String>,
    /// The accessed bucket
    #[serde(default)]
    pub bucket: Option<String>,
    /// The accessed object key
    #[serde(default)]
    pub key: Option<String>,
    /// The call, e.g. `GetObject`
    #[serde(default)]
    pub event_name: Option<String>,
}

/// One successful catalog call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAccessEvent {
    /// The principal that made the call
    #[serde(default)]
    pub principal: Option<String>,
    /// The region of the called catalog
    #[serde(default)]
    pub region: Option<String>,
    /// The catalog id
    #[serde(default)]
    pub account: Option<String>,
    /// The call, e.g. `GetTable`
    #[serde(default)]
    pub event_name: Option<String>,
    /// The database the call addressed
    #[serde(default)]
    pub database: Option<String>,
    /// The table the call addressed
    #[serde(default)]
    pub table: Option<String>,
}

/// Counts of what an ingestion kept and skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Events read
    pub events: usize,
    /// Events added to the ledger
    pub ingested: usize,
    /// Events missing a field their kind needs
    pub missing_fields: usize,
    /// Events whose name is outside the action vocabulary
    pub unknown_events: usize,
    /// Object events in query-engine scratch space
    pub staging_objects: usize,
    /// Object events under no registered table
    pub unmapped_objects: usize,
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.events += other.events;
        self.ingested += other.ingested;
        self.missing_fields += other.missing_fields;
        self.unknown_events += other.unknown_events;
        self.staging_objects += other.staging_objects;
        self.unmapped_objects += other.unmapped_objects;
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Record each object access as a grant on the object's parent directory,
/// provided a registered table encloses that directory
pub fn ingest_storage_events(
    events: &[StorageAccessEvent],
    locator: &TableLocator,
    ledger: &mut PermissionLedger,
) -> IngestReport {
    let mut report = IngestReport::default();

    for event in events {
        report.events += 1;

        let (Some(principal), Some(bucket), Some(key), Some(event_name)) = (
            present(&event.principal),
            present(&event.bucket),
            present(&event.key),
            present(&event.event_name),
        ) else {
            report.missing_fields += 1;
            continue;
        };

        let Some(action) = S3Action::named(event_name) else {
            tracing::debug!("Skipping unsupported object event {event_name}");
            report.unknown_events += 1;
            continue;
        };

        if key.contains(STAGING_MARKER) {
            report.staging_objects += 1;
            continue;
        }

        let directory = match key.rsplit_once('/') {
            Some((directory, _object)) => format!("{directory}/"),
            None => String::new(),
        };
        let resource = ObjectRef {
            partition: "aws".into(),
            region: String::new(),
            account: String::new(),
            bucket: bucket.to_owned(),
            key: directory,
        }
        .to_string();

        let enclosed = locator
            .tables_enclosing_arn(&resource)
            .is_ok_and(|tables| !tables.is_empty());
        if !enclosed {
            tracing::debug!("No table holds {resource}; skipping");
            report.unmapped_objects += 1;
            continue;
        }

        ledger.add(principal, &resource, &action.to_string());
        report.ingested += 1;
    }

    tracing::info!(
        "Ingested {} of {} object events",
        report.ingested,
        report.events
    );
    report
}

/// Record each catalog call as a grant on the catalog, database or table
/// the call addresses, according to the granularity of the call
pub fn ingest_catalog_events(
    events: &[CatalogAccessEvent],
    ledger: &mut PermissionLedger,
) -> IngestReport {
    let mut report = IngestReport::default();

    for event in events {
        report.events += 1;

        let (Some(principal), Some(region), Some(account), Some(event_name)) = (
            present(&event.principal),
            present(&event.region),
            present(&event.account),
            present(&event.event_name),
        ) else {
            report.missing_fields += 1;
            continue;
        };

        let Some(action) = GlueAction::named(event_name) else {
            tracing::debug!("Skipping unsupported catalog event {event_name}");
            report.unknown_events += 1;
            continue;
        };

        let catalog = CatalogRef {
            partition: "aws".into(),
            region: region.to_owned(),
            account: account.to_owned(),
        };
        let database = present(&event.database);
        let table = present(&event.table);

        let resource = match (action.granularity(), database, table) {
            (Granularity::Catalog, _, _) => catalog.to_string(),
            (Granularity::Database, Some(database), _) => DatabaseRef {
                partition: catalog.partition,
                region: catalog.region,
                account: catalog.account,
                database: database.to_owned(),
            }
            .to_string(),
            (Granularity::Table, Some(database), Some(table)) => TableRef {
                partition: catalog.partition,
                region: catalog.region,
                account: catalog.account,
                database: database.to_owned(),
                table: table.to_owned(),
            }
            .to_string(),
            _ => {
                report.missing_fields += 1;
                continue;
            }
        };

        ledger.add(principal, &resource, &action.to_string());
        report.ingested += 1;
    }

    tracing::info!(
        "Ingested {} of {} catalog events",
        report.ingested,
        report.events
    );
    report
}

#[cfg(test)]
mod tests {
    use lakegrant_catalog::{Catalog, DataCatalog, Database, Table};
    use pretty_assertions::assert_eq;

    use super::*;

    fn storage(principal: &str, key: &str, event_name: &str) -> StorageAccessEvent {
        StorageAccessEvent {
            principal: Some(principal.into()),
            bucket: Some("bucket".into()),
            key: Some(key.into()),
            event_name: Some(event_name.into()),
        }
    }

    #[test]
    fn it_ingests_object_events_under_registered_tables() {
        let mut catalog = DataCatalog::default();
        catalog.add_catalog(Catalog::new("1", "us-east-1")).unwrap();
        catalog
            .add_database(Database::new("1", "us-east-1", "sales", None))
            .unwrap();
        catalog
            .add_table(Table::new(
                "1",
                "us-east-1",
                "sales",
                "orders",
                Some("s3://bucket/sales/orders/".into()),
            ))
            .unwrap();
        let locator = TableLocator::new(&catalog);

        let events = vec![
            storage("alice", "sales/orders/dt=2024-01-01/part-0.parquet", "GetObject"),
            storage("alice", "sales/orders/dt=2024-01-01/part-1.parquet", "PutObject"),
            storage("alice", "sales/orders/.hive-staging_1/part-0", "PutObject"),
            storage("alice", "scratch/file", "GetObject"),
            storage("alice", "sales/orders/part-0", "ListBucket"),
            StorageAccessEvent::default(),
        ];
        let mut ledger = PermissionLedger::default();
        let report = ingest_storage_events(&events, &locator, &mut ledger);

        assert_eq!(
            report,
            IngestReport {
                events: 6,
                ingested: 2,
                missing_fields: 1,
                unknown_events: 1,
                staging_objects: 1,
                unmapped_objects: 1,
            }
        );
        assert_eq!(
            ledger
                .actions("alice", "arn:aws:s3:::bucket/sales/orders/dt=2024-01-01/")
                .map(|actions| actions.iter().cloned().collect::<Vec<_>>()),
            Some(vec!["s3:GetObject".to_owned(), "s3:PutObject".to_owned()])
        );
    }

    #[test]
    fn it_places_catalog_events_by_granularity() {
        let event = |event_name: &str, database: Option<&str>, table: Option<&str>| {
            CatalogAccessEvent {
                principal: Some("alice".into()),
                region: Some("us-east-1".into()),
                account: Some("1".into()),
                event_name: Some(event_name.into()),
                database: database.map(Into::into),
                table: table.map(Into::into),
            }
        };

        let events = vec![
            event("GetDatabases", None, None),
            event("CreateTable", Some("sales"), None),
            event("GetTable", Some("sales"), Some("orders")),
            event("GetTable", Some("sales"), None),
            event("StartJobRun", None, None),
        ];
        let mut ledger = PermissionLedger::default();
        let report = ingest_catalog_events(&events, &mut ledger);

        assert_eq!(report.ingested, 3);
        assert_eq!(report.missing_fields, 1);
        assert_eq!(report.unknown_events, 1);
        assert!(
            ledger
                .actions("alice", "arn:aws:glue:us-east-1:1:catalog")
                .is_some_and(|actions| actions.contains("glue:GetDatabases"))
        );
        assert!(
            ledger
                .actions("alice", "arn:aws:glue:us-east-1:1:database/sales")
                .is_some_and(|actions| actions.contains("glue:CreateTable"))
        );
        assert!(
            ledger
                .actions("alice", "arn:aws:glue:us-east-1:1:table/sales/orders")
                .is_some_and(|actions| actions.contains("glue:GetTable"))
        );
    }
}
