//! The serialized shape of a catalog enumeration, as produced by an external
//! catalog reader.

use serde::{Deserialize, Serialize};

use crate::{Catalog, DataCatalog, Database, LakegrantCatalogError, Table};

/// A whole catalog enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSnapshot {
    /// Every enumerated catalog
    pub catalogs: Vec<CatalogDescription>,
}

/// One enumerated catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDescription {
    /// The catalog id (the owning account)
    pub catalog_id: String,
    /// The region that hosts the catalog
    pub region: String,
    /// The identifier partition, `aws` when absent
    #[serde(default)]
    pub partition: Option<String>,
    /// The databases of the catalog
    #[serde(default)]
    pub databases: Vec<DatabaseDescription>,
}

/// One enumerated database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseDescription {
    /// The database name
    pub name: String,
    /// The default storage location of the database
    #[serde(default)]
    pub location: Option<String>,
    /// The tables of the database
    #[serde(default)]
    pub tables: Vec<TableDescription>,
}

/// One enumerated table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDescription {
    /// The table name
    pub name: String,
    /// The storage location of the table's data
    #[serde(default)]
    pub location: Option<String>,
}

impl TryFrom<CatalogSnapshot> for DataCatalog {
    type Error = LakegrantCatalogError;

    fn try_from(snapshot: CatalogSnapshot) -> Result<Self, Self::Error> {
        let mut data_catalog = DataCatalog::default();

        for catalog in snapshot.catalogs {
            let mut entry = Catalog::new(catalog.catalog_id.as_str(), catalog.region.as_str());
            if let Some(partition) = catalog.partition {
                entry = entry.with_partition(partition);
            }
            data_catalog.add_catalog(entry)?;

            for database in catalog.databases {
                data_catalog.add_database(Database::new(
                    catalog.catalog_id.as_str(),
                    catalog.region.as_str(),
                    database.name.as_str(),
                    database.location,
                ))?;

                for table in database.tables {
                    data_catalog.add_table(Table::new(
                        catalog.catalog_id.as_str(),
                        catalog.region.as_str(),
                        database.name.as_str(),
                        table.name,
                        table.location,
                    ))?;
                }
            }
        }

        tracing::info!(
            "Loaded catalog snapshot with {} databases and {} tables",
            data_catalog.databases().count(),
            data_catalog.tables().count()
        );

        Ok(data_catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_a_catalog_from_a_snapshot() {
        let snapshot: CatalogSnapshot = serde_json::from_str(
            r#"{
                "catalogs": [{
                    "catalog_id": "123456789012",
                    "region": "us-east-1",
                    "databases": [{
                        "name": "sales",
                        "location": "s3://bucket/sales/",
                        "tables": [
                            { "name": "orders", "location": "s3://bucket/sales/orders" },
                            { "name": "returns" }
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let catalog = DataCatalog::try_from(snapshot).unwrap();

        assert_eq!(catalog.tables().count(), 2);
        assert_eq!(
            catalog
                .table("123456789012", "sales", "orders")
                .and_then(Table::location),
            Some("s3://bucket/sales/orders/")
        );
    }

    #[test]
    fn it_fails_on_duplicate_tables_in_a_snapshot() {
        let snapshot: CatalogSnapshot = serde_json::from_str(
            r#"{
                "catalogs": [{
                    "catalog_id": "1",
                    "region": "us-east-1",
                    "databases": [{
                        "name": "sales",
                        "tables": [{ "name": "orders" }, { "name": "orders" }]
                    }]
                }]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            DataCatalog::try_from(snapshot),
            Err(LakegrantCatalogError::EntityAlreadyExists(_))
        ));
    }
}
