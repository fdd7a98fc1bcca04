use indexmap::IndexMap;
use lakegrant_resource::{CatalogRef, DatabaseRef, Resource, TableRef, WILDCARD};
use serde::{Deserialize, Serialize};

use crate::LakegrantCatalogError;

const DEFAULT_PARTITION: &str = "aws";

/// A table registered in a database. Its storage location, when present,
/// always ends in `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    partition: String,
    region: String,
    catalog_id: String,
    database: String,
    name: String,
    location: Option<String>,
}

impl Table {
    /// Describe a table of `database` in the catalog `catalog_id`
    pub fn new(
        catalog_id: impl Into<String>,
        region: impl Into<String>,
        database: impl Into<String>,
        name: impl Into<String>,
        location: Option<String>,
    ) -> Self {
        Self {
            partition: DEFAULT_PARTITION.into(),
            region: region.into(),
            catalog_id: catalog_id.into(),
            database: database.into(),
            name: name.into(),
            location: location.map(with_trailing_separator),
        }
    }

    /// The catalog that holds this table
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// The database that holds this table
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The storage location of the table's data
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The resource identifier of this table
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            partition: self.partition.clone(),
            region: self.region.clone(),
            account: self.catalog_id.clone(),
            database: self.database.clone(),
            table: self.name.clone(),
        }
    }
}

/// A database registered in a catalog, owning its tables by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    partition: String,
    region: String,
    catalog_id: String,
    name: String,
    location: Option<String>,
    tables: IndexMap<String, Table>,
}

impl Database {
    /// Describe an empty database in the catalog `catalog_id`
    pub fn new(
        catalog_id: impl Into<String>,
        region: impl Into<String>,
        name: impl Into<String>,
        location: Option<String>,
    ) -> Self {
        Self {
            partition: DEFAULT_PARTITION.into(),
            region: region.into(),
            catalog_id: catalog_id.into(),
            name: name.into(),
            location: location.map(with_trailing_separator),
            tables: IndexMap::new(),
        }
    }

    /// The catalog that holds this database
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// The database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default storage location of the database, if any
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// The tables of this database in insertion order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Register a table. The table must name this database and its catalog.
    pub fn add_table(&mut self, mut table: Table) -> Result<(), LakegrantCatalogError> {
        if table.catalog_id != self.catalog_id || table.database != self.name {
            return Err(LakegrantCatalogError::EntityMismatch(format!(
                "Table \"{}\" belongs to {}/{}, not {}/{}",
                table.name, table.catalog_id, table.database, self.catalog_id, self.name
            )));
        }
        if self.tables.contains_key(&table.name) {
            return Err(LakegrantCatalogError::EntityAlreadyExists(format!(
                "Table \"{}\" in {}/{}",
                table.name, self.catalog_id, self.name
            )));
        }

        table.partition.clone_from(&self.partition);
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// The resource identifier of this database
    pub fn database_ref(&self) -> DatabaseRef {
        DatabaseRef {
            partition: self.partition.clone(),
            region: self.region.clone(),
            account: self.catalog_id.clone(),
            database: self.name.clone(),
        }
    }
}

/// The catalog of one account, owning its databases by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    partition: String,
    region: String,
    catalog_id: String,
    databases: IndexMap<String, Database>,
}

impl Catalog {
    /// Describe an empty catalog
    pub fn new(catalog_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            partition: DEFAULT_PARTITION.into(),
            region: region.into(),
            catalog_id: catalog_id.into(),
            databases: IndexMap::new(),
        }
    }

    /// Place the catalog in a partition other than the default one
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// The catalog id
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// Look up a database by name
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }

    /// The databases of this catalog in insertion order
    pub fn databases(&self) -> impl Iterator<Item = &Database> {
        self.databases.values()
    }

    /// Register a database. The database must name this catalog.
    pub fn add_database(&mut self, mut database: Database) -> Result<(), LakegrantCatalogError> {
        if database.catalog_id != self.catalog_id {
            return Err(LakegrantCatalogError::EntityMismatch(format!(
                "Database \"{}\" belongs to catalog {}, not {}",
                database.name, database.catalog_id, self.catalog_id
            )));
        }
        if self.databases.contains_key(&database.name) {
            return Err(LakegrantCatalogError::EntityAlreadyExists(format!(
                "Database \"{}\" in catalog {}",
                database.name, self.catalog_id
            )));
        }

        database.partition.clone_from(&self.partition);
        for table in database.tables.values_mut() {
            table.partition.clone_from(&self.partition);
        }
        self.databases.insert(database.name.clone(), database);
        Ok(())
    }

    /// The resource identifier of this catalog
    pub fn catalog_ref(&self) -> CatalogRef {
        CatalogRef {
            partition: self.partition.clone(),
            region: self.region.clone(),
            account: self.catalog_id.clone(),
        }
    }
}

/// A borrowed node of a [`DataCatalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry<'a> {
    /// A catalog
    Catalog(&'a Catalog),
    /// A database
    Database(&'a Database),
    /// A table
    Table(&'a Table),
}

impl CatalogEntry<'_> {
    /// The resource this entry stands for
    pub fn resource(&self) -> Resource {
        match self {
            CatalogEntry::Catalog(catalog) => Resource::Catalog(catalog.catalog_ref()),
            CatalogEntry::Database(database) => Resource::Database(database.database_ref()),
            CatalogEntry::Table(table) => Resource::Table(table.table_ref()),
        }
    }

    /// The resource identifier of this entry
    pub fn identifier(&self) -> String {
        self.resource().to_string()
    }
}

/// Every catalog visible to a run, keyed by catalog id.
///
/// The snapshot is built once and then only read; every mutation validates
/// that the parent exists and that names are unique under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCatalog {
    catalogs: IndexMap<String, Catalog>,
}

impl DataCatalog {
    /// Register a catalog
    pub fn add_catalog(&mut self, catalog: Catalog) -> Result<(), LakegrantCatalogError> {
        if self.catalogs.contains_key(&catalog.catalog_id) {
            return Err(LakegrantCatalogError::EntityAlreadyExists(format!(
                "Catalog {}",
                catalog.catalog_id
            )));
        }
        self.catalogs.insert(catalog.catalog_id.clone(), catalog);
        Ok(())
    }

    /// Register a database in the catalog it names
    pub fn add_database(&mut self, database: Database) -> Result<(), LakegrantCatalogError> {
        let catalog = self.catalogs.get_mut(&database.catalog_id).ok_or_else(|| {
            LakegrantCatalogError::EntityNotFound(format!(
                "Catalog {} for database \"{}\"",
                database.catalog_id, database.name
            ))
        })?;
        catalog.add_database(database)
    }

    /// Register a table in the catalog and database it names
    pub fn add_table(&mut self, table: Table) -> Result<(), LakegrantCatalogError> {
        let database = self
            .catalogs
            .get_mut(&table.catalog_id)
            .and_then(|catalog| catalog.databases.get_mut(&table.database))
            .ok_or_else(|| {
                LakegrantCatalogError::EntityNotFound(format!(
                    "Database {}/{} for table \"{}\"",
                    table.catalog_id, table.database, table.name
                ))
            })?;
        database.add_table(table)
    }

    /// Look up a catalog by id
    pub fn catalog(&self, catalog_id: &str) -> Option<&Catalog> {
        self.catalogs.get(catalog_id)
    }

    /// Look up a database
    pub fn database(&self, catalog_id: &str, database: &str) -> Option<&Database> {
        self.catalog(catalog_id)?.database(database)
    }

    /// Look up a table
    pub fn table(&self, catalog_id: &str, database: &str, table: &str) -> Option<&Table> {
        self.database(catalog_id, database)?.table(table)
    }

    /// Look up the node named by the given levels. A table name without a
    /// database name matches nothing.
    pub fn lookup(
        &self,
        catalog_id: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> Option<CatalogEntry<'_>> {
        match (database, table) {
            (None, None) => self.catalog(catalog_id).map(CatalogEntry::Catalog),
            (Some(database), None) => self
                .database(catalog_id, database)
                .map(CatalogEntry::Database),
            (Some(database), Some(table)) => self
                .table(catalog_id, database, table)
                .map(CatalogEntry::Table),
            (None, Some(_)) => None,
        }
    }

    /// Find every node matching the given levels, where `*` at any level
    /// matches every child at that level. The deepest level given decides
    /// the kind of node returned: `resolve_wildcard(id, Some("*"),
    /// Some("customers"))` returns every `customers` table in every
    /// database of the catalog.
    pub fn resolve_wildcard(
        &self,
        catalog_id: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> Vec<CatalogEntry<'_>> {
        let catalogs: Vec<&Catalog> = if catalog_id == WILDCARD {
            self.catalogs.values().collect()
        } else {
            self.catalog(catalog_id).into_iter().collect()
        };

        let Some(database_name) = database else {
            if table.is_some() {
                return Vec::new();
            }
            return catalogs.into_iter().map(CatalogEntry::Catalog).collect();
        };

        let databases = catalogs.into_iter().flat_map(|catalog| {
            catalog.databases().filter(move |database| {
                database_name == WILDCARD || database.name == database_name
            })
        });

        let Some(table_name) = table else {
            return databases.map(CatalogEntry::Database).collect();
        };

        databases
            .flat_map(|database| {
                database
                    .tables()
                    .filter(move |table| table_name == WILDCARD || table.name == table_name)
            })
            .map(CatalogEntry::Table)
            .collect()
    }

    /// Every node, depth first: each catalog, then each of its databases
    /// followed by that database's tables
    pub fn iter(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.catalogs.values().flat_map(|catalog| {
            std::iter::once(CatalogEntry::Catalog(catalog)).chain(catalog.databases().flat_map(
                |database| {
                    std::iter::once(CatalogEntry::Database(database))
                        .chain(database.tables().map(CatalogEntry::Table))
                },
            ))
        })
    }

    /// Every catalog
    pub fn catalogs(&self) -> impl Iterator<Item = &Catalog> {
        self.catalogs.values()
    }

    /// Every database of every catalog
    pub fn databases(&self) -> impl Iterator<Item = &Database> {
        self.catalogs.values().flat_map(Catalog::databases)
    }

    /// Every table of every database
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.databases().flat_map(Database::tables)
    }
}

fn with_trailing_separator(mut location: String) -> String {
    if !location.ends_with('/') {
        location.push('/');
    }
    location
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ACCOUNT: &str = "123456789012";
    const REGION: &str = "us-east-1";

    fn catalog() -> DataCatalog {
        let mut catalog = DataCatalog::default();
        catalog.add_catalog(Catalog::new(ACCOUNT, REGION)).unwrap();
        for database in ["sales", "marketing"] {
            catalog
                .add_database(Database::new(ACCOUNT, REGION, database, None))
                .unwrap();
            for table in ["customers", "orders"] {
                catalog
                    .add_table(Table::new(ACCOUNT, REGION, database, table, None))
                    .unwrap();
            }
        }
        catalog
    }

    fn identifiers(entries: Vec<CatalogEntry<'_>>) -> Vec<String> {
        entries.iter().map(CatalogEntry::identifier).collect()
    }

    #[test]
    fn it_rejects_duplicate_names() {
        let mut catalog = catalog();

        assert!(matches!(
            catalog.add_catalog(Catalog::new(ACCOUNT, REGION)),
            Err(LakegrantCatalogError::EntityAlreadyExists(_))
        ));
        assert!(matches!(
            catalog.add_database(Database::new(ACCOUNT, REGION, "sales", None)),
            Err(LakegrantCatalogError::EntityAlreadyExists(_))
        ));
        assert!(matches!(
            catalog.add_table(Table::new(ACCOUNT, REGION, "sales", "orders", None)),
            Err(LakegrantCatalogError::EntityAlreadyExists(_))
        ));
    }

    #[test]
    fn it_rejects_entities_without_a_parent() {
        let mut catalog = catalog();

        assert!(matches!(
            catalog.add_database(Database::new("999", REGION, "sales", None)),
            Err(LakegrantCatalogError::EntityNotFound(_))
        ));
        assert!(matches!(
            catalog.add_table(Table::new(ACCOUNT, REGION, "finance", "ledger", None)),
            Err(LakegrantCatalogError::EntityNotFound(_))
        ));
    }

    #[test]
    fn it_rejects_children_of_another_parent() {
        let mut database = Database::new(ACCOUNT, REGION, "sales", None);
        assert!(matches!(
            database.add_table(Table::new(ACCOUNT, REGION, "marketing", "orders", None)),
            Err(LakegrantCatalogError::EntityMismatch(_))
        ));

        let mut catalog = Catalog::new(ACCOUNT, REGION);
        assert!(matches!(
            catalog.add_database(Database::new("999", REGION, "sales", None)),
            Err(LakegrantCatalogError::EntityMismatch(_))
        ));
    }

    #[test]
    fn it_normalizes_table_locations() {
        let table = Table::new(ACCOUNT, REGION, "sales", "orders", Some("s3://b/orders".into()));

        assert_eq!(table.location(), Some("s3://b/orders/"));
    }

    #[test]
    fn it_normalizes_database_locations() {
        let database = Database::new(ACCOUNT, REGION, "sales", Some("s3://b/sales".into()));
        let unchanged = Database::new(ACCOUNT, REGION, "hr", Some("s3://b/hr/".into()));

        assert_eq!(database.location(), Some("s3://b/sales/"));
        assert_eq!(unchanged.location(), Some("s3://b/hr/"));
        assert_eq!(Database::new(ACCOUNT, REGION, "tmp", None).location(), None);
    }

    #[test]
    fn it_looks_up_each_level() {
        let catalog = catalog();

        assert!(matches!(
            catalog.lookup(ACCOUNT, None, None),
            Some(CatalogEntry::Catalog(_))
        ));
        assert!(matches!(
            catalog.lookup(ACCOUNT, Some("sales"), None),
            Some(CatalogEntry::Database(_))
        ));
        assert!(matches!(
            catalog.lookup(ACCOUNT, Some("sales"), Some("orders")),
            Some(CatalogEntry::Table(_))
        ));
        assert!(catalog.lookup(ACCOUNT, None, Some("orders")).is_none());
        assert!(catalog.lookup(ACCOUNT, Some("finance"), None).is_none());
    }

    #[test]
    fn it_narrows_wildcards_level_by_level() {
        let catalog = catalog();

        assert_eq!(
            identifiers(catalog.resolve_wildcard(ACCOUNT, Some("*"), Some("customers"))),
            vec![
                "arn:aws:glue:us-east-1:123456789012:table/sales/customers",
                "arn:aws:glue:us-east-1:123456789012:table/marketing/customers",
            ]
        );
        assert_eq!(
            identifiers(catalog.resolve_wildcard(ACCOUNT, Some("sales"), Some("*"))),
            vec![
                "arn:aws:glue:us-east-1:123456789012:table/sales/customers",
                "arn:aws:glue:us-east-1:123456789012:table/sales/orders",
            ]
        );
        assert_eq!(
            catalog.resolve_wildcard(ACCOUNT, Some("*"), Some("*")).len(),
            4
        );
        assert_eq!(catalog.resolve_wildcard("*", Some("*"), None).len(), 2);
        assert_eq!(
            identifiers(catalog.resolve_wildcard(ACCOUNT, Some("sales"), None)),
            vec!["arn:aws:glue:us-east-1:123456789012:database/sales"]
        );
        assert!(catalog
            .resolve_wildcard(ACCOUNT, Some("finance"), Some("*"))
            .is_empty());
        assert!(catalog.resolve_wildcard("999", Some("*"), None).is_empty());
    }

    #[test]
    fn it_traverses_depth_first() {
        let catalog = catalog();

        let kinds: Vec<&str> = catalog
            .iter()
            .map(|entry| match entry {
                CatalogEntry::Catalog(_) => "catalog",
                CatalogEntry::Database(_) => "database",
                CatalogEntry::Table(_) => "table",
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                "catalog", "database", "table", "table", "database", "table", "table"
            ]
        );
    }

    #[test]
    fn it_carries_the_catalog_partition_to_its_children() {
        let mut catalog = DataCatalog::default();
        catalog
            .add_catalog(Catalog::new(ACCOUNT, "cn-north-1").with_partition("aws-cn"))
            .unwrap();
        catalog
            .add_database(Database::new(ACCOUNT, "cn-north-1", "sales", None))
            .unwrap();
        catalog
            .add_table(Table::new(ACCOUNT, "cn-north-1", "sales", "orders", None))
            .unwrap();

        assert_eq!(
            catalog.tables().next().unwrap().table_ref().to_string(),
            "arn:aws-cn:glue:cn-north-1:123456789012:table/sales/orders"
        );
    }
}
