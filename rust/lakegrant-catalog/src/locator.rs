use lakegrant_resource::{STORAGE_SCHEME, TableRef, to_storage_location};

use crate::{DataCatalog, LakegrantCatalogError, LocationTree};

/// A table together with the storage location it was registered at
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableLocation {
    /// The table
    pub table: TableRef,
    /// The table's storage location, ending in `/`
    pub location: String,
}

/// Maps storage paths to the catalog tables whose data lives there.
///
/// Built once from a [`DataCatalog`]; tables without a location, or with a
/// location outside the `s3://` scheme, are left out.
#[derive(Debug, Clone, Default)]
pub struct TableLocator {
    tree: LocationTree<TableLocation>,
}

impl TableLocator {
    /// Index the storage location of every table in the catalog
    pub fn new(catalog: &DataCatalog) -> Self {
        let mut tree = LocationTree::default();
        let mut skipped = 0usize;

        for table in catalog.tables() {
            let Some(location) = table.location() else {
                skipped += 1;
                continue;
            };

            let value = TableLocation {
                table: table.table_ref(),
                location: location.to_owned(),
            };
            if tree.insert(location, value).is_none() {
                tracing::debug!(
                    "Not indexing {}.{} at unsupported location {location}",
                    table.database(),
                    table.name()
                );
                skipped += 1;
            }
        }

        tracing::debug!("Indexed table locations; skipped {skipped} tables");
        Self { tree }
    }

    /// The tables registered at the deepest registered directory enclosing
    /// `location`. An object deep inside a table's partition directories
    /// resolves to that table.
    pub fn tables_enclosing(&self, location: &str) -> Vec<&TableLocation> {
        self.tree
            .nearest_enclosing(location)
            .map(|node| node.values().collect())
            .unwrap_or_default()
    }

    /// Like [`TableLocator::tables_enclosing`], for an object-store resource
    /// identifier. The identifier always names a directory, so its last key
    /// segment is matched whole whether or not it ends in `/`. Identifiers of
    /// other services enclose no tables.
    pub fn tables_enclosing_arn(
        &self,
        id: &str,
    ) -> Result<Vec<&TableLocation>, LakegrantCatalogError> {
        Ok(directory_of(id)?
            .map(|location| self.tables_enclosing(&location))
            .unwrap_or_default())
    }

    /// Every table registered at or below the `location` directory
    pub fn tables_under(
        &self,
        location: &str,
    ) -> Result<Vec<&TableLocation>, LakegrantCatalogError> {
        if !location.starts_with(STORAGE_SCHEME) {
            return Err(LakegrantCatalogError::Resource(format!(
                "Expected a location starting with \"{STORAGE_SCHEME}\", but got \"{location}\""
            )));
        }
        Ok(self.tree.all_descendant_values(location))
    }

    /// Like [`TableLocator::tables_under`], for an object-store resource
    /// identifier read as a directory: `arn:aws:s3:::b/sales/orders` finds
    /// the tables under `s3://b/sales/orders/` and nothing beside it.
    /// Identifiers of other services have no tables under them.
    pub fn tables_under_arn(
        &self,
        id: &str,
    ) -> Result<Vec<&TableLocation>, LakegrantCatalogError> {
        match directory_of(id)? {
            Some(location) => self.tables_under(&location),
            None => Ok(Vec::new()),
        }
    }

    /// Every indexed table
    pub fn all_tables(&self) -> Vec<&TableLocation> {
        self.tree.all_descendant_values(STORAGE_SCHEME)
    }
}

/// The storage directory an object-store identifier names, ending in `/`
fn directory_of(id: &str) -> Result<Option<String>, LakegrantCatalogError> {
    Ok(to_storage_location(id)?.map(|mut location| {
        if !location.ends_with('/') {
            location.push('/');
        }
        location
    }))
}
