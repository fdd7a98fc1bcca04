use itertools::Itertools;
use lakegrant_resource::{STORAGE_SCHEME, normalize_storage_location};

use crate::DataCatalog;

/// The smallest sorted set of storage prefixes that covers every database
/// and table location in the catalog.
///
/// Locations are normalized onto `s3://` with a trailing `/`, nested
/// locations are folded into their ancestors, and runs of sibling
/// locations are repeatedly folded into their shared parent directory. A
/// location is never folded into the bare scheme.
pub fn data_locations(catalog: &DataCatalog) -> Vec<String> {
    let mut locations: Vec<String> = catalog
        .databases()
        .filter_map(|database| database.location())
        .chain(catalog.tables().filter_map(|table| table.location()))
        .filter_map(normalize_storage_location)
        .sorted()
        .collect();

    // Sorted order puts every location right after the ancestor it nests in
    locations.dedup_by(|next, kept| next.starts_with(kept.as_str()));

    let mut index = 0;
    while index < locations.len() {
        let Some(parent) = parent_location(&locations[index]) else {
            index += 1;
            continue;
        };

        let siblings = locations[index + 1..]
            .iter()
            .take_while(|location| location.starts_with(parent.as_str()))
            .count();

        if siblings == 0 {
            index += 1;
            continue;
        }

        locations.drain(index + 1..=index + siblings);
        locations[index] = parent;
    }

    tracing::debug!("Derived {} data locations", locations.len());
    locations
}

fn parent_location(location: &str) -> Option<String> {
    let directory = location.strip_suffix('/').unwrap_or(location);
    let (parent, _) = directory.rsplit_once('/')?;
    let parent = format!("{parent}/");

    (parent != STORAGE_SCHEME).then_some(parent)
}
