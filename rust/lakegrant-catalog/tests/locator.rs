use lakegrant_catalog::{
    Catalog, DataCatalog, Database, LakegrantCatalogError, LocationTree, Table, TableLocation,
    TableLocator,
};
use proptest::prelude::*;
use testresult::TestResult;

const ACCOUNT: &str = "123456789012";
const REGION: &str = "us-east-1";

fn add_table(
    catalog: &mut DataCatalog,
    database: &str,
    table: &str,
    location: &str,
) -> Result<(), LakegrantCatalogError> {
    if catalog.database(ACCOUNT, database).is_none() {
        catalog.add_database(Database::new(ACCOUNT, REGION, database, None))?;
    }
    catalog.add_table(Table::new(
        ACCOUNT,
        REGION,
        database,
        table,
        Some(location.to_owned()),
    ))
}

fn estate() -> Result<DataCatalog, LakegrantCatalogError> {
    let mut catalog = DataCatalog::default();
    catalog.add_catalog(Catalog::new(ACCOUNT, REGION))?;

    for (database, table, location) in [
        ("warehouse", "orders", "s3://bucket_1/warehouse/orders/"),
        ("warehouse", "returns", "s3://bucket_1/warehouse/returns/"),
        ("warehouse", "refunds", "s3://bucket_1/warehouse/refunds/"),
        ("staging", "orders", "s3://bucket_1/staging/orders"),
        ("staging", "returns", "s3://bucket_1/staging/returns"),
        ("events", "clicks", "s3://bucket_2/events/clicks"),
        ("events", "views", "s3://bucket_2/events/views"),
        ("events", "sessions", "s3://bucket_2/events/sessions"),
        ("logs", "access", "s3://bucket_3/logs/access/"),
        ("logs", "errors", "s3://bucket_3/logs/errors/dt=2024/"),
        ("shared_a", "shared", "s3://bucket_4/shared/data/"),
        ("shared_b", "shared", "s3://bucket_4/shared/data/"),
        ("shared_c", "shared", "s3://bucket_4/shared/data/"),
        ("archive", "legacy", "hdfs://namenode/legacy/"),
    ] {
        add_table(&mut catalog, database, table, location)?;
    }

    catalog.add_table(Table::new(ACCOUNT, REGION, "archive", "virtual", None))?;
    Ok(catalog)
}

fn names(tables: Vec<&TableLocation>) -> Vec<String> {
    let mut names: Vec<String> = tables
        .into_iter()
        .map(|location| format!("{}.{}", location.table.database, location.table.table))
        .collect();
    names.sort();
    names
}

#[test]
fn it_maps_a_partitioned_object_to_its_table() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert_eq!(
        names(locator.tables_enclosing("s3://bucket_2/events/clicks/dt=2024-01-01/part-0.json")),
        vec!["events.clicks"]
    );
    assert_eq!(
        names(locator.tables_enclosing("s3://bucket_3/logs/errors/dt=2024/hour=01/file.txt")),
        vec!["logs.errors"]
    );
    Ok(())
}

#[test]
fn it_finds_no_table_above_every_registered_location() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert!(locator.tables_enclosing("s3://bucket_2/warehouse/").is_empty());
    assert!(locator.tables_enclosing("s3://bucket_2/warehouse/orders/").is_empty());
    assert!(locator.tables_enclosing("s3://bucket_9/events/").is_empty());
    Ok(())
}

#[test]
fn it_returns_every_table_sharing_a_location() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert_eq!(
        names(locator.tables_enclosing("s3://bucket_4/shared/data/")),
        vec!["shared_a.shared", "shared_b.shared", "shared_c.shared"]
    );
    assert_eq!(
        names(locator.tables_enclosing_arn("arn:aws:s3:::bucket_4/shared/data/")?),
        vec!["shared_a.shared", "shared_b.shared", "shared_c.shared"]
    );
    assert_eq!(names(locator.tables_under("s3://bucket_4/")?).len(), 3);
    Ok(())
}

#[test]
fn it_collects_every_table_under_a_prefix() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert_eq!(
        names(locator.tables_under("s3://bucket_2/events/")?),
        vec!["events.clicks", "events.sessions", "events.views"]
    );
    assert_eq!(
        names(locator.tables_under_arn("arn:aws:s3:::bucket_1/warehouse/")?),
        vec!["warehouse.orders", "warehouse.refunds", "warehouse.returns"]
    );
    assert!(locator.tables_under("s3://bucket_1/nothing/")?.is_empty());
    Ok(())
}

#[test]
fn it_reads_an_identifier_without_a_trailing_slash_as_a_directory() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert_eq!(
        names(locator.tables_under_arn("arn:aws:s3:::bucket_1/warehouse/orders")?),
        vec!["warehouse.orders"]
    );
    assert_eq!(
        names(locator.tables_under_arn("arn:aws:s3:::bucket_2/events")?),
        vec!["events.clicks", "events.sessions", "events.views"]
    );
    assert_eq!(
        names(locator.tables_enclosing_arn("arn:aws:s3:::bucket_1/warehouse/orders")?),
        vec!["warehouse.orders"]
    );
    assert_eq!(
        names(locator.tables_enclosing_arn("arn:aws:s3:::bucket_4/shared/data")?),
        vec!["shared_a.shared", "shared_b.shared", "shared_c.shared"]
    );
    assert_eq!(names(locator.tables_under_arn("arn:aws:s3:::bucket_3")?).len(), 2);
    Ok(())
}

#[test]
fn it_matches_no_table_from_part_of_a_directory_name() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert!(locator.tables_under_arn("arn:aws:s3:::bucket_1/warehouse/ord")?.is_empty());
    assert!(locator.tables_under_arn("arn:aws:s3:::bucket_1/ware")?.is_empty());
    assert!(locator.tables_enclosing_arn("arn:aws:s3:::bucket_1/warehouse/ord")?.is_empty());
    assert!(locator.tables_enclosing_arn("arn:aws:s3:::bucket_4/shared/dat")?.is_empty());
    Ok(())
}

#[test]
fn it_indexes_only_tables_on_the_supported_scheme() -> TestResult {
    let locator = TableLocator::new(&estate()?);

    assert_eq!(locator.all_tables().len(), 13);
    assert!(locator.tables_under("hdfs://namenode/").is_err());
    assert!(locator.tables_under_arn("not-an-identifier").is_err());
    assert!(
        locator
            .tables_under_arn("arn:aws:glue:us-east-1:123456789012:catalog")?
            .is_empty()
    );
    Ok(())
}

proptest! {
    #[test]
    fn it_finds_every_table_under_a_shared_prefix_in_any_order(
        tables in prop::collection::btree_set("[a-z]{1,8}(/[a-z]{1,8}){0,2}", 1..12)
            .prop_map(|tables| tables.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut tree = LocationTree::default();
        for (index, table) in tables.iter().enumerate() {
            tree.insert(&format!("s3://bucket/prefix/{table}/"), index);
        }

        let mut found: Vec<usize> = tree
            .all_descendant_values("s3://bucket/prefix/")
            .into_iter()
            .copied()
            .collect();
        found.sort();

        prop_assert_eq!(found, (0..tables.len()).collect::<Vec<_>>());
    }

    #[test]
    fn it_finds_a_table_from_any_depth_below_it(
        partitions in prop::collection::vec("[a-z]{1,6}=[0-9]{1,4}", 0..5),
        file in "[a-z]{1,8}\\.parquet"
    ) {
        let mut tree = LocationTree::default();
        tree.insert("s3://bucket/db/table/", "table");
        tree.insert("s3://bucket/db/", "database");

        let directories: String = partitions.iter().map(|p| format!("{p}/")).collect();
        let path = format!("s3://bucket/db/table/{directories}{file}");
        let node = tree.nearest_enclosing(&path).unwrap();

        prop_assert_eq!(node.values().collect::<Vec<_>>(), vec![&"table"]);
    }
}
