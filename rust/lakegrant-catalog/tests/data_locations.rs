use anyhow::Result;
use lakegrant_catalog::{Catalog, DataCatalog, Database, Table, data_locations};
use pretty_assertions::assert_eq;

const ACCOUNT: &str = "123456789012";
const REGION: &str = "us-east-1";

#[test]
fn it_folds_locations_into_their_shared_parents() -> Result<()> {
    let mut catalog = DataCatalog::default();
    catalog.add_catalog(Catalog::new(ACCOUNT, REGION))?;

    catalog.add_database(Database::new(
        ACCOUNT,
        REGION,
        "warehouse",
        Some("s3://bucket/warehouse/".into()),
    ))?;
    for table in ["orders", "returns", "refunds"] {
        catalog.add_table(Table::new(
            ACCOUNT,
            REGION,
            "warehouse",
            table,
            Some(format!("s3://bucket/warehouse/{table}/")),
        ))?;
    }

    catalog.add_database(Database::new(
        ACCOUNT,
        REGION,
        "staging",
        Some("s3a://bucket/staging_location".into()),
    ))?;
    for (table, location) in [
        ("orders", "s3://bucket/staging/orders"),
        ("returns", "s3://bucket/staging/returns"),
        ("refunds", "s3://bucket/staging_abc/refunds"),
        ("clicks", "s3://bucket_2/events_abc/clicks"),
        ("views", "s3://bucket_2/events_abc/views"),
        ("sessions", "s3://bucket_2/events_def/sessions"),
        ("errors", "s3://bucket_2/events_def/errors"),
        ("access", "s3://bucket_3/logs/access"),
        ("audit", "s3://bucket_3/logs/audit"),
    ] {
        catalog.add_table(Table::new(
            ACCOUNT,
            REGION,
            "staging",
            table,
            Some(location.into()),
        ))?;
    }

    assert_eq!(
        data_locations(&catalog),
        vec!["s3://bucket/", "s3://bucket_2/", "s3://bucket_3/logs/"]
    );
    Ok(())
}

#[test]
fn it_keeps_lone_locations_and_skips_other_schemes() -> Result<()> {
    let mut catalog = DataCatalog::default();
    catalog.add_catalog(Catalog::new(ACCOUNT, REGION))?;
    catalog.add_database(Database::new(ACCOUNT, REGION, "db", None))?;
    catalog.add_table(Table::new(
        ACCOUNT,
        REGION,
        "db",
        "only",
        Some("s3://bucket/db/only".into()),
    ))?;
    catalog.add_table(Table::new(
        ACCOUNT,
        REGION,
        "db",
        "copy",
        Some("s3://bucket/db/only/".into()),
    ))?;
    catalog.add_table(Table::new(
        ACCOUNT,
        REGION,
        "db",
        "elsewhere",
        Some("hdfs://namenode/db/elsewhere".into()),
    ))?;

    assert_eq!(data_locations(&catalog), vec!["s3://bucket/db/only/"]);
    Ok(())
}
