//! The closed set of resource kinds that permissions can target.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{ResourceIdentifier, Service, WILDCARD};

const CATALOG_RESOURCE: &str = "catalog";
const DATABASE_PREFIX: &str = "database/";
const TABLE_PREFIX: &str = "table/";

/// The data catalog of one account in one region
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogRef {
    /// Partition segment of the identifier
    pub partition: String,
    /// Region that hosts the catalog
    pub region: String,
    /// Account that owns the catalog; doubles as the catalog id
    pub account: String,
}

/// A database within a catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseRef {
    /// Partition segment of the identifier
    pub partition: String,
    /// Region that hosts the catalog
    pub region: String,
    /// Account that owns the catalog
    pub account: String,
    /// Database name; may be the wildcard token
    pub database: String,
}

/// A table within a database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    /// Partition segment of the identifier
    pub partition: String,
    /// Region that hosts the catalog
    pub region: String,
    /// Account that owns the catalog
    pub account: String,
    /// Database name; may be the wildcard token
    pub database: String,
    /// Table name; may be the wildcard token
    pub table: String,
}

/// An object-store bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketRef {
    /// Partition segment of the identifier
    pub partition: String,
    /// Always empty for well-formed bucket identifiers
    pub region: String,
    /// Always empty for well-formed bucket identifiers
    pub account: String,
    /// Bucket name
    pub bucket: String,
}

/// A key (or key prefix) within an object-store bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Partition segment of the identifier
    pub partition: String,
    /// Always empty for well-formed object identifiers
    pub region: String,
    /// Always empty for well-formed object identifiers
    pub account: String,
    /// Bucket name
    pub bucket: String,
    /// Object key; may be empty and may end in a wildcard
    pub key: String,
}

/// A classified resource identifier.
///
/// Every well-formed identifier matches exactly one of the concrete
/// variants; anything else is [`Resource::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// `arn:p:glue:region:account:catalog`
    Catalog(CatalogRef),
    /// `arn:p:glue:region:account:database/<database>`
    Database(DatabaseRef),
    /// `arn:p:glue:region:account:table/<database>/<table>`
    Table(TableRef),
    /// `arn:p:s3:::<bucket>`
    Bucket(BucketRef),
    /// `arn:p:s3:::<bucket>/<key>`
    Object(ObjectRef),
    /// Anything that did not match one of the patterns above
    Unknown,
}

impl Resource {
    /// Classify a raw identifier string. Never fails: malformed or
    /// unsupported identifiers become [`Resource::Unknown`].
    pub fn classify(id: &str) -> Resource {
        match id.parse::<ResourceIdentifier>() {
            Ok(identifier) => Resource::from(&identifier),
            Err(error) => {
                tracing::debug!("Not classifying \"{id}\": {error}");
                Resource::Unknown
            }
        }
    }

    /// The service that owns this resource, if it is known
    pub fn service(&self) -> Option<Service> {
        match self {
            Resource::Catalog(_) | Resource::Database(_) | Resource::Table(_) => {
                Some(Service::Glue)
            }
            Resource::Bucket(_) | Resource::Object(_) => Some(Service::S3),
            Resource::Unknown => None,
        }
    }

    /// Returns true for anything other than [`Resource::Unknown`]
    pub fn is_known(&self) -> bool {
        !matches!(self, Resource::Unknown)
    }

    fn classify_glue(identifier: &ResourceIdentifier) -> Resource {
        let partition = identifier.partition().to_owned();
        let region = identifier.region().to_owned();
        let account = identifier.account().to_owned();
        let path = identifier.resource();

        if path == CATALOG_RESOURCE {
            return Resource::Catalog(CatalogRef {
                partition,
                region,
                account,
            });
        }

        if let Some(database) = path.strip_prefix(DATABASE_PREFIX) {
            if database.is_empty() || database.contains('/') {
                return Resource::Unknown;
            }
            return Resource::Database(DatabaseRef {
                partition,
                region,
                account,
                database: database.to_owned(),
            });
        }

        if let Some(rest) = path.strip_prefix(TABLE_PREFIX) {
            let segments: Vec<&str> = rest.split('/').collect();
            return match segments[..] {
                [database, table] if !database.is_empty() && !table.is_empty() => {
                    Resource::Table(TableRef {
                        partition,
                        region,
                        account,
                        database: database.to_owned(),
                        table: table.to_owned(),
                    })
                }
                // `table/*` is shorthand for every table of every database
                [WILDCARD] => Resource::Table(TableRef {
                    partition,
                    region,
                    account,
                    database: WILDCARD.to_owned(),
                    table: WILDCARD.to_owned(),
                }),
                _ => {
                    tracing::error!(
                        "Table identifier \"{identifier}\" needs both a database \
                         and a table segment"
                    );
                    Resource::Unknown
                }
            };
        }

        Resource::Unknown
    }

    fn classify_s3(identifier: &ResourceIdentifier) -> Resource {
        if !identifier.region().is_empty() || !identifier.account().is_empty() {
            return Resource::Unknown;
        }

        let partition = identifier.partition().to_owned();
        match identifier.resource().split_once('/') {
            None if !identifier.resource().is_empty() => Resource::Bucket(BucketRef {
                partition,
                region: String::new(),
                account: String::new(),
                bucket: identifier.resource().to_owned(),
            }),
            Some((bucket, key)) if !bucket.is_empty() => Resource::Object(ObjectRef {
                partition,
                region: String::new(),
                account: String::new(),
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            }),
            _ => Resource::Unknown,
        }
    }
}

impl From<&ResourceIdentifier> for Resource {
    fn from(identifier: &ResourceIdentifier) -> Self {
        match identifier.known_service() {
            Some(Service::Glue) => Resource::classify_glue(identifier),
            Some(Service::S3) => Resource::classify_s3(identifier),
            None => Resource::Unknown,
        }
    }
}

impl CatalogRef {
    /// The catalog id, which is the owning account
    pub fn catalog_id(&self) -> &str {
        &self.account
    }
}

impl DatabaseRef {
    /// The identifier of the catalog that holds this database
    pub fn catalog(&self) -> CatalogRef {
        CatalogRef {
            partition: self.partition.clone(),
            region: self.region.clone(),
            account: self.account.clone(),
        }
    }
}

impl TableRef {
    /// The identifier of the database that holds this table
    pub fn database_ref(&self) -> DatabaseRef {
        DatabaseRef {
            partition: self.partition.clone(),
            region: self.region.clone(),
            account: self.account.clone(),
            database: self.database.clone(),
        }
    }
}

impl BucketRef {
    /// A bucket identifier in the default partition
    pub fn named(bucket: impl Into<String>) -> Self {
        BucketRef {
            partition: "aws".into(),
            region: String::new(),
            account: String::new(),
            bucket: bucket.into(),
        }
    }
}

/// The identifier of the named bucket, e.g. `arn:aws:s3:::bucket`
pub fn bucket_arn(bucket: &str) -> String {
    BucketRef::named(bucket).to_string()
}

impl Display for CatalogRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:glue:{}:{}:{CATALOG_RESOURCE}",
            self.partition, self.region, self.account
        )
    }
}

impl Display for DatabaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:glue:{}:{}:{DATABASE_PREFIX}{}",
            self.partition, self.region, self.account, self.database
        )
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:glue:{}:{}:{TABLE_PREFIX}{}/{}",
            self.partition, self.region, self.account, self.database, self.table
        )
    }
}

impl Display for BucketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:s3:{}:{}:{}",
            self.partition, self.region, self.account, self.bucket
        )
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:s3:{}:{}:{}/{}",
            self.partition, self.region, self.account, self.bucket, self.key
        )
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Catalog(catalog) => catalog.fmt(f),
            Resource::Database(database) => database.fmt(f),
            Resource::Table(table) => table.fmt(f),
            Resource::Bucket(bucket) => bucket.fmt(f),
            Resource::Object(object) => object.fmt(f),
            Resource::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn it_builds_bucket_identifiers() {
        assert_eq!(bucket_arn("logs"), "arn:aws:s3:::logs");
        assert_eq!(
            Resource::classify(&bucket_arn("logs")),
            Resource::Bucket(BucketRef::named("logs"))
        );
    }

    #[test]
    fn it_classifies_a_catalog() {
        let resource = Resource::classify("arn:aws:glue:us-east-1:123:catalog");

        assert_eq!(
            resource,
            Resource::Catalog(CatalogRef {
                partition: "aws".into(),
                region: "us-east-1".into(),
                account: "123".into(),
            })
        );
        assert_eq!(resource.service(), Some(Service::Glue));
    }

    #[test]
    fn it_classifies_a_database() {
        let Resource::Database(database) =
            Resource::classify("arn:aws:glue:us-east-1:123:database/sales")
        else {
            panic!("Expected a database");
        };

        assert_eq!(database.database, "sales");
        assert_eq!(database.catalog().catalog_id(), "123");
    }

    #[test]
    fn it_expands_the_table_shorthand_into_two_wildcards() {
        let Resource::Table(table) = Resource::classify("arn:aws:glue:us-east-1:123:table/*")
        else {
            panic!("Expected a table");
        };

        assert_eq!(table.database, WILDCARD);
        assert_eq!(table.table, WILDCARD);
        assert_eq!(table.to_string(), "arn:aws:glue:us-east-1:123:table/*/*");
    }

    #[test]
    fn it_treats_a_short_table_path_as_unknown() {
        assert_eq!(
            Resource::classify("arn:aws:glue:us-east-1:123:table/sales"),
            Resource::Unknown
        );
        assert_eq!(
            Resource::classify("arn:aws:glue:us-east-1:123:table/sales/orders/extra"),
            Resource::Unknown
        );
    }

    #[test]
    fn it_distinguishes_buckets_from_objects() {
        assert_eq!(
            Resource::classify("arn:aws:s3:::bucket"),
            Resource::Bucket(BucketRef::named("bucket"))
        );

        let Resource::Object(object) = Resource::classify("arn:aws:s3:::bucket/") else {
            panic!("Expected an object");
        };
        assert_eq!(object.bucket, "bucket");
        assert_eq!(object.key, "");

        let Resource::Object(object) = Resource::classify("arn:aws:s3:::bucket/db/t/*") else {
            panic!("Expected an object");
        };
        assert_eq!(object.key, "db/t/*");
    }

    #[test]
    fn it_rejects_object_store_identifiers_with_a_region() {
        assert_eq!(
            Resource::classify("arn:aws:s3:us-east-1::bucket"),
            Resource::Unknown
        );
    }

    #[test]
    fn it_treats_other_services_as_unknown() {
        assert_eq!(
            Resource::classify("arn:aws:iam::123:role/admin"),
            Resource::Unknown
        );
        assert_eq!(Resource::classify("*"), Resource::Unknown);
        assert_eq!(
            Resource::classify("arn:aws:glue:us-east-1:123:userDefinedFunction/db/f"),
            Resource::Unknown
        );
    }

    #[test]
    fn it_keeps_the_partition_when_reconstructing() {
        let id = "arn:aws-cn:glue:cn-north-1:123:table/sales/orders";

        assert_eq!(Resource::classify(id).to_string(), id);
    }
}
