use crate::{LakegrantResourceError, ObjectRef, Resource, ResourceIdentifier};

/// The scheme of object-store locations as recorded in the catalog
pub const STORAGE_SCHEME: &str = "s3://";

/// An alternate scheme some writers record for the same locations
pub const ALTERNATE_STORAGE_SCHEME: &str = "s3a://";

/// Convert an object-store identifier into its storage location, e.g.
/// `arn:aws:s3:::bucket/db/t/` into `s3://bucket/db/t/`.
///
/// Returns `None` for identifiers that are well formed but do not name an
/// object-store resource.
pub fn to_storage_location(id: &str) -> Result<Option<String>, LakegrantResourceError> {
    let identifier: ResourceIdentifier = id.parse()?;

    Ok(match Resource::from(&identifier) {
        Resource::Bucket(bucket) => Some(format!("{STORAGE_SCHEME}{}", bucket.bucket)),
        Resource::Object(object) => Some(format!(
            "{STORAGE_SCHEME}{}/{}",
            object.bucket, object.key
        )),
        _ => None,
    })
}

/// Convert a storage location into the object identifier of the "directory"
/// it names. The resulting key always ends in `/`:
///
/// ```rust
/// # use lakegrant_resource::from_storage_location;
/// assert_eq!(
///     from_storage_location("s3://bucket/path1/path2").unwrap().to_string(),
///     "arn:aws:s3:::bucket/path1/path2/"
/// );
/// assert_eq!(
///     from_storage_location("s3a://bucket/").unwrap().to_string(),
///     "arn:aws:s3:::bucket/"
/// );
/// ```
pub fn from_storage_location(location: &str) -> Result<ObjectRef, LakegrantResourceError> {
    let path = strip_storage_scheme(location).ok_or_else(|| {
        LakegrantResourceError::UnsupportedLocation(format!(
            "Location must start with \"{STORAGE_SCHEME}\" or \"{ALTERNATE_STORAGE_SCHEME}\", \
             but got \"{location}\""
        ))
    })?;

    let path = path.strip_suffix('/').unwrap_or(path);
    let (bucket, key) = match path.split_once('/') {
        Some((bucket, key)) => (bucket, format!("{key}/")),
        None => (path, String::new()),
    };

    if bucket.is_empty() {
        return Err(LakegrantResourceError::UnsupportedLocation(format!(
            "Location \"{location}\" does not name a bucket"
        )));
    }

    Ok(ObjectRef {
        partition: "aws".into(),
        region: String::new(),
        account: String::new(),
        bucket: bucket.to_owned(),
        key,
    })
}

/// Rewrite a location onto the canonical scheme and ensure it ends in `/`.
/// Returns `None` for locations on other schemes.
pub fn normalize_storage_location(location: &str) -> Option<String> {
    let path = strip_storage_scheme(location)?;
    let mut normalized = format!("{STORAGE_SCHEME}{path}");
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Some(normalized)
}

fn strip_storage_scheme(location: &str) -> Option<&str> {
    location
        .strip_prefix(STORAGE_SCHEME)
        .or_else(|| location.strip_prefix(ALTERNATE_STORAGE_SCHEME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_converts_objects_and_buckets_to_locations() {
        assert_eq!(
            to_storage_location("arn:aws:s3:::bucket/db/t/").unwrap(),
            Some("s3://bucket/db/t/".to_owned())
        );
        assert_eq!(
            to_storage_location("arn:aws:s3:::bucket").unwrap(),
            Some("s3://bucket".to_owned())
        );
        assert_eq!(
            to_storage_location("arn:aws:glue:us-east-1:1:catalog").unwrap(),
            None
        );
        assert!(to_storage_location("s3://bucket").is_err());
    }

    #[test]
    fn it_appends_a_separator_to_every_segment() {
        assert_eq!(
            from_storage_location("s3://bucket/path1/path2/path3")
                .unwrap()
                .to_string(),
            "arn:aws:s3:::bucket/path1/path2/path3/"
        );
        assert_eq!(
            from_storage_location("s3://bucket/path1/path2/path3/")
                .unwrap()
                .to_string(),
            "arn:aws:s3:::bucket/path1/path2/path3/"
        );
        assert_eq!(
            from_storage_location("s3://bucket").unwrap().to_string(),
            "arn:aws:s3:::bucket/"
        );
    }

    #[test]
    fn it_rejects_unsupported_schemes() {
        assert!(matches!(
            from_storage_location("hdfs://bucket/path"),
            Err(LakegrantResourceError::UnsupportedLocation(_))
        ));
        assert!(from_storage_location("s3://").is_err());
    }

    #[test]
    fn it_normalizes_locations() {
        assert_eq!(
            normalize_storage_location("s3a://bucket/db"),
            Some("s3://bucket/db/".to_owned())
        );
        assert_eq!(
            normalize_storage_location("s3://bucket/db/"),
            Some("s3://bucket/db/".to_owned())
        );
        assert_eq!(normalize_storage_location("file:///tmp"), None);
    }
}
