use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::LakegrantResourceError;

const PREFIX: &str = "arn";
const SEGMENT_COUNT: usize = 6;

/// The services whose resources and actions can be migrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// The data catalog service
    Glue,
    /// The object-store service
    S3,
}

impl Service {
    /// Every supported service, in a stable order
    pub const ALL: [Service; 2] = [Service::Glue, Service::S3];

    /// The name of this service as it appears in identifiers and action
    /// strings (e.g. `glue` in `glue:GetTable`)
    pub fn name(&self) -> &'static str {
        match self {
            Service::Glue => "glue",
            Service::S3 => "s3",
        }
    }
}

impl FromStr for Service {
    type Err = LakegrantResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glue" => Ok(Service::Glue),
            "s3" => Ok(Service::S3),
            _ => Err(LakegrantResourceError::MalformedIdentifier(format!(
                "Unknown service \"{s}\""
            ))),
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The six positional segments of a resource identifier, e.g.
/// `arn:aws:glue:us-east-1:123456789012:database/sales`.
///
/// Parsing only validates the shape: the identifier must start with `arn`
/// and have six colon-delimited segments. The final segment may itself
/// contain colons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ResourceIdentifier {
    partition: String,
    service: String,
    region: String,
    account: String,
    resource: String,
}

impl ResourceIdentifier {
    /// Assemble an identifier from its segments
    pub fn new(
        partition: impl Into<String>,
        service: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            service: service.into(),
            region: region.into(),
            account: account.into(),
            resource: resource.into(),
        }
    }

    /// The partition segment (typically `aws`)
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The raw service segment
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The region segment; empty for object-store identifiers
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The account segment; empty for object-store identifiers
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The trailing resource path
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The service segment as a known [`Service`], if it is one
    pub fn known_service(&self) -> Option<Service> {
        self.service.parse().ok()
    }
}

impl FromStr for ResourceIdentifier {
    type Err = LakegrantResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.splitn(SEGMENT_COUNT, ':').collect();

        let [prefix, partition, service, region, account, resource] = segments[..] else {
            return Err(LakegrantResourceError::MalformedIdentifier(format!(
                "Identifier format is \"arn:partition:service:region:account:resource\", \
                 but got \"{s}\""
            )));
        };

        if prefix != PREFIX {
            return Err(LakegrantResourceError::MalformedIdentifier(format!(
                "Identifier must start with \"{PREFIX}:\", but got \"{s}\""
            )));
        }

        Ok(Self::new(partition, service, region, account, resource))
    }
}

impl TryFrom<String> for ResourceIdentifier {
    type Error = LakegrantResourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceIdentifier> for String {
    fn from(value: ResourceIdentifier) -> Self {
        value.to_string()
    }
}

impl Display for ResourceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{PREFIX}:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

/// Returns true if the identifier names a catalog-service resource.
///
/// Fails with [`LakegrantResourceError::MalformedIdentifier`] if the string
/// does not have the identifier shape.
pub fn is_glue(id: &str) -> Result<bool, LakegrantResourceError> {
    Ok(id.parse::<ResourceIdentifier>()?.known_service() == Some(Service::Glue))
}

/// Returns true if the identifier names an object-store resource.
///
/// Fails with [`LakegrantResourceError::MalformedIdentifier`] if the string
/// does not have the identifier shape.
pub fn is_s3(id: &str) -> Result<bool, LakegrantResourceError> {
    Ok(id.parse::<ResourceIdentifier>()?.known_service() == Some(Service::S3))
}

/// The raw service segment of an identifier
pub fn service_of(id: &str) -> Result<String, LakegrantResourceError> {
    Ok(id.parse::<ResourceIdentifier>()?.service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_the_six_segments() {
        let id: ResourceIdentifier = "arn:aws:glue:us-east-1:123456789012:table/db/t"
            .parse()
            .unwrap();

        assert_eq!(id.partition(), "aws");
        assert_eq!(id.service(), "glue");
        assert_eq!(id.region(), "us-east-1");
        assert_eq!(id.account(), "123456789012");
        assert_eq!(id.resource(), "table/db/t");
        assert_eq!(id.known_service(), Some(Service::Glue));
    }

    #[test]
    fn it_keeps_colons_in_the_resource_segment() {
        let id: ResourceIdentifier = "arn:aws:s3:::bucket/a:b".parse().unwrap();

        assert_eq!(id.resource(), "bucket/a:b");
        assert_eq!(id.to_string(), "arn:aws:s3:::bucket/a:b");
    }

    #[test]
    fn it_rejects_identifiers_with_too_few_segments() {
        assert!(matches!(
            "arn:aws:glue:us-east-1".parse::<ResourceIdentifier>(),
            Err(LakegrantResourceError::MalformedIdentifier(_))
        ));
        assert!(is_glue("not-an-identifier").is_err());
        assert!(is_s3("arn:aws:s3").is_err());
    }

    #[test]
    fn it_rejects_identifiers_without_the_prefix() {
        assert!("urn:aws:glue:us-east-1:1:catalog"
            .parse::<ResourceIdentifier>()
            .is_err());
    }

    #[test]
    fn it_checks_the_service_positionally() {
        assert!(is_glue("arn:aws:glue:us-east-1:1:catalog").unwrap());
        assert!(!is_glue("arn:aws:s3:::bucket").unwrap());
        assert!(is_s3("arn:aws:s3:::bucket").unwrap());
        assert!(!is_s3("arn:aws:iam::1:role/admin").unwrap());
        assert_eq!(service_of("arn:aws:iam::1:role/admin").unwrap(), "iam");
    }
}
