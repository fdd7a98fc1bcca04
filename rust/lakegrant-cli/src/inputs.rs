use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use lakegrant_catalog::{CatalogSnapshot, DataCatalog};
use lakegrant_engine::{CatalogAccessEvent, PolicyDocument, StorageAccessEvent};
use serde::de::DeserializeOwned;

use crate::InputSection;

/// Identity policies keyed by principal. A principal with an empty list
/// exists but holds no policy.
pub type IdentityPolicies = IndexMap<String, Vec<PolicyDocument>>;

/// Bucket policies keyed by bucket name
pub type BucketPolicies = IndexMap<String, PolicyDocument>;

/// Every optional input document, loaded
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// Identity policies, if configured
    pub identity_policies: Option<IdentityPolicies>,
    /// Bucket policies, if configured
    pub bucket_policies: Option<BucketPolicies>,
    /// Object-store audit events, if configured
    pub storage_events: Option<Vec<StorageAccessEvent>>,
    /// Catalog audit events, if configured
    pub catalog_events: Option<Vec<CatalogAccessEvent>>,
}

impl Inputs {
    /// Load every configured input document
    pub async fn load(section: &InputSection) -> Result<Self> {
        Ok(Self {
            identity_policies: read_optional_json(section.identity_policies.as_deref()).await?,
            bucket_policies: read_optional_json(section.bucket_policies.as_deref()).await?,
            storage_events: read_optional_json(section.storage_events.as_deref()).await?,
            catalog_events: read_optional_json(section.catalog_events.as_deref()).await?,
        })
    }

    /// Every principal named by the identity policies
    pub fn known_principals(&self) -> Vec<String> {
        self.identity_policies
            .iter()
            .flat_map(|policies| policies.keys().cloned())
            .collect()
    }

    /// The principals that hold at least one identity policy
    pub fn principals_with_policies(&self) -> Option<Vec<String>> {
        self.identity_policies.as_ref().map(|policies| {
            policies
                .iter()
                .filter(|(_, documents)| !documents.is_empty())
                .map(|(principal, _)| principal.clone())
                .collect()
        })
    }
}

/// Load the catalog snapshot. An inconsistent snapshot is an error.
pub async fn load_catalog(path: &Path) -> Result<DataCatalog> {
    let snapshot: CatalogSnapshot = read_json(path).await?;
    DataCatalog::try_from(snapshot)
        .with_context(|| format!("Catalog snapshot {} is inconsistent", path.display()))
}

/// Read and deserialize a JSON document
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Could not parse {}", path.display()))
}

async fn read_optional_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<Option<T>> {
    match path {
        Some(path) => Ok(Some(read_json(path).await?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn it_loads_only_configured_inputs() -> TestResult {
        let directory = tempfile::tempdir()?;
        let identity = directory.path().join("identity.json");
        tokio::fs::write(
            &identity,
            r#"{
                "arn:aws:iam::1:role/analyst": [
                    {
                        "Statement": [
                            { "Effect": "Allow", "Action": "s3:GetObject", "Resource": "*" }
                        ]
                    }
                ],
                "arn:aws:iam::1:user/idle": []
            }"#,
        )
        .await?;

        let inputs = Inputs::load(&InputSection {
            catalog: PathBuf::from("unused.json"),
            identity_policies: Some(identity),
            bucket_policies: None,
            storage_events: None,
            catalog_events: None,
        })
        .await?;

        assert_eq!(inputs.known_principals().len(), 2);
        assert_eq!(
            inputs.principals_with_policies(),
            Some(vec!["arn:aws:iam::1:role/analyst".to_owned()])
        );
        assert!(inputs.bucket_policies.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_an_inconsistent_catalog() -> TestResult {
        let directory = tempfile::tempdir()?;
        let catalog = directory.path().join("catalog.json");
        tokio::fs::write(
            &catalog,
            r#"{ "catalogs": [
                { "catalog_id": "1", "region": "us-east-1" },
                { "catalog_id": "1", "region": "us-east-1" }
            ] }"#,
        )
        .await?;

        assert!(load_catalog(&catalog).await.is_err());
        Ok(())
    }
}
