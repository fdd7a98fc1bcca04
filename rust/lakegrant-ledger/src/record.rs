use std::{collections::BTreeSet, fmt::Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::LakegrantLedgerError;

/// One resolved grant: a principal may perform a set of actions on a
/// resource. The action set is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPermissionRecord")]
pub struct PermissionRecord {
    principal: String,
    resource: String,
    actions: BTreeSet<String>,
}

#[derive(Deserialize)]
struct RawPermissionRecord {
    principal: String,
    resource: String,
    actions: BTreeSet<String>,
}

impl TryFrom<RawPermissionRecord> for PermissionRecord {
    type Error = LakegrantLedgerError;

    fn try_from(value: RawPermissionRecord) -> Result<Self, Self::Error> {
        PermissionRecord::new(value.principal, value.resource, value.actions)
    }
}

impl PermissionRecord {
    /// Build a record, failing with [`LakegrantLedgerError::EmptyActions`]
    /// if `actions` yields nothing
    pub fn new<A>(
        principal: impl Into<String>,
        resource: impl Into<String>,
        actions: impl IntoIterator<Item = A>,
    ) -> Result<Self, LakegrantLedgerError>
    where
        A: Into<String>,
    {
        let principal = principal.into();
        let resource = resource.into();
        let actions: BTreeSet<String> = actions.into_iter().map(Into::into).collect();

        if actions.is_empty() {
            return Err(LakegrantLedgerError::EmptyActions(format!(
                "{principal} on {resource}"
            )));
        }

        Ok(Self {
            principal,
            resource,
            actions,
        })
    }

    /// The principal that holds the grant
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// The resource the grant applies to
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The granted actions, in sorted order
    pub fn actions(&self) -> &BTreeSet<String> {
        &self.actions
    }

    /// Decompose the record into (principal, resource, actions)
    pub fn into_parts(self) -> (String, String, BTreeSet<String>) {
        (self.principal, self.resource, self.actions)
    }
}

impl Display for PermissionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} [{}]",
            self.principal,
            self.resource,
            self.actions.iter().join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_refuses_to_build_a_record_without_actions() {
        let result = PermissionRecord::new("role/a", "table/db/t", Vec::<String>::new());

        assert!(matches!(result, Err(LakegrantLedgerError::EmptyActions(_))));
    }

    #[test]
    fn it_deduplicates_and_sorts_actions() {
        let record =
            PermissionRecord::new("role/a", "table/db/t", ["SELECT", "ALTER", "SELECT"]).unwrap();

        assert_eq!(
            record.actions().iter().collect::<Vec<_>>(),
            vec!["ALTER", "SELECT"]
        );
        assert_eq!(record.to_string(), "role/a table/db/t [ALTER,SELECT]");
    }

    #[test]
    fn it_refuses_to_deserialize_a_record_without_actions() {
        let raw = r#"{"principal":"role/a","resource":"table/db/t","actions":[]}"#;

        assert!(serde_json::from_str::<PermissionRecord>(raw).is_err());
    }
}
