use std::ops::AddAssign;

use itertools::Itertools;
use lakegrant_catalog::{CatalogEntry, DataCatalog, TableLocator};
use lakegrant_ledger::PermissionLedger;
use lakegrant_resource::{
    Resource, ResourceIdentifier, Service, WILDCARD, from_storage_location, service_of,
    to_storage_location,
};

use crate::{
    Action, Effect, LakegrantEngineError, PolicyDocument, RawStatement, Statement,
    expand_action_pattern,
};

/// Counts of what a resolution skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Statements applied to the ledger
    pub statements: usize,
    /// Statements skipped for missing an effect, action or resource
    pub invalid_statements: usize,
    /// Resource patterns that were malformed or of an unsupported kind
    pub skipped_resources: usize,
    /// Action patterns that expanded to no supported action
    pub unmatched_actions: usize,
}

impl AddAssign for ResolutionReport {
    fn add_assign(&mut self, other: Self) {
        self.statements += other.statements;
        self.invalid_statements += other.invalid_statements;
        self.skipped_resources += other.skipped_resources;
        self.unmatched_actions += other.unmatched_actions;
    }
}

/// Resolves policy statements into concrete (principal, resource, action)
/// grants against a catalog and its table locations.
///
/// Every batch of statements is resolved in two passes: first every
/// `Allow` statement of the batch is added to the ledger, then every `Deny`
/// statement is removed from it. A deny therefore retracts a matching allow
/// of the same batch no matter which of the two appears first.
#[derive(Debug, Clone)]
pub struct StatementResolver<'a> {
    catalog: &'a DataCatalog,
    locator: &'a TableLocator,
    known_principals: Vec<String>,
}

impl<'a> StatementResolver<'a> {
    /// A resolver that expands wildcards against `catalog` and `locator`
    pub fn new(catalog: &'a DataCatalog, locator: &'a TableLocator) -> Self {
        Self {
            catalog,
            locator,
            known_principals: Vec::new(),
        }
    }

    /// Set the principals a `*` principal expands to
    pub fn with_known_principals<I, S>(mut self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_principals = principals.into_iter().map(Into::into).collect();
        self
    }

    /// The principals a `*` principal expands to
    pub fn known_principals(&self) -> &[String] {
        &self.known_principals
    }

    /// Resolve one batch of statements into `ledger`: the allow pass over
    /// the whole batch, then the deny pass over the whole batch
    pub fn resolve(
        &self,
        statements: &[Statement],
        ledger: &mut PermissionLedger,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        self.apply(Effect::Allow, statements, ledger, &mut report);
        self.apply(Effect::Deny, statements, ledger, &mut report);
        report
    }

    /// Resolve every identity policy of one principal as a single batch
    pub fn resolve_identity_policies(
        &self,
        principal: &str,
        documents: &[PolicyDocument],
        ledger: &mut PermissionLedger,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        let statements: Vec<Statement> = documents
            .iter()
            .flat_map(PolicyDocument::statements)
            .filter_map(|raw| validate(raw, &mut report))
            .map(|statement| statement.with_principals(vec![principal.to_owned()]))
            .collect();

        tracing::debug!(
            "Resolving {} statements of {principal}",
            statements.len()
        );
        report += self.resolve(&statements, ledger);
        report
    }

    /// Resolve the resource policy attached to `resource_arn` as a single
    /// batch. A `*` action stands for every action of the resource's
    /// service and a `*` resource for the resource itself. Principals come
    /// from each statement's `Principal` element.
    pub fn resolve_resource_policy(
        &self,
        resource_arn: &str,
        document: &PolicyDocument,
        ledger: &mut PermissionLedger,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        let service = match service_of(resource_arn) {
            Ok(service) => service,
            Err(error) => {
                tracing::warn!("Skipping resource policy of \"{resource_arn}\": {error}");
                report.skipped_resources += 1;
                return report;
            }
        };

        let statements: Vec<Statement> = document
            .statements()
            .into_iter()
            .filter_map(|raw| validate(raw, &mut report))
            .map(|mut statement| {
                if statement.actions.iter().any(|action| action == WILDCARD) {
                    statement.actions = vec![format!("{service}:{WILDCARD}")];
                }
                if statement.resources.iter().any(|resource| resource == WILDCARD) {
                    statement.resources = vec![resource_arn.to_owned()];
                }
                if statement.principals.is_empty() {
                    tracing::debug!(
                        "Statement in the policy of \"{resource_arn}\" names no account principal"
                    );
                }
                statement
            })
            .collect();

        report += self.resolve(&statements, ledger);
        report
    }

    /// Expand one resource pattern into concrete resource identifiers.
    ///
    /// Object-store patterns ending in `*` become one `<table location>*`
    /// pattern per table registered under the prefix. Database and table
    /// patterns become the matching catalog entries. Anything else that
    /// classifies passes through unchanged.
    pub fn expand_resource(&self, pattern: &str) -> Result<Vec<String>, LakegrantEngineError> {
        let identifier: ResourceIdentifier = pattern.parse()?;

        match identifier.known_service() {
            Some(Service::S3) => match pattern.strip_suffix(WILDCARD) {
                Some(prefix) => self.expand_storage_prefix(prefix),
                None if Resource::from(&identifier).is_known() => Ok(vec![pattern.to_owned()]),
                None => Err(LakegrantEngineError::Resource(format!(
                    "Unsupported object-store resource \"{pattern}\""
                ))),
            },
            Some(Service::Glue) => {
                let entries = match Resource::from(&identifier) {
                    Resource::Catalog(_) => return Ok(vec![pattern.to_owned()]),
                    Resource::Database(database) => {
                        self.catalog.resolve_wildcard(
                            &database.account,
                            Some(database.database.as_str()),
                            None,
                        )
                    }
                    Resource::Table(table) => self.catalog.resolve_wildcard(
                        &table.account,
                        Some(table.database.as_str()),
                        Some(table.table.as_str()),
                    ),
                    _ => {
                        return Err(LakegrantEngineError::Resource(format!(
                            "Unsupported catalog resource \"{pattern}\""
                        )));
                    }
                };
                Ok(entries.iter().map(CatalogEntry::identifier).collect())
            }
            None => Err(LakegrantEngineError::Resource(format!(
                "Unsupported service in \"{pattern}\""
            ))),
        }
    }

    fn expand_storage_prefix(&self, prefix: &str) -> Result<Vec<String>, LakegrantEngineError> {
        let identifier: ResourceIdentifier = prefix.parse()?;

        let tables = if identifier.resource().is_empty() {
            self.locator.all_tables()
        } else {
            let location = to_storage_location(prefix)?.ok_or_else(|| {
                LakegrantEngineError::Resource(format!(
                    "Unsupported object-store prefix \"{prefix}\""
                ))
            })?;
            let directory = if location.ends_with('/') {
                location
            } else {
                format!("{location}/")
            };
            self.locator.tables_under(&directory)?
        };

        let resources = tables
            .into_iter()
            .map(|table| {
                from_storage_location(&table.location).map(|object| format!("{object}{WILDCARD}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(resources.into_iter().unique().collect())
    }

    fn expand_principals(&self, principals: &[String]) -> Vec<String> {
        principals
            .iter()
            .flat_map(|principal| {
                if principal == WILDCARD {
                    self.known_principals.clone()
                } else {
                    vec![principal.clone()]
                }
            })
            .unique()
            .collect()
    }

    fn apply(
        &self,
        effect: Effect,
        statements: &[Statement],
        ledger: &mut PermissionLedger,
        report: &mut ResolutionReport,
    ) {
        for statement in statements.iter().filter(|statement| statement.effect == effect) {
            report.statements += 1;

            let principals = self.expand_principals(&statement.principals);

            let mut actions: Vec<Action> = Vec::new();
            for pattern in &statement.actions {
                let expanded = expand_action_pattern(pattern);
                if expanded.is_empty() {
                    report.unmatched_actions += 1;
                }
                actions.extend(expanded);
            }

            let mut resources: Vec<String> = Vec::new();
            for pattern in &statement.resources {
                match self.expand_resource(pattern) {
                    Ok(expanded) => resources.extend(expanded),
                    Err(error) => {
                        tracing::warn!("Skipping resource \"{pattern}\": {error}");
                        report.skipped_resources += 1;
                    }
                }
            }

            tracing::debug!(
                "{effect:?} {} actions on {} resources for {} principals",
                actions.len(),
                resources.len(),
                principals.len()
            );

            for resource in resources.iter().unique() {
                let Some(service) = Resource::classify(resource).service() else {
                    continue;
                };
                let applicable: Vec<String> = actions
                    .iter()
                    .filter(|action| action.service() == service)
                    .map(ToString::to_string)
                    .collect();
                if applicable.is_empty() {
                    continue;
                }

                for principal in &principals {
                    match effect {
                        Effect::Allow => {
                            ledger.add_actions(principal, resource, &applicable);
                        }
                        Effect::Deny => ledger.remove(principal, resource, &applicable),
                    }
                }
            }
        }
    }
}

fn validate(raw: RawStatement, report: &mut ResolutionReport) -> Option<Statement> {
    match Statement::try_from(raw) {
        Ok(statement) => Some(statement),
        Err(error) => {
            tracing::warn!("Skipping statement: {error}");
            report.invalid_statements += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use lakegrant_catalog::{Catalog, Database, Table};
    use pretty_assertions::assert_eq;

    use super::*;

    const ACCOUNT: &str = "123456789012";
    const REGION: &str = "us-east-1";

    fn catalog() -> DataCatalog {
        let mut catalog = DataCatalog::default();
        catalog.add_catalog(Catalog::new(ACCOUNT, REGION)).unwrap();
        for database in ["sales", "hr"] {
            catalog
                .add_database(Database::new(ACCOUNT, REGION, database, None))
                .unwrap();
        }
        for (database, table) in [("sales", "orders"), ("sales", "returns"), ("hr", "people")] {
            catalog
                .add_table(Table::new(
                    ACCOUNT,
                    REGION,
                    database,
                    table,
                    Some(format!("s3://bucket/{database}/{table}/")),
                ))
                .unwrap();
        }
        catalog
    }

    fn table_arn(database: &str, table: &str) -> String {
        format!("arn:aws:glue:{REGION}:{ACCOUNT}:table/{database}/{table}")
    }

    #[test]
    fn it_expands_catalog_wildcards() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver = StatementResolver::new(&catalog, &locator);

        let tables = resolver
            .expand_resource(&format!("arn:aws:glue:{REGION}:{ACCOUNT}:table/sales/*"))
            .unwrap();
        let databases = resolver
            .expand_resource(&format!("arn:aws:glue:{REGION}:*:database/*"))
            .unwrap();

        assert_eq!(
            tables,
            vec![table_arn("sales", "orders"), table_arn("sales", "returns")]
        );
        assert_eq!(databases.len(), 2);
    }

    #[test]
    fn it_drops_catalog_resources_that_do_not_exist() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver = StatementResolver::new(&catalog, &locator);

        assert!(
            resolver
                .expand_resource(&table_arn("sales", "missing"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn it_expands_storage_prefixes_to_table_locations() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver = StatementResolver::new(&catalog, &locator);

        assert_eq!(
            resolver.expand_resource("arn:aws:s3:::bucket/sales/*").unwrap(),
            vec![
                "arn:aws:s3:::bucket/sales/orders/*",
                "arn:aws:s3:::bucket/sales/returns/*"
            ]
        );
        assert_eq!(resolver.expand_resource("arn:aws:s3:::*").unwrap().len(), 3);
        assert_eq!(
            resolver.expand_resource("arn:aws:s3:::bucket/hr/people/part-0").unwrap(),
            vec!["arn:aws:s3:::bucket/hr/people/part-0"]
        );
    }

    #[test]
    fn it_rejects_unclassifiable_resources() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver = StatementResolver::new(&catalog, &locator);

        assert!(resolver.expand_resource(WILDCARD).is_err());
        assert!(resolver.expand_resource("arn:aws:dynamodb:us-east-1:1:table/t").is_err());
        assert!(resolver.expand_resource("arn:aws:glue:us-east-1:1:connection/c").is_err());
    }

    #[test]
    fn it_keeps_actions_on_resources_of_their_own_service() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver = StatementResolver::new(&catalog, &locator);
        let mut ledger = PermissionLedger::default();

        let statement = Statement::new(
            Effect::Allow,
            "alice",
            [table_arn("hr", "people").as_str(), "arn:aws:s3:::bucket/hr/*"],
            ["glue:GetTable", "s3:GetObject"],
        );
        resolver.resolve(&[statement], &mut ledger);

        assert_eq!(
            ledger.actions("alice", &table_arn("hr", "people")).cloned(),
            Some(BTreeSet::from(["glue:GetTable".to_owned()]))
        );
        assert_eq!(
            ledger.actions("alice", "arn:aws:s3:::bucket/hr/people/*").cloned(),
            Some(BTreeSet::from(["s3:GetObject".to_owned()]))
        );
    }

    #[test]
    fn it_expands_the_any_principal() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver =
            StatementResolver::new(&catalog, &locator).with_known_principals(["alice", "bob"]);
        let mut ledger = PermissionLedger::default();

        let statement = Statement::new(
            Effect::Allow,
            WILDCARD,
            [table_arn("hr", "people").as_str()],
            ["glue:GetTable"],
        );
        resolver.resolve(&[statement], &mut ledger);

        assert_eq!(ledger.principals().collect::<Vec<_>>(), vec!["alice", "bob"]);
    }

    #[test]
    fn it_counts_what_it_skips() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver = StatementResolver::new(&catalog, &locator);
        let mut ledger = PermissionLedger::default();

        let document: PolicyDocument = serde_json::from_str(
            r#"{
                "Statement": [
                    {
                        "Effect": "Allow",
                        "Action": ["dynamodb:*", "glue:GetTable"],
                        "Resource": ["*", "arn:aws:glue:us-east-1:123456789012:table/hr/people"]
                    },
                    { "Effect": "Allow", "Resource": "*" }
                ]
            }"#,
        )
        .unwrap();
        let report = resolver.resolve_identity_policies("alice", &[document], &mut ledger);

        assert_eq!(
            report,
            ResolutionReport {
                statements: 1,
                invalid_statements: 1,
                skipped_resources: 1,
                unmatched_actions: 1,
            }
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn it_rewrites_wildcards_in_resource_policies() {
        let catalog = catalog();
        let locator = TableLocator::new(&catalog);
        let resolver =
            StatementResolver::new(&catalog, &locator).with_known_principals(["alice", "bob"]);
        let mut ledger = PermissionLedger::default();

        let document: PolicyDocument = serde_json::from_str(
            r#"{
                "Statement": [
                    {
                        "Effect": "Allow",
                        "Principal": { "AWS": "*" },
                        "Action": "*",
                        "Resource": "*"
                    },
                    {
                        "Effect": "Deny",
                        "Principal": { "AWS": ["bob"] },
                        "Action": "s3:Put*",
                        "Resource": "*"
                    }
                ]
            }"#,
        )
        .unwrap();
        resolver.resolve_resource_policy("arn:aws:s3:::bucket/hr/people/", &document, &mut ledger);

        assert_eq!(ledger.len(), 2);
        assert_eq!(
            ledger
                .actions("alice", "arn:aws:s3:::bucket/hr/people/")
                .map(|actions| actions.len()),
            Some(6)
        );
        assert!(
            !ledger
                .actions("bob", "arn:aws:s3:::bucket/hr/people/")
                .unwrap()
                .contains("s3:PutObject")
        );
    }
}
