use std::collections::BTreeSet;

use lakegrant_catalog::TableLocator;
use lakegrant_ledger::PermissionLedger;
use lakegrant_resource::{Resource, Service};

use crate::{Action, GrantVerb};

/// Counts of what a translation dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Source records read
    pub records: usize,
    /// Actions with no verb mapping, or of the wrong service for their
    /// resource
    pub untranslated_actions: usize,
    /// Storage records with no enclosing table
    pub unmapped_storage: usize,
    /// Records on resources that could not be classified
    pub unknown_resources: usize,
}

/// Translates a ledger of source actions into a ledger of target grant
/// verbs.
///
/// Catalog records keep their resource. Storage records are re-targeted to
/// the tables whose registered location most closely encloses the storage
/// path, and are dropped when there is none. Records left with no verb are
/// omitted. Verbs for the same (principal, resource) accumulate.
#[derive(Debug, Clone, Copy)]
pub struct GrantTranslator<'a> {
    locator: &'a TableLocator,
}

impl<'a> GrantTranslator<'a> {
    /// A translator mapping storage paths through `locator`
    pub fn new(locator: &'a TableLocator) -> Self {
        Self { locator }
    }

    /// Translate every record of `ledger`
    pub fn translate(&self, ledger: &PermissionLedger) -> (PermissionLedger, TranslationReport) {
        let mut translated = PermissionLedger::default();
        let mut report = TranslationReport::default();

        for record in ledger.iter() {
            report.records += 1;

            let Some(service) = Resource::classify(record.resource()).service() else {
                tracing::error!("Unknown resource type for {record}");
                report.unknown_resources += 1;
                continue;
            };

            let targets: Vec<String> = match service {
                Service::Glue => vec![record.resource().to_owned()],
                Service::S3 => {
                    let tables = self
                        .locator
                        .tables_enclosing_arn(record.resource())
                        .unwrap_or_default();
                    if tables.is_empty() {
                        tracing::debug!("No table holds the data of {record}; skipping");
                        report.unmapped_storage += 1;
                        continue;
                    }
                    tables.iter().map(|table| table.table.to_string()).collect()
                }
            };

            let mut verbs: BTreeSet<GrantVerb> = BTreeSet::new();
            for action in record.actions() {
                match Action::parse(action)
                    .filter(|action| action.service() == service)
                    .and_then(|action| action.grant_verb())
                {
                    Some(verb) => {
                        verbs.insert(verb);
                    }
                    None => {
                        tracing::debug!("No grant for {action} on {}", record.resource());
                        report.untranslated_actions += 1;
                    }
                }
            }

            for target in targets {
                translated.add_actions(
                    record.principal(),
                    &target,
                    verbs.iter().map(GrantVerb::name),
                );
            }
        }

        tracing::info!(
            "Translated {} records into {} grants",
            report.records,
            translated.len()
        );
        (translated, report)
    }
}
