use lakegrant_ledger::PermissionLedger;
use lakegrant_resource::Resource;

use crate::GrantVerb;

/// A rewrite applied to the translated ledger
pub trait PostProcessor {
    /// A short name for logs
    fn name(&self) -> &'static str;

    /// Rewrite the translated ledger
    fn process(&self, ledger: PermissionLedger) -> PermissionLedger;
}

/// Grants data access to principals that may manage a table's metadata:
/// `SELECT` where `DESCRIBE` is granted, `INSERT` and `DELETE` where
/// `ALTER` is granted. Only table grants are touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataAccessFromCatalogGrants;

impl PostProcessor for DataAccessFromCatalogGrants {
    fn name(&self) -> &'static str {
        "data_access_from_catalog_grants"
    }

    fn process(&self, mut ledger: PermissionLedger) -> PermissionLedger {
        let additions: Vec<_> = ledger
            .iter()
            .filter(|record| matches!(Resource::classify(record.resource()), Resource::Table(_)))
            .map(|record| {
                let mut verbs = Vec::new();
                if record.actions().contains(GrantVerb::Describe.name()) {
                    verbs.push(GrantVerb::Select);
                }
                if record.actions().contains(GrantVerb::Alter.name()) {
                    verbs.extend([GrantVerb::Insert, GrantVerb::Delete]);
                }
                (record, verbs)
            })
            .collect();

        let mut added = 0usize;
        for (record, verbs) in additions {
            if ledger.add_actions(
                record.principal(),
                record.resource(),
                verbs.iter().map(GrantVerb::name),
            ) {
                added += 1;
            }
        }

        tracing::info!("Added data access to {added} table grants");
        ledger
    }
}
