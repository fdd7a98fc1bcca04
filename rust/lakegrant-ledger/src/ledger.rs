use std::{collections::BTreeSet, fmt::Display};

use indexmap::IndexMap;

use crate::PermissionRecord;

type ResourceActions = IndexMap<String, BTreeSet<String>>;

/// A mapping of principal → resource → set of actions.
///
/// The ledger never holds a principal without resources or a resource
/// without actions: removing the last action of a resource removes the
/// resource, and removing the last resource of a principal removes the
/// principal. Iteration follows insertion order (principals first, then
/// resources within each principal).
///
/// [`PermissionLedger::len`] counts (principal, resource) pairs rather than
/// individual actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionLedger {
    principals: IndexMap<String, ResourceActions>,
    count: usize,
}

impl PermissionLedger {
    /// Grant one action. Returns true if the ledger changed.
    pub fn add(&mut self, principal: &str, resource: &str, action: &str) -> bool {
        self.add_actions(principal, resource, [action])
    }

    /// Grant every action of a record. Returns true if the ledger changed.
    pub fn add_record(&mut self, record: &PermissionRecord) -> bool {
        self.add_actions(record.principal(), record.resource(), record.actions())
    }

    /// Grant a set of actions. Returns true if the ledger changed. An empty
    /// set of actions leaves the ledger untouched.
    pub fn add_actions<A>(
        &mut self,
        principal: &str,
        resource: &str,
        actions: impl IntoIterator<Item = A>,
    ) -> bool
    where
        A: AsRef<str>,
    {
        let mut actions = actions.into_iter().peekable();
        if actions.peek().is_none() {
            return false;
        }

        let resources = self.principals.entry(principal.to_owned()).or_default();
        if !resources.contains_key(resource) {
            self.count += 1;
        }
        let granted = resources.entry(resource.to_owned()).or_default();

        let mut changed = false;
        for action in actions {
            changed |= granted.insert(action.as_ref().to_owned());
        }
        changed
    }

    /// Revoke the named actions. Unknown principals, resources or actions
    /// are ignored.
    pub fn remove<A>(
        &mut self,
        principal: &str,
        resource: &str,
        actions: impl IntoIterator<Item = A>,
    ) where
        A: AsRef<str>,
    {
        let Some(resources) = self.principals.get_mut(principal) else {
            return;
        };
        let Some(granted) = resources.get_mut(resource) else {
            return;
        };

        for action in actions {
            granted.remove(action.as_ref());
        }

        if granted.is_empty() {
            self.delete(principal, resource);
        }
    }

    /// Remove a (principal, resource) pair entirely, returning its actions
    pub fn delete(&mut self, principal: &str, resource: &str) -> Option<BTreeSet<String>> {
        let resources = self.principals.get_mut(principal)?;
        let removed = resources.shift_remove(resource)?;
        self.count -= 1;

        if resources.is_empty() {
            self.principals.shift_remove(principal);
        }

        Some(removed)
    }

    /// The actions granted to a principal on a resource
    pub fn actions(&self, principal: &str, resource: &str) -> Option<&BTreeSet<String>> {
        self.principals.get(principal)?.get(resource)
    }

    /// Every record of one principal, in insertion order. Yields nothing
    /// for an unknown principal.
    pub fn records_for<'a>(
        &'a self,
        principal: &'a str,
    ) -> impl Iterator<Item = PermissionRecord> + 'a {
        self.principals
            .get(principal)
            .into_iter()
            .flat_map(move |resources| Self::records(principal, resources))
    }

    /// Every record in the ledger, one per (principal, resource) pair
    pub fn iter(&self) -> impl Iterator<Item = PermissionRecord> + '_ {
        self.principals
            .iter()
            .flat_map(|(principal, resources)| Self::records(principal, resources))
    }

    /// The principals that hold at least one grant
    pub fn principals(&self) -> impl Iterator<Item = &str> {
        self.principals.keys().map(String::as_str)
    }

    /// The number of (principal, resource) pairs
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ledger holds no grants
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Grant every record of another ledger
    pub fn merge(&mut self, other: &PermissionLedger) {
        for (principal, resources) in &other.principals {
            for (resource, actions) in resources {
                self.add_actions(principal, resource, actions);
            }
        }
    }

    /// Revoke every record of another ledger
    pub fn subtract(&mut self, other: &PermissionLedger) {
        for (principal, resources) in &other.principals {
            for (resource, actions) in resources {
                self.remove(principal, resource, actions);
            }
        }
    }

    fn records<'a>(
        principal: &'a str,
        resources: &'a ResourceActions,
    ) -> impl Iterator<Item = PermissionRecord> + 'a {
        resources.iter().filter_map(move |(resource, actions)| {
            PermissionRecord::new(principal, resource.as_str(), actions.iter().cloned()).ok()
        })
    }
}

impl FromIterator<PermissionRecord> for PermissionLedger {
    fn from_iter<T: IntoIterator<Item = PermissionRecord>>(iter: T) -> Self {
        let mut ledger = PermissionLedger::default();
        ledger.extend(iter);
        ledger
    }
}

impl Extend<PermissionRecord> for PermissionLedger {
    fn extend<T: IntoIterator<Item = PermissionRecord>>(&mut self, iter: T) {
        for record in iter {
            self.add_record(&record);
        }
    }
}

impl Display for PermissionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for record in self.iter() {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}
