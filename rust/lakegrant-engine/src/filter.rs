//! Filters that prune a resolved ledger before translation.
//!
//! A filter never mutates the ledger it inspects. It returns the records
//! (or the subset of actions of records) it wants gone, and the
//! [`FilterPipeline`] subtracts them.

use indexmap::{IndexMap, IndexSet};
use lakegrant_catalog::{DataCatalog, TableLocator};
use lakegrant_ledger::PermissionLedger;
use lakegrant_resource::{Resource, WILDCARD};

use crate::{Action, Granularity, LakegrantEngineError};

/// The largest number of (action, resource) combinations submitted to a
/// [`PolicySimulator`] in one call
pub const SIMULATION_PAGE_LIMIT: usize = 1000;

/// One stage of the filter pipeline
pub trait LedgerFilter {
    /// A short name for logs and reports
    fn name(&self) -> &'static str;

    /// The grants of `ledger` that should be removed
    fn removals(&self, ledger: &PermissionLedger) -> PermissionLedger;
}

/// The number of records each filter removed, in pipeline order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Records removed (wholly or in part) per filter
    pub removed: IndexMap<&'static str, usize>,
}

impl FilterReport {
    /// Records removed across all filters
    pub fn total(&self) -> usize {
        self.removed.values().sum()
    }
}

/// An ordered chain of [`LedgerFilter`]s
#[derive(Default)]
pub struct FilterPipeline<'a> {
    filters: Vec<Box<dyn LedgerFilter + 'a>>,
}

impl<'a> FilterPipeline<'a> {
    /// Append a filter to the chain
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: LedgerFilter + 'a,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// The names of the filters, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Returns true if the chain has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter in order, each against the output of the last
    pub fn run(&self, mut ledger: PermissionLedger) -> (PermissionLedger, FilterReport) {
        let mut report = FilterReport::default();

        for filter in &self.filters {
            let removals = filter.removals(&ledger);
            tracing::info!(
                "Filter {} removes grants from {} records",
                filter.name(),
                removals.len()
            );
            ledger.subtract(&removals);
            report.removed.insert(filter.name(), removals.len());
        }

        (ledger, report)
    }
}

impl std::fmt::Debug for FilterPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("filters", &self.names())
            .finish()
    }
}

/// Removes every record of a principal that is not known to hold at least
/// one policy
#[derive(Debug, Clone, Default)]
pub struct PrincipalValidator {
    principals: IndexSet<String>,
}

impl PrincipalValidator {
    /// A validator accepting only the given principals
    pub fn new<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principals: principals.into_iter().map(Into::into).collect(),
        }
    }
}

impl LedgerFilter for PrincipalValidator {
    fn name(&self) -> &'static str {
        "principal_validator"
    }

    fn removals(&self, ledger: &PermissionLedger) -> PermissionLedger {
        ledger
            .iter()
            .filter(|record| !self.principals.contains(record.principal()))
            .inspect(|record| {
                tracing::debug!("{} has no policies; removing {record}", record.principal())
            })
            .collect()
    }
}

/// Keeps only the principals of an include list (when one is given) and
/// drops those of an exclude list
#[derive(Debug, Clone, Default)]
pub struct PrincipalListFilter {
    include: Option<IndexSet<String>>,
    exclude: IndexSet<String>,
}

impl PrincipalListFilter {
    /// A filter with the given lists. `None` includes every principal.
    pub fn new(include: Option<Vec<String>>, exclude: Vec<String>) -> Self {
        Self {
            include: include.map(|include| include.into_iter().collect()),
            exclude: exclude.into_iter().collect(),
        }
    }

    fn admits(&self, principal: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|include| include.contains(principal));
        included && !self.exclude.contains(principal)
    }
}

impl LedgerFilter for PrincipalListFilter {
    fn name(&self) -> &'static str {
        "principal_list"
    }

    fn removals(&self, ledger: &PermissionLedger) -> PermissionLedger {
        ledger
            .iter()
            .filter(|record| !self.admits(record.principal()))
            .collect()
    }
}

/// Removes records whose resource is malformed, names a catalog entity
/// that does not exist, or names storage that holds no registered table
#[derive(Debug, Clone, Copy)]
pub struct CatalogExistenceFilter<'a> {
    catalog: &'a DataCatalog,
    locator: &'a TableLocator,
}

impl<'a> CatalogExistenceFilter<'a> {
    /// A filter checking resources against `catalog` and `locator`
    pub fn new(catalog: &'a DataCatalog, locator: &'a TableLocator) -> Self {
        Self { catalog, locator }
    }

    fn exists(&self, resource: &str) -> bool {
        match Resource::classify(resource) {
            Resource::Catalog(catalog) => self.catalog.catalog(&catalog.account).is_some(),
            Resource::Database(database) => self
                .catalog
                .database(&database.account, &database.database)
                .is_some(),
            Resource::Table(table) => self
                .catalog
                .table(&table.account, &table.database, &table.table)
                .is_some(),
            Resource::Bucket(_) | Resource::Object(_) => {
                let prefix = resource.strip_suffix(WILDCARD).unwrap_or(resource);
                let under = self
                    .locator
                    .tables_under_arn(prefix)
                    .map(|tables| !tables.is_empty())
                    .unwrap_or_default();
                under
                    || self
                        .locator
                        .tables_enclosing_arn(prefix)
                        .map(|tables| !tables.is_empty())
                        .unwrap_or_default()
            }
            Resource::Unknown => false,
        }
    }
}

impl LedgerFilter for CatalogExistenceFilter<'_> {
    fn name(&self) -> &'static str {
        "catalog_existence"
    }

    fn removals(&self, ledger: &PermissionLedger) -> PermissionLedger {
        ledger
            .iter()
            .filter(|record| !self.exists(record.resource()))
            .inspect(|record| tracing::debug!("Not in the catalog: {record}"))
            .collect()
    }
}

/// Removes actions that are not meaningful at the granularity of the
/// resource they were granted on, and whole records whose resource cannot
/// be classified
#[derive(Debug, Clone, Copy, Default)]
pub struct GranularityFilter;

impl LedgerFilter for GranularityFilter {
    fn name(&self) -> &'static str {
        "granularity"
    }

    fn removals(&self, ledger: &PermissionLedger) -> PermissionLedger {
        let mut removals = PermissionLedger::default();

        for record in ledger.iter() {
            let Some(granularity) = Granularity::of(&Resource::classify(record.resource())) else {
                tracing::warn!("Removing record on unclassifiable resource: {record}");
                removals.add_actions(record.principal(), record.resource(), record.actions());
                continue;
            };

            let invalid = record.actions().iter().filter(|action| {
                Action::parse(action).map(|action| action.granularity()) != Some(granularity)
            });
            removals.add_actions(record.principal(), record.resource(), invalid);
        }

        removals
    }
}

/// The outcome of simulating one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// The simulated action
    pub action: String,
    /// Whether the action is allowed across the simulated resources
    pub allowed: bool,
    /// Per-resource outcomes, when the simulator reports them
    pub resource_results: Option<Vec<ResourceDecision>>,
}

/// The outcome of simulating one action on one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDecision {
    /// The simulated resource
    pub resource: String,
    /// Whether the action is allowed on it
    pub allowed: bool,
}

/// An external evaluator of a principal's effective permissions
pub trait PolicySimulator {
    /// Evaluate every action in `actions` against every resource in
    /// `resources` on behalf of `principal`
    fn simulate(
        &self,
        principal: &str,
        actions: &[String],
        resources: &[String],
    ) -> Result<Vec<SimulationResult>, LakegrantEngineError>;
}

/// Confirms catalog grants with a [`PolicySimulator`] and removes those it
/// does not allow.
///
/// Grants are submitted per principal and per catalog granularity, in pages
/// of at most [`SIMULATION_PAGE_LIMIT`] (action, resource) combinations. A
/// denied action with per-resource results removes the action from the
/// denied resources only; without per-resource results it removes the
/// action from every record of the principal. A failed simulation removes
/// nothing.
#[derive(Debug, Clone)]
pub struct SimulationFilter<S: PolicySimulator> {
    simulator: S,
}

impl<S: PolicySimulator> SimulationFilter<S> {
    /// A filter backed by `simulator`
    pub fn new(simulator: S) -> Self {
        Self { simulator }
    }

    fn simulate_group(
        &self,
        ledger: &PermissionLedger,
        principal: &str,
        resources: &[String],
        actions: &[String],
        removals: &mut PermissionLedger,
    ) {
        let page_size = (SIMULATION_PAGE_LIMIT / actions.len().max(1)).max(1);

        for page in resources.chunks(page_size) {
            let results = match self.simulator.simulate(principal, actions, page) {
                Ok(results) => results,
                Err(error) => {
                    tracing::error!("Simulation for {principal} failed: {error}");
                    continue;
                }
            };

            for result in results.into_iter().filter(|result| !result.allowed) {
                match result.resource_results {
                    Some(decisions) => {
                        for decision in decisions.into_iter().filter(|decision| !decision.allowed) {
                            let granted = ledger
                                .actions(principal, &decision.resource)
                                .is_some_and(|granted| granted.contains(&result.action));
                            if granted {
                                removals.add(principal, &decision.resource, &result.action);
                            }
                        }
                    }
                    None => {
                        for record in ledger.records_for(principal) {
                            if record.actions().contains(&result.action) {
                                removals.add(principal, record.resource(), &result.action);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl<S: PolicySimulator> LedgerFilter for SimulationFilter<S> {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn removals(&self, ledger: &PermissionLedger) -> PermissionLedger {
        let mut removals = PermissionLedger::default();

        for principal in ledger.principals() {
            let mut groups: IndexMap<Granularity, (Vec<String>, IndexSet<String>)> =
                IndexMap::new();

            for record in ledger.records_for(principal) {
                let granularity = Granularity::of(&Resource::classify(record.resource()));
                let Some(
                    granularity @ (Granularity::Catalog
                    | Granularity::Database
                    | Granularity::Table),
                ) = granularity
                else {
                    continue;
                };

                let (resources, actions) = groups.entry(granularity).or_default();
                resources.push(record.resource().to_owned());
                actions.extend(record.actions().iter().cloned());
            }

            for (granularity, (resources, actions)) in groups {
                let actions: Vec<String> = actions.into_iter().collect();
                tracing::debug!(
                    "Simulating {} {granularity:?} actions on {} resources for {principal}",
                    actions.len(),
                    resources.len()
                );
                self.simulate_group(ledger, principal, &resources, &actions, &mut removals);
            }
        }

        removals
    }
}
