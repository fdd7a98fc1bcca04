use std::path::Path;

use anyhow::{Context, Result};
use lakegrant_catalog::{DataCatalog, TableLocator, data_locations};
use lakegrant_engine::{
    CatalogExistenceFilter, DataAccessFromCatalogGrants, FilterPipeline, GranularityFilter,
    IngestReport, MigrationPipeline, PrincipalListFilter, PrincipalValidator, ResolutionReport,
    StatementResolver, ingest_catalog_events, ingest_storage_events,
};
use lakegrant_ledger::{PermissionLedger, export_ledger, export_ledger_to_path};
use lakegrant_resource::bucket_arn;

use crate::{Configuration, Inputs, Stage, StageCache, load_catalog};

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationSummary {
    /// The final grants
    pub grants: PermissionLedger,
    /// The storage locations to register, when requested
    pub data_locations: Option<Vec<String>>,
}

/// Load the catalog and inputs named by `config` and run every stage
pub async fn run_migration(config: &Configuration) -> Result<MigrationSummary> {
    let catalog = load_catalog(&config.inputs.catalog).await?;
    let locator = TableLocator::new(&catalog);
    tracing::info!(
        "Loaded {} databases and {} tables",
        catalog.databases().count(),
        catalog.tables().count()
    );

    let data_locations = if config.data_locations.enabled {
        let locations = data_locations(&catalog);
        match &config.data_locations.output {
            Some(path) => write_data_locations(&locations, path).await?,
            None => {
                for location in &locations {
                    tracing::info!("Data location to register: {location}");
                }
            }
        }
        Some(locations)
    } else {
        None
    };

    let inputs = Inputs::load(&config.inputs).await?;
    let grants = Migration::new(config, &catalog, &locator, &inputs)
        .grants()
        .await?;

    if !config.main.dry_run {
        tracing::warn!(
            "Grants are never committed by a run; commit the written grants with an external tool"
        );
    }

    Ok(MigrationSummary {
        grants,
        data_locations,
    })
}

/// Write grants to `output`, or to standard output when there is none
pub async fn write_grants(grants: &PermissionLedger, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => export_ledger_to_path(grants, path)
            .await
            .with_context(|| format!("Could not write grants to {}", path.display())),
        None => export_ledger(grants, tokio::io::stdout())
            .await
            .context("Could not write grants"),
    }
}

/// Write storage locations to `path`, one per line
pub async fn write_data_locations(locations: &[String], path: &Path) -> Result<()> {
    let contents: String = locations
        .iter()
        .map(|location| format!("{location}\n"))
        .collect();
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Could not write data locations to {}", path.display()))?;

    tracing::info!("Wrote {} data locations to {}", locations.len(), path.display());
    Ok(())
}

/// One run over a loaded catalog. Each stage is read from the stage cache
/// when configured, computed from the previous stage otherwise, and then
/// written to the stage cache when configured.
struct Migration<'a> {
    config: &'a Configuration,
    catalog: &'a DataCatalog,
    locator: &'a TableLocator,
    inputs: &'a Inputs,
    cache: StageCache<'a>,
}

impl<'a> Migration<'a> {
    fn new(
        config: &'a Configuration,
        catalog: &'a DataCatalog,
        locator: &'a TableLocator,
        inputs: &'a Inputs,
    ) -> Self {
        Self {
            config,
            catalog,
            locator,
            inputs,
            cache: StageCache::new(&config.stage_cache),
        }
    }

    async fn grants(&self) -> Result<PermissionLedger> {
        let pipeline = self.pipeline();
        tracing::debug!("Running {pipeline:?}");
        self.post_processed(&pipeline).await
    }

    fn pipeline(&self) -> MigrationPipeline<'a> {
        let pipeline = MigrationPipeline::new(self.locator).with_filters(self.filters());

        if self
            .config
            .post_processing
            .data_access_from_catalog_grants
            .enabled
        {
            pipeline.with_post_processor(DataAccessFromCatalogGrants)
        } else {
            pipeline
        }
    }

    fn filters(&self) -> FilterPipeline<'a> {
        let section = &self.config.filters;
        let mut filters = FilterPipeline::default();

        if section.principal_validator.enabled {
            match self.inputs.principals_with_policies() {
                Some(principals) => filters = filters.with(PrincipalValidator::new(principals)),
                None => tracing::warn!(
                    "No identity policies to validate principals against; \
                     skipping the principal validator"
                ),
            }
        }
        if section.principal_list.enabled {
            filters = filters.with(PrincipalListFilter::new(
                section.principal_list.include.clone(),
                section.principal_list.exclude.clone(),
            ));
        }
        if section.catalog_existence.enabled {
            filters = filters.with(CatalogExistenceFilter::new(self.catalog, self.locator));
        }
        if section.granularity.enabled {
            filters = filters.with(GranularityFilter);
        }

        filters
    }

    async fn resolved(&self) -> Result<PermissionLedger> {
        let resolved = match self.cache.load(Stage::Resolved).await? {
            Some(resolved) => resolved,
            None => self.resolve(),
        };
        self.cache.store(Stage::Resolved, &resolved).await?;
        Ok(resolved)
    }

    async fn filtered(&self, pipeline: &MigrationPipeline<'_>) -> Result<PermissionLedger> {
        let filtered = match self.cache.load(Stage::Filtered).await? {
            Some(filtered) => filtered,
            None => {
                let resolved = self.resolved().await?;
                tracing::info!("Filtering {} resolved records", resolved.len());
                let (filtered, report) = pipeline.filter(resolved);
                for (filter, removed) in &report.removed {
                    tracing::info!("Filter {filter} removed {removed} records");
                }
                filtered
            }
        };
        self.cache.store(Stage::Filtered, &filtered).await?;
        Ok(filtered)
    }

    async fn translated(&self, pipeline: &MigrationPipeline<'_>) -> Result<PermissionLedger> {
        let translated = match self.cache.load(Stage::Translated).await? {
            Some(translated) => translated,
            None => {
                let filtered = self.filtered(pipeline).await?;
                tracing::info!("Translating {} filtered records", filtered.len());
                let (translated, report) = pipeline.translate(&filtered);
                tracing::info!(
                    "Translated {} records; {} actions had no verb, \
                     {} storage records had no table",
                    report.records,
                    report.untranslated_actions,
                    report.unmapped_storage
                );
                translated
            }
        };
        self.cache.store(Stage::Translated, &translated).await?;
        Ok(translated)
    }

    async fn post_processed(&self, pipeline: &MigrationPipeline<'_>) -> Result<PermissionLedger> {
        let post_processed = match self.cache.load(Stage::PostProcessed).await? {
            Some(post_processed) => post_processed,
            None => pipeline.post_process(self.translated(pipeline).await?),
        };
        self.cache.store(Stage::PostProcessed, &post_processed).await?;
        Ok(post_processed)
    }

    /// Read every enabled source into its own ledger, then merge them. A
    /// deny in one source never retracts an allow of another.
    fn resolve(&self) -> PermissionLedger {
        let readers = &self.config.readers;
        let resolver = StatementResolver::new(self.catalog, self.locator)
            .with_known_principals(self.inputs.known_principals());
        let mut resolved = PermissionLedger::default();

        if let (true, Some(policies)) = (
            readers.identity_policies.enabled,
            &self.inputs.identity_policies,
        ) {
            let mut ledger = PermissionLedger::default();
            let mut report = ResolutionReport::default();
            for (principal, documents) in policies {
                report += resolver.resolve_identity_policies(principal, documents, &mut ledger);
            }
            log_resolution("identity policies", &report, &ledger);
            resolved.merge(&ledger);
        }

        if let (true, Some(policies)) = (
            readers.bucket_policies.enabled,
            &self.inputs.bucket_policies,
        ) {
            let mut ledger = PermissionLedger::default();
            let mut report = ResolutionReport::default();
            for (bucket, document) in policies {
                report +=
                    resolver.resolve_resource_policy(&bucket_arn(bucket), document, &mut ledger);
            }
            log_resolution("bucket policies", &report, &ledger);
            resolved.merge(&ledger);
        }

        if let (true, Some(events)) =
            (readers.storage_events.enabled, &self.inputs.storage_events)
        {
            let mut ledger = PermissionLedger::default();
            let report = ingest_storage_events(events, self.locator, &mut ledger);
            log_ingest("storage events", &report, &ledger);
            resolved.merge(&ledger);
        }

        if let (true, Some(events)) =
            (readers.catalog_events.enabled, &self.inputs.catalog_events)
        {
            let mut ledger = PermissionLedger::default();
            let report = ingest_catalog_events(events, &mut ledger);
            log_ingest("catalog events", &report, &ledger);
            resolved.merge(&ledger);
        }

        resolved
    }
}

fn log_resolution(source: &str, report: &ResolutionReport, ledger: &PermissionLedger) {
    tracing::info!(
        "Resolved {} statements of {source} into {} records",
        report.statements,
        ledger.len()
    );
    if report.invalid_statements + report.skipped_resources + report.unmatched_actions > 0 {
        tracing::warn!(
            "Skipped {} invalid statements, {} resources and {} action patterns of {source}",
            report.invalid_statements,
            report.skipped_resources,
            report.unmatched_actions
        );
    }
}

fn log_ingest(source: &str, report: &IngestReport, ledger: &PermissionLedger) {
    tracing::info!(
        "Ingested {} of {} {source} into {} records",
        report.ingested,
        report.events,
        ledger.len()
    );
}
