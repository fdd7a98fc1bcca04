use lakegrant_catalog::TableLocator;
use lakegrant_ledger::PermissionLedger;

use crate::{FilterPipeline, FilterReport, GrantTranslator, PostProcessor, TranslationReport};

/// Every intermediate ledger of one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationOutcome {
    /// The resolved ledger after filtering
    pub filtered: PermissionLedger,
    /// What the filters removed
    pub filter_report: FilterReport,
    /// The filtered ledger translated into grant verbs
    pub translated: PermissionLedger,
    /// What the translation dropped
    pub translation_report: TranslationReport,
    /// The translated ledger after every post-processor
    pub post_processed: PermissionLedger,
}

/// Chains the stages that turn a resolved ledger into grants: the filter
/// pipeline, the translator, then each post-processor in order.
///
/// Every stage is also exposed on its own so a caller can resume a run from
/// a stored intermediate ledger.
pub struct MigrationPipeline<'a> {
    filters: FilterPipeline<'a>,
    translator: GrantTranslator<'a>,
    post_processors: Vec<Box<dyn PostProcessor + 'a>>,
}

impl<'a> MigrationPipeline<'a> {
    /// A pipeline with no filters and no post-processors
    pub fn new(locator: &'a TableLocator) -> Self {
        Self {
            filters: FilterPipeline::default(),
            translator: GrantTranslator::new(locator),
            post_processors: Vec::new(),
        }
    }

    /// Replace the filter stage
    pub fn with_filters(mut self, filters: FilterPipeline<'a>) -> Self {
        self.filters = filters;
        self
    }

    /// Append a post-processor
    pub fn with_post_processor<P>(mut self, post_processor: P) -> Self
    where
        P: PostProcessor + 'a,
    {
        self.post_processors.push(Box::new(post_processor));
        self
    }

    /// Run the filter stage
    pub fn filter(&self, resolved: PermissionLedger) -> (PermissionLedger, FilterReport) {
        self.filters.run(resolved)
    }

    /// Run the translation stage
    pub fn translate(&self, filtered: &PermissionLedger) -> (PermissionLedger, TranslationReport) {
        self.translator.translate(filtered)
    }

    /// Run every post-processor in order
    pub fn post_process(&self, translated: PermissionLedger) -> PermissionLedger {
        self.post_processors
            .iter()
            .fold(translated, |ledger, post_processor| {
                tracing::debug!("Running post-processor {}", post_processor.name());
                post_processor.process(ledger)
            })
    }

    /// Run every stage over a resolved ledger
    pub fn run(&self, resolved: PermissionLedger) -> MigrationOutcome {
        tracing::info!("Filtering {} resolved records", resolved.len());
        let (filtered, filter_report) = self.filter(resolved);

        tracing::info!("Translating {} filtered records", filtered.len());
        let (translated, translation_report) = self.translate(&filtered);

        let post_processed = self.post_process(translated.clone());

        MigrationOutcome {
            filtered,
            filter_report,
            translated,
            translation_report,
            post_processed,
        }
    }
}

impl std::fmt::Debug for MigrationPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationPipeline")
            .field("filters", &self.filters)
            .field(
                "post_processors",
                &self
                    .post_processors
                    .iter()
                    .map(|post_processor| post_processor.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
