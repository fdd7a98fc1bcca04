use std::{fmt::Display, path::Path};

use anyhow::{Context, Result};
use lakegrant_ledger::{PermissionLedger, export_ledger_to_path, import_ledger_from_path};

use crate::StageCacheSection;

/// The intermediate ledgers of a run, in the order they are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Statements resolved against the catalog
    Resolved,
    /// Resolved records that survived every filter
    Filtered,
    /// Filtered records translated into grant verbs
    Translated,
    /// Translated records after post-processing
    PostProcessed,
}

impl Stage {
    /// Every stage, in order
    pub const ALL: [Stage; 4] = [
        Stage::Resolved,
        Stage::Filtered,
        Stage::Translated,
        Stage::PostProcessed,
    ];

    /// The stage name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Resolved => "resolved",
            Stage::Filtered => "filtered",
            Stage::Translated => "translated",
            Stage::PostProcessed => "post-processed",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Reads and writes the intermediate ledgers named in the `stage_cache`
/// section
#[derive(Debug, Clone, Copy)]
pub struct StageCache<'a> {
    section: &'a StageCacheSection,
}

impl<'a> StageCache<'a> {
    /// A cache over the configured paths
    pub fn new(section: &'a StageCacheSection) -> Self {
        Self { section }
    }

    fn import_path(&self, stage: Stage) -> Option<&'a Path> {
        match stage {
            Stage::Resolved => self.section.import_resolved.as_deref(),
            Stage::Filtered => self.section.import_filtered.as_deref(),
            Stage::Translated => self.section.import_translated.as_deref(),
            Stage::PostProcessed => self.section.import_post_processed.as_deref(),
        }
    }

    fn export_path(&self, stage: Stage) -> Option<&'a Path> {
        match stage {
            Stage::Resolved => self.section.export_resolved.as_deref(),
            Stage::Filtered => self.section.export_filtered.as_deref(),
            Stage::Translated => self.section.export_translated.as_deref(),
            Stage::PostProcessed => self.section.export_post_processed.as_deref(),
        }
    }

    /// Whether `stage` is read from a file instead of computed
    pub fn is_imported(&self, stage: Stage) -> bool {
        self.import_path(stage).is_some()
    }

    /// Read `stage` if an import path is configured for it
    pub async fn load(&self, stage: Stage) -> Result<Option<PermissionLedger>> {
        let Some(path) = self.import_path(stage) else {
            return Ok(None);
        };

        tracing::info!("Importing the {stage} stage from {}", path.display());
        let ledger = import_ledger_from_path(path)
            .await
            .with_context(|| format!("Could not import the {stage} stage"))?;
        Ok(Some(ledger))
    }

    /// Write `stage` if an export path is configured for it
    pub async fn store(&self, stage: Stage, ledger: &PermissionLedger) -> Result<()> {
        if let Some(path) = self.export_path(stage) {
            export_ledger_to_path(ledger, path)
                .await
                .with_context(|| format!("Could not export the {stage} stage"))?;
        }
        Ok(())
    }
}
