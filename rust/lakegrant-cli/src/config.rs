//! The JSON configuration file.
//!
//! Every section except `inputs` may be left out. Unknown keys are
//! rejected.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The whole configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Run mode and output
    #[serde(default)]
    pub main: MainSection,
    /// Input documents
    pub inputs: InputSection,
    /// Which statement sources to read
    #[serde(default)]
    pub readers: ReaderSection,
    /// Which filters to run
    #[serde(default)]
    pub filters: FilterSection,
    /// Which post-processors to run
    #[serde(default)]
    pub post_processing: PostProcessingSection,
    /// Whether to compute the storage locations to register, and where to
    /// write them
    #[serde(default)]
    pub data_locations: DataLocationSection,
    /// Import and export of intermediate ledgers
    #[serde(default)]
    pub stage_cache: StageCacheSection,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Configuration {
    /// Read a configuration file
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Could not read configuration {}", path.display()))?;
        contents
            .parse()
            .with_context(|| format!("Invalid configuration {}", path.display()))
    }
}

impl FromStr for Configuration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

/// An on/off switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Toggle {
    /// Whether the feature runs
    pub enabled: bool,
}

impl Toggle {
    /// A switch that is on
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    /// A switch that is off
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::enabled()
    }
}

/// Run mode and output.
///
/// Grants are only ever written, never committed to the lake's permission
/// store. Committing them is left to an external tool that reads the
/// output; a run with `dry_run` off logs a warning to say so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MainSection {
    /// Whether the run is a dry run. Off only changes what is logged.
    pub dry_run: bool,
    /// Where to write the grants; standard output when absent
    pub output: Option<PathBuf>,
}

impl Default for MainSection {
    fn default() -> Self {
        Self {
            dry_run: true,
            output: None,
        }
    }
}

/// The storage locations to register with the lake
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DataLocationSection {
    /// Whether to compute the locations; off by default
    pub enabled: bool,
    /// Where to write them, one per line; they are only logged when absent
    pub output: Option<PathBuf>,
}

/// Paths of the JSON input documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    /// The catalog enumeration
    pub catalog: PathBuf,
    /// Identity policies keyed by principal
    #[serde(default)]
    pub identity_policies: Option<PathBuf>,
    /// Bucket policies keyed by bucket name
    #[serde(default)]
    pub bucket_policies: Option<PathBuf>,
    /// Object-store audit events
    #[serde(default)]
    pub storage_events: Option<PathBuf>,
    /// Catalog audit events
    #[serde(default)]
    pub catalog_events: Option<PathBuf>,
}

/// Statement sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReaderSection {
    /// Resolve identity policies
    pub identity_policies: Toggle,
    /// Resolve bucket policies
    pub bucket_policies: Toggle,
    /// Ingest object-store audit events
    pub storage_events: Toggle,
    /// Ingest catalog audit events
    pub catalog_events: Toggle,
}

/// Filters, run in the order they are listed here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FilterSection {
    /// Drop principals that hold no policy
    pub principal_validator: Toggle,
    /// Include and exclude principals by name
    pub principal_list: PrincipalListSection,
    /// Drop resources missing from the catalog
    pub catalog_existence: Toggle,
    /// Drop actions at the wrong granularity
    pub granularity: Toggle,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            principal_validator: Toggle::enabled(),
            principal_list: PrincipalListSection::default(),
            catalog_existence: Toggle::enabled(),
            granularity: Toggle::enabled(),
        }
    }
}

/// The principal include and exclude lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PrincipalListSection {
    /// Whether the filter runs
    pub enabled: bool,
    /// Keep only these principals
    pub include: Option<Vec<String>>,
    /// Drop these principals
    pub exclude: Vec<String>,
}

/// Post-processors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PostProcessingSection {
    /// Add data access verbs to tables whose metadata may be managed
    pub data_access_from_catalog_grants: Toggle,
}

impl Default for PostProcessingSection {
    fn default() -> Self {
        Self {
            data_access_from_catalog_grants: Toggle::disabled(),
        }
    }
}

/// Intermediate ledger files. An imported stage is not computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StageCacheSection {
    /// Read the resolved ledger from here
    pub import_resolved: Option<PathBuf>,
    /// Write the resolved ledger here
    pub export_resolved: Option<PathBuf>,
    /// Read the filtered ledger from here
    pub import_filtered: Option<PathBuf>,
    /// Write the filtered ledger here
    pub export_filtered: Option<PathBuf>,
    /// Read the translated ledger from here
    pub import_translated: Option<PathBuf>,
    /// Write the translated ledger here
    pub export_translated: Option<PathBuf>,
    /// Read the post-processed ledger from here
    pub import_post_processed: Option<PathBuf>,
    /// Write the post-processed ledger here
    pub export_post_processed: Option<PathBuf>,
}

/// Log output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSection {
    /// Log level or filter directives, e.g. `debug` or `lakegrant_engine=trace`
    pub level: Option<String>,
    /// Write logs to this file instead of standard error
    pub file: Option<PathBuf>,
}
