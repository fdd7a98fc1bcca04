use std::{fs::File, sync::Mutex};

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::LoggingSection;

const DEFAULT_LEVEL: &str = "info";

/// Pick the log filter: an explicit level wins over the configuration
/// file, which wins over `RUST_LOG`, which wins over `info`
pub fn log_filter(level: Option<&str>, logging: &LoggingSection) -> Result<EnvFilter> {
    match level.or(logging.level.as_deref()) {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("Invalid log level \"{level}\""))
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))),
    }
}

/// Install the global subscriber, writing to `logging.file` when set and
/// to standard error otherwise
pub fn init_logging(level: Option<&str>, logging: &LoggingSection) -> Result<()> {
    let filter = log_filter(level, logging)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match &logging.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Could not create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|error| anyhow!("Could not install the logger: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_prefers_the_explicit_level() {
        let logging = LoggingSection {
            level: Some("warn".into()),
            file: None,
        };

        assert_eq!(
            log_filter(Some("debug"), &logging).unwrap().to_string(),
            "debug"
        );
        assert_eq!(log_filter(None, &logging).unwrap().to_string(), "warn");
    }

    #[test]
    fn it_rejects_malformed_levels() {
        assert!(log_filter(Some("lakegrant=loud"), &LoggingSection::default()).is_err());
    }
}
