use anyhow::Result;
use clap::Parser;
use lakegrant_cli::{Configuration, LakegrantCli, init_logging, run_migration, write_grants};

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = LakegrantCli::parse();
    let config = Configuration::from_path(&cli.config).await?;
    init_logging(cli.log_level.as_deref(), &config.logging)?;

    let summary = run_migration(&config).await?;
    let output = cli.output.as_deref().or(config.main.output.as_deref());
    write_grants(&summary.grants, output).await?;

    tracing::info!("Wrote {} grants", summary.grants.len());
    Ok(())
}
