use std::path::PathBuf;

use clap::Parser;

/// Command line arguments of the `lakegrant` binary
#[derive(Debug, Parser)]
#[command(name = "lakegrant")]
#[command(bin_name = "lakegrant")]
#[command(about = "Migrate catalog and object-store permissions to lake grants", long_about = None)]
pub struct LakegrantCli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Log level, overriding the configuration file and `RUST_LOG`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Where to write the resulting grants, overriding `main.output`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
