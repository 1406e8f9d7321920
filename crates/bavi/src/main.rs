//! The `bavi` binary.
//!
//! ```bash
//! bavi -c bavi.toml
//! ```
//!
//! Without `-c`, `bavi.toml` is searched for in the current directory and
//! the user config directory. `BAVI_*` environment variables override the
//! file, e.g. `BAVI_IRC__NICKNAME=otherbot`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use bavi::runtime::BaviRuntime;

#[derive(Debug, Parser)]
#[command(name = "bavi", version, about = "General-purpose IRC chat bot")]
struct Cli {
    /// Configuration file to load instead of searching for bavi.toml.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = BaviRuntime::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build().context("Failed to load configuration")?;
    runtime.init_logging()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting bavi");
    let linked: Vec<_> = bavi::plugins::all().iter().map(|p| p.name).collect();
    debug!(?linked, "Linked plugins");

    runtime.run().await?;
    Ok(())
}
