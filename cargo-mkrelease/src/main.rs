use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cargo_mkrelease::builder::ReleaseBuilder;
use cargo_mkrelease::cli::{CargoCli, MkreleaseCli};

fn main() -> Result<()> {
    // Parse command line arguments - handle both cargo subcommand and direct invocation
    let cli = match CargoCli::try_parse() {
        Ok(CargoCli::Mkrelease(cli)) => cli,
        Err(_) => MkreleaseCli::parse(),
    };

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let builder = ReleaseBuilder::new(cli.into())?;
    let report = builder.run()?;

    match &report.archive_path {
        Some(path) => tracing::info!("Release archive: {}", path.display()),
        None => tracing::info!("No archive written for {}", report.archive_name),
    }

    Ok(())
}
