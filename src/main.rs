use anyhow::{Context, Result};
use clap::Parser;
use img_recompress::cli::Args;
use img_recompress::{batch, info, logger, Config};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    logger::init(args.verbose, args.quiet)?;

    let config = Config::from_args(&args, |key| std::env::var(key).ok())
        .context("invalid configuration")?;

    info::log_system_info(config.parallelism);

    let summary = batch::run(&config)
        .with_context(|| format!("failed to process {}", config.root.display()))?;

    if config.strict && summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
