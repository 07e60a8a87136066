mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::{info, LevelFilter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.debug() {
        logger.filter_module("launch_jenkins", LevelFilter::Debug);
    }
    logger.init();

    if !cli.quiet() {
        launch_jenkins::output::print_banner();
    }

    info!("Starting launch-jenkins");
    let success = cli.execute().await?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
