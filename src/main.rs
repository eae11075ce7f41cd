use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use dealtracker::cli::{Cli, Commands, ConfigCommands};
use dealtracker::config::{StaticConfig, get_config, replace_config};
use dealtracker::runtime::modes::{run_job, run_server};
use dealtracker::system::init_logging;

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    }) = &cli.command
    {
        return generate_config(output_path.as_deref(), *force);
    }

    replace_config(StaticConfig::load_from(&cli.config));
    let config = get_config();
    let _guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    let result = match cli.command {
        Some(Commands::Run { job }) => run_job(job.into()).await,
        Some(Commands::Serve) | None => run_server().await,
        Some(Commands::Config { .. }) => Ok(()),
    };

    if let Err(e) = &result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
    }
    result
}

fn generate_config(output_path: Option<&str>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or(DEFAULT_SAMPLE_PATH);
    if std::path::Path::new(path).exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", path);
    }
    std::fs::write(path, StaticConfig::generate_sample_config())
        .with_context(|| format!("Failed to write {}", path))?;
    println!("{} {}", "Sample configuration written to".green(), path);
    Ok(())
}
