//! quaycfg CLI tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "quaycfg")]
#[command(about = "Registry configuration validator", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config document against a JSON Schema
    ValidateSchema {
        /// Path to the config document
        #[arg(long, env = "QUAYCFG_CONFIG_PATH")]
        config_path: PathBuf,
        /// Path to the JSON Schema
        #[arg(long, env = "QUAYCFG_SCHEMA_PATH")]
        schema_path: PathBuf,
    },
    /// Build every field group and check its constraints
    Validate {
        /// Path to the config document
        #[arg(long, env = "QUAYCFG_CONFIG_PATH")]
        config_path: PathBuf,
    },
    /// Print the typed configuration with defaults applied
    Print {
        /// Path to the config document
        #[arg(long, env = "QUAYCFG_CONFIG_PATH")]
        config_path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let valid = match cli.command {
        Commands::ValidateSchema {
            config_path,
            schema_path,
        } => commands::validate_schema(&config_path, &schema_path)?,
        Commands::Validate { config_path } => commands::validate(&config_path)?,
        Commands::Print {
            config_path,
            format,
        } => {
            commands::print(&config_path, format)?;
            true
        }
    };

    Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
