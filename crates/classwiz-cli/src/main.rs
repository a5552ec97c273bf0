//! classwiz command line tool
//!
//! Inspects and checks object templates against the default type registry.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use classwiz::{ClasswizConfig, Converter, Registry};

mod commands;

#[derive(Parser)]
#[command(name = "classwiz")]
#[command(about = "Build, check and script objects from templates", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the code that rebuilds a template's object
    Script {
        /// Template file
        template: PathBuf,
    },

    /// Decode a template and build its object
    Check {
        /// Template file
        template: PathBuf,
    },

    /// List registered types
    Types,

    /// Print the concrete types accepted for a type
    Resolve {
        /// Qualified type name, e.g. `time.Duration`
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ClasswizConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClasswizConfig::default(),
    };
    let converter = Converter::new(Registry::global(), config);

    match cli.command {
        Commands::Script { template } => commands::script::execute(&converter, &template),
        Commands::Check { template } => commands::check::execute(&converter, &template),
        Commands::Types => commands::types::execute(converter.registry()),
        Commands::Resolve { name } => commands::resolve::execute(converter.registry(), &name),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

