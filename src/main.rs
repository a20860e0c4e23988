//! Strata CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Symbol boundaries, reference layering and batch planning for C code bases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Source root that symbol file paths are relative to
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to ./strata.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store path, overriding the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load symbol and reference rows from JSON-lines files
    Import {
        /// One symbol object per line
        symbols: PathBuf,

        /// One reference object per line
        #[arg(long)]
        references: Option<PathBuf>,

        /// Keep existing rows instead of replacing them
        #[arg(long)]
        append: bool,
    },
    /// Derive nominal end lines and prune duplicate records
    Bounds,
    /// Resolve spans and kinds against the source tree
    Resolve,
    /// Layer and cluster the in-scope symbols, then export the batches
    Plan {
        /// Write the batch list here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured chunk size
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Drop references into the N most referenced symbols
        #[arg(long, value_name = "N")]
        exclude_top: Option<usize>,
    },
    /// Print a symbol's source, placement and references, or list names matching a LIKE pattern
    Show {
        /// Symbol id, name, file:line, or a pattern containing `%`
        symbol: String,
    },
    /// Print store statistics
    Stats,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("strata={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("Strata v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let ctx = commands::Context::load(cli.root, cli.config, cli.db)?;

    match cli.command {
        Commands::Import { symbols, references, append } => {
            commands::import(&ctx, &symbols, references.as_deref(), append)
        }
        Commands::Bounds => commands::bounds(&ctx),
        Commands::Resolve => commands::resolve(&ctx),
        Commands::Plan { output, chunk_size, exclude_top } => {
            commands::plan(&ctx, output.as_deref(), chunk_size, exclude_top)
        }
        Commands::Show { symbol } => commands::show(&ctx, &symbol),
        Commands::Stats => commands::stats(&ctx),
        Commands::Version => Ok(()),
    }
}
