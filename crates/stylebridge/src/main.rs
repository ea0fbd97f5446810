//! stylebridge CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stylebridge_core::Dialect;
use stylebridge_runtime::Encoding;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "stylebridge")]
#[command(version)]
#[command(about = "Compile Sass and LESS stylesheets against a mounted virtual file tree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the named stylesheets ('-x' compresses every file after it)
    Compile {
        /// Directory mounted at the source root
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,

        /// Directory mounted at the target root
        #[arg(long, default_value = ".")]
        target_dir: PathBuf,

        /// TOML configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Source encoding (utf-8, iso-8859-1)
        #[arg(long)]
        encoding: Option<Encoding>,

        /// Print source lines around parse errors
        #[arg(long)]
        show_extracts: bool,

        /// Input names relative to the source root, and '-x'
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// Compile every stale source selected by the configured patterns
    Build {
        /// TOML configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Directory mounted at the source root
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,

        /// Directory mounted at the target root
        #[arg(long, default_value = ".")]
        target_dir: PathBuf,

        /// Only build this dialect (sass, less)
        #[arg(long)]
        dialect: Option<Dialect>,

        /// Recompile even when outputs are newer than their sources
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stylebridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let status = match cli.command {
        Commands::Compile {
            source_dir,
            target_dir,
            config,
            encoding,
            show_extracts,
            tokens,
        } => commands::compile::execute(commands::compile::CompileArgs {
            source_dir,
            target_dir,
            config,
            encoding,
            show_extracts,
            tokens,
        })?,
        Commands::Build {
            config,
            source_dir,
            target_dir,
            dialect,
            force,
        } => commands::build::execute(commands::build::BuildArgs {
            config,
            source_dir,
            target_dir,
            dialect,
            force,
        })?,
    };

    if status != 0 {
        std::process::exit(status);
    }
    Ok(())
}
