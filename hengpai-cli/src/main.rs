//! Hengpai CLI - convert vertical Chinese EPUBs to horizontal layout

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

#[derive(Parser)]
#[command(name = "hengpai")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a vertical (直排) EPUB to horizontal (橫排) layout
    Convert {
        /// Input EPUB path
        input: PathBuf,

        /// Output EPUB path (default: <input>_horizontal.epub)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the Calibre plugin and rewrite the archive directly
        #[arg(long)]
        direct: bool,

        /// Path to calibre-debug (default: search PATH)
        #[arg(long, env = "HENGPAI_CALIBRE_DEBUG")]
        calibre_debug: Option<PathBuf>,
    },

    /// Report whether an EPUB uses vertical layout
    Detect {
        /// Input EPUB path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert every EPUB in a directory
    Batch {
        /// Input directory
        input_dir: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Number of parallel jobs (must be at least 1)
        #[arg(short, long, default_value = "4", value_parser = parse_jobs)]
        jobs: usize,

        /// Skip the Calibre plugin and rewrite archives directly
        #[arg(long)]
        direct: bool,

        /// Path to calibre-debug (default: search PATH)
        #[arg(long, env = "HENGPAI_CALIBRE_DEBUG")]
        calibre_debug: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "hengpai_cli=debug,hengpai_core=debug"
    } else {
        "hengpai_cli=info,hengpai_core=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            direct,
            calibre_debug,
        } => commands::convert(&input, output.as_deref(), direct, calibre_debug),

        Commands::Detect { input, json } => commands::detect(&input, json),

        Commands::Batch {
            input_dir,
            output_dir,
            jobs,
            direct,
            calibre_debug,
        } => commands::batch(&input_dir, &output_dir, jobs, direct, calibre_debug),
    }
}
