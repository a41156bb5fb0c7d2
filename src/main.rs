use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hbk_context::Result;
use hbk_context::commands::{convert, export, extract, inspect, search, validate};
use hbk_context::config::ExportSettings;

#[derive(Parser)]
#[command(name = "hbk-context")]
#[command(about = "Convert 1C help archives into LLM-ready context bundles")]
#[command(version)]
struct Cli {
    /// Directory holding hbk-context.toml (defaults to the current directory)
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a help archive into a corpus JSON file
    Extract {
        /// Path to the .hbk archive
        archive: PathBuf,
        /// Corpus JSON output path
        #[arg(long, default_value = "data/bsl_syntax.json")]
        output: PathBuf,
        /// Process at most this many pages
        #[arg(long)]
        max_files: Option<usize>,
        /// Also write a Markdown reference next to the corpus JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Convert a corpus JSON file into context JSON, text and a search index
    Convert {
        /// Corpus JSON produced by `extract`
        input: PathBuf,
        /// Directory for the context artifacts
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
        /// Carry the extended metadata subset
        #[arg(long)]
        optimized: bool,
    },
    /// Split a context JSON document into bounded chunk files with indices
    Export {
        /// Context JSON produced by `convert`
        input: PathBuf,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Score, truncate per category and prefix the chunk files
        #[arg(long)]
        optimized: bool,
    },
    /// Search a corpus file for records matching a pattern
    Search {
        /// Corpus JSON produced by `extract`
        input: PathBuf,
        /// Case-insensitive substring matched against titles, syntax and
        /// descriptions
        pattern: String,
    },
    /// Check an export tree against the size and line ceilings
    Validate {
        /// Export tree root
        output_dir: PathBuf,
    },
    /// Show structural statistics of a help archive
    Inspect {
        /// Path to the .hbk archive
        archive: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut settings = ExportSettings::load(&cli.config_dir)
        .map_err(|e| hbk_context::HbkError::Config(format!("{e:#}")))?;

    match cli.command {
        Commands::Extract {
            archive,
            output,
            max_files,
            markdown,
        } => {
            extract(&archive, &output, max_files, markdown)?;
        }
        Commands::Convert {
            input,
            output_dir,
            optimized,
        } => {
            convert(&input, &output_dir, optimized)?;
        }
        Commands::Export {
            input,
            output_dir,
            optimized,
        } => {
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if optimized && settings.prefix.is_empty() {
                settings.prefix = "optimized".to_string();
            }
            export(&input, &settings, optimized)?;
        }
        Commands::Search { input, pattern } => {
            search(&input, &pattern)?;
        }
        Commands::Validate { output_dir } => {
            validate(&output_dir, &settings)?;
        }
        Commands::Inspect { archive } => {
            inspect(&archive)?;
        }
    }

    Ok(())
}
