//! ptycho: translate a directory of ptychography frames into an HDF5 file.
#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use ptycho_core::TranslatorConfig;
use ptycho_io::{read_summary, Translator};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    PtychoIo(#[from] ptycho_io::Error),

    #[error("Configuration error: {0}")]
    Core(#[from] ptycho_core::Error),
}

/// Ptychography image stack to HDF5 translator.
#[derive(Parser)]
#[command(name = "ptycho")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a directory of frames into an HDF5 file
    Translate {
        /// Directory holding one image per scan position
        input: PathBuf,

        /// Output HDF5 file (overwritten)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the groups, datasets and attributes of a translated file
    Info {
        /// Input HDF5 file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Translate {
            input,
            output,
            config,
        } => {
            let config = match config {
                Some(path) => {
                    log::info!("Loading configuration from {}", path.display());
                    TranslatorConfig::from_file(&path)?
                }
                None => TranslatorConfig::default(),
            };

            let start = Instant::now();
            let translation = Translator::new(config).translate(&output, &input)?;
            let elapsed = start.elapsed();
            let report = translation.report();

            println!(
                "Translated {} of {} files in {:.2}s",
                report.frames_used,
                report.files_found,
                elapsed.as_secs_f64()
            );
            println!("Scan grid: {}x{}", report.scan_size, report.scan_size);
            println!(
                "Frame: {}x{} {}",
                report.geometry.width, report.geometry.height, report.geometry.element_type
            );
            for path in &report.dropped {
                println!("Ignored: {}", path.display());
            }
            println!("Output: {}", translation.main().path());
        }

        Commands::Info { input } => {
            let summary = read_summary(&input)?;
            println!("File: {}", input.display());

            for group in &summary.groups {
                println!("{}", group.path);
                for (name, value) in &group.attrs {
                    println!("  @{} = {}", name, value);
                }
                for dataset in &group.datasets {
                    let chunk = dataset
                        .chunk
                        .as_ref()
                        .map_or_else(|| "contiguous".to_string(), |c| format!("chunk {:?}", c));
                    println!(
                        "  {} {:?} {} ({})",
                        dataset.path, dataset.shape, dataset.dtype, chunk
                    );
                    for (name, value) in &dataset.attrs {
                        println!("    @{} = {}", name, value);
                    }
                }
            }
        }
    }

    Ok(())
}
