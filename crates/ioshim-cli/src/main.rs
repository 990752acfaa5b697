//! ioshim command-line tool.
//!
//! Drives the shim read path against local files, using the same context,
//! queue pool and configuration layering as an interposed process.
//!
//! # Quick Start
//!
//! ```bash
//! # Read 4 KiB at offset 8192 through a completion queue
//! ioshim read ./data.bin --offset 8192 --len 4096
//!
//! # Same read through the blocking path, dumping the bytes
//! ioshim read ./data.bin --offset 8192 --len 64 --blocking --hex
//!
//! # Vectored read into three 100-byte buffers
//! ioshim readv ./data.bin --sizes 100,100,100
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ioshim_config::{ConfigLoader, ShimConfig};
use tracing_subscriber::EnvFilter;

/// ioshim - POSIX reads over a completion-queue storage client.
#[derive(Parser)]
#[command(name = "ioshim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Load exactly this TOML file instead of the layered configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Read one buffer from a file.
    Read {
        /// File to read.
        path: PathBuf,

        /// Byte offset to read from.
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Buffer length in bytes.
        #[arg(short, long, default_value = "4096")]
        len: usize,

        /// Skip completion queues and use the blocking read.
        #[arg(long)]
        blocking: bool,

        /// Dump the bytes read.
        #[arg(long)]
        hex: bool,
    },

    /// Read into several buffers at one advancing offset.
    Readv {
        /// File to read.
        path: PathBuf,

        /// Buffer sizes, comma separated.
        #[arg(short, long, value_delimiter = ',', required = true)]
        sizes: Vec<usize>,

        /// Byte offset to read from.
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Skip completion queues and use the blocking read.
        #[arg(long)]
        blocking: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<ShimConfig> {
    match path {
        Some(path) => ShimConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => ConfigLoader::new().load(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // RUST_LOG wins over logging.filter; logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Read {
            path,
            offset,
            len,
            blocking,
            hex,
        } => commands::read::read(&config, &path, offset, len, blocking, hex),
        Commands::Readv {
            path,
            sizes,
            offset,
            blocking,
        } => commands::read::readv(&config, &path, &sizes, offset, blocking),
        Commands::Config => commands::config::show(&config),
    }
}
