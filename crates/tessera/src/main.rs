//! `tessera`: build a simulated chunked, replicated filesystem on disk.
//!
//! # Usage
//!
//! ```text
//! tessera generate --in-dir ./corpus --out-dir ./fs          # 2 partitions, 1 copy
//! tessera generate --in-dir ./corpus --out-dir ./fs -p 5 -c 3 -s 1
//! tessera generate --in-dir ./corpus --out-dir ./fs --seed 42 -j 8
//! tessera verify --out-dir ./fs                              # audit a layout
//! ```

mod config;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tessera_engine::{Materializer, audit_layout};
use tessera_types::LayoutConfig;
use tracing::{info, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "tessera",
    version,
    about = "Generate a partitioned, replicated filesystem fixture from text files"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk an input tree into partitions and write the manifest.
    Generate {
        /// Directory of input text files.
        #[arg(long)]
        in_dir: PathBuf,

        /// Empty directory to build the layout in.
        #[arg(long)]
        out_dir: PathBuf,

        /// Number of partitions.
        #[arg(short, long)]
        partitions: Option<u32>,

        /// Number of partitions holding each chunk.
        #[arg(short, long)]
        copies: Option<u32>,

        /// Target chunk size in MiB.
        #[arg(short = 's', long = "chunk-size")]
        chunk_size_mb: Option<u64>,

        /// Seed for reproducible placement.
        #[arg(long, env = "TESSERA_SEED")]
        seed: Option<u64>,

        /// Number of files chunked and placed at once.
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },

    /// Check a generated layout against its manifest.
    Verify {
        /// Output directory of a previous `generate` run.
        #[arg(long)]
        out_dir: PathBuf,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Generate {
            in_dir,
            out_dir,
            partitions,
            copies,
            chunk_size_mb,
            seed,
            concurrency,
        } => {
            // CLI args override config file values.
            if let Some(p) = partitions {
                config.layout.partitions = p;
            }
            if let Some(c) = copies {
                config.layout.copies = c;
            }
            if let Some(mb) = chunk_size_mb {
                config.layout.chunk_size_mb = mb;
            }
            if seed.is_some() {
                config.layout.seed = seed;
            }
            if let Some(j) = concurrency {
                config.layout.concurrency = j;
            }
            cmd_generate(config.layout_config(), &in_dir, &out_dir).await
        }
        Commands::Verify { out_dir } => cmd_verify(&out_dir).await,
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// -----------------------------------------------------------------------
// tessera generate
// -----------------------------------------------------------------------

async fn cmd_generate(layout: LayoutConfig, in_dir: &Path, out_dir: &Path) -> Result<()> {
    let start = Instant::now();
    let report = Materializer::new(layout)
        .generate(in_dir, out_dir)
        .await
        .with_context(|| {
            format!(
                "failed to generate layout from {} into {}",
                in_dir.display(),
                out_dir.display()
            )
        })?;
    let elapsed = start.elapsed();

    info!(elapsed_ms = elapsed.as_millis() as u64, "done");
    println!("Generated {}", out_dir.display());
    println!("  partitions: {}", layout.partitions);
    println!("  copies:     {}", layout.copies);
    println!("  files:      {}", report.files);
    println!("  chunks:     {}", report.chunks);
    println!("  bytes:      {}", report.bytes);
    println!("  written:    {} chunk copies", report.copies_written);
    println!("  manifest:   {}", report.manifest_path.display());
    println!("  elapsed:    {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

// -----------------------------------------------------------------------
// tessera verify
// -----------------------------------------------------------------------

async fn cmd_verify(out_dir: &Path) -> Result<()> {
    let report = audit_layout(out_dir)
        .await
        .with_context(|| format!("failed to audit {}", out_dir.display()))?;

    println!("Partitions: {}", report.partitions);
    println!("Files:      {}", report.files);
    println!("Chunks:     {}", report.chunks);

    if report.is_clean() {
        println!("Layout matches manifest.");
        return Ok(());
    }

    for violation in &report.violations {
        warn!(%violation, "layout violation");
        println!("  {violation}");
    }
    bail!(
        "{} violation(s) found in {}",
        report.violations.len(),
        out_dir.display()
    );
}
