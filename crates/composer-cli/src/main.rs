//! `composer` -- inspect, randomize and repack scene bundles from the shell.
//!
//! A bundle path ending in `.tar` is read and written as a tar archive; any
//! other path is treated as a directory tree.
//!
//! ```text
//! composer inspect scene.tar
//! composer randomize scene/ --episodes 20 --seed 7 --out scene-20.tar
//! composer repack scene.tar scene/
//! ```
//!
//! Logging follows `RUST_LOG`; `--verbose` raises the default to `debug`.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use composer_engine::prelude::ComposerConfig;

#[derive(Parser, Debug)]
#[command(name = "composer")]
#[command(about = "Scene bundle composer: randomized placement and round-trip export")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the objects, instruction and conditions of a bundle
    Inspect {
        bundle: PathBuf,
    },

    /// Import a bundle, accept N randomized conditions and export the result
    Randomize {
        bundle: PathBuf,

        /// Number of conditions to accept
        #[arg(short, long, default_value_t = 1)]
        episodes: usize,

        /// Output bundle
        #[arg(short, long)]
        out: PathBuf,

        /// RNG seed, overriding the configuration
        #[arg(short, long)]
        seed: Option<u64>,

        /// Spawn volume as min_x,min_y,min_z,max_x,max_y,max_z (Z up)
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        volume: Option<Vec<f64>>,
    },

    /// Copy a bundle between the directory and tar layouts
    Repack {
        input: PathBuf,
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => commands::load_config(path)
            .await
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ComposerConfig::default(),
    };

    match args.command {
        Command::Inspect { bundle } => {
            let report = commands::inspect(&bundle, config).await?;
            print!("{report}");
        }
        Command::Randomize {
            bundle,
            episodes,
            out,
            seed,
            volume,
        } => {
            let mut config = config;
            if seed.is_some() {
                config.placement.seed = seed;
            }
            let volume = volume.as_deref().map(commands::parse_volume).transpose()?;
            let summary = commands::randomize(&bundle, &out, episodes, volume, config).await?;
            println!(
                "wrote {} conditions for {} objects to {}",
                summary.conditions,
                summary.objects,
                out.display()
            );
            if summary.unresolved > 0 {
                println!(
                    "{} placements could not be made collision-free",
                    summary.unresolved
                );
            }
        }
        Command::Repack { input, output } => {
            let count = commands::repack(&input, &output).await?;
            println!("copied {count} files to {}", output.display());
        }
    }

    Ok(())
}
