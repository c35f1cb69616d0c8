//! texray command-line interface.
//!
//! ```sh
//! texray run job.json -o result.json
//! texray validate job.json
//! ```

mod job;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use texray_core::AngleBinLookup;
use texray_tracer::{sweep, SweepOutput};

#[derive(Parser)]
#[command(name = "texray")]
#[command(about = "Monte Carlo ray tracing through textured multilayer stacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sweep described by a job file.
    Run {
        /// Path to the JSON job file.
        job: PathBuf,
        /// Write results here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a job file without tracing any rays.
    Validate {
        /// Path to the JSON job file.
        job: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { job, output } => {
            let spec = job::load_job(&job)?;
            let stack = spec.build_stack()?;
            log::info!("Loaded {} ({} media)", job.display(), stack.medium_count());

            let result = sweep(&stack, &spec.sweep).context("sweep failed")?;
            for wl in &result.wavelengths {
                log::info!(
                    "{:>8.1} nm  R {:.4}  T {:.4}  A {:.4}",
                    wl.wavelength,
                    wl.reflected,
                    wl.transmitted,
                    wl.absorbed
                );
            }

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_output(BufWriter::new(file), &result)?;
                    log::info!("Wrote {}", path.display());
                }
                None => write_output(io::stdout().lock(), &result)?,
            }
            Ok(())
        }
        Commands::Validate { job } => {
            let spec = job::load_job(&job)?;
            let stack = spec.build_stack()?;
            spec.sweep.validate()?;
            let grid = spec.sweep.angle_grid()?;

            println!("Job is valid: {}", job.display());
            println!(
                "  {} media, {} surfaces, {:.3} µm total depth",
                stack.medium_count(),
                stack.surfaces().len(),
                stack.total_depth()
            );
            println!(
                "  {} wavelengths, {} angles x {} positions, {} angle bins",
                spec.sweep.wavelengths.len(),
                spec.sweep.angle_count(),
                spec.sweep.lateral_count(),
                grid.len()
            );
            Ok(())
        }
    }
}

fn write_output<W: Write>(mut writer: W, result: &SweepOutput) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, result).context("failed to serialize results")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
