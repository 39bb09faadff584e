//! tdsim CLI: simulate lensed light curves, inspect and export records.
//!
//! Commands:
//! - `simulate`: run a TOML simulation config and write its records
//! - `inspect`: summarize a full light-curve record
//! - `export`: write the sampled curve of a full record as CSV

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tdsim_core::{FieldValue, LightCurve};
use tdsim_io::{read_evil, run_system, write_samples_csv, write_system, SimulationConfig};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "tdsim",
    about = "tdsim: stochastic quasar light curves for time-delay studies"
)]
struct Cli {
    /// More logging (DEBUG).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Less logging (WARN).
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a lensed system from a TOML config file.
    Simulate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Overrides `[output] dir` from the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Replace existing output files.
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Print parameters, array sizes and flags of a full record.
    Inspect {
        /// Path to a full (evil) Parquet record.
        path: PathBuf,
    },
    /// Export the sampled curve of a full record as CSV.
    Export {
        /// Path to a full (evil) Parquet record.
        path: PathBuf,

        /// Output CSV path.
        #[arg(long)]
        csv: PathBuf,

        /// Replace an existing CSV file.
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Simulate {
            config,
            output_dir,
            overwrite,
        } => run_simulate(&config, output_dir, overwrite),
        Commands::Inspect { path } => run_inspect(&path),
        Commands::Export {
            path,
            csv,
            overwrite,
        } => run_export(&path, &csv, overwrite),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_simulate(config_path: &Path, output_dir: Option<PathBuf>, overwrite: bool) -> Result<()> {
    let mut config = SimulationConfig::from_file(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if overwrite {
        config.output.overwrite = true;
    }

    let system = run_system(&config).context("simulation failed")?;
    let written = write_system(&system, &config.output).context("failed to write records")?;

    println!("Simulated {} image(s):", system.images.len());
    for image in &system.images {
        println!(
            "  {:<4} delay {:>9.3} d  {:>6} samples",
            image.label,
            image.curve.tdelay(),
            image.curve.time_samp().len()
        );
    }
    println!("Config hash: {}", system.config_hash);
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let curve = read_evil(path).with_context(|| format!("failed to read {}", path.display()))?;
    print_summary(path, &curve);
    Ok(())
}

fn run_export(path: &Path, csv: &Path, overwrite: bool) -> Result<()> {
    if path == csv {
        bail!("refusing to export over the input record");
    }
    let curve = read_evil(path).with_context(|| format!("failed to read {}", path.display()))?;
    write_samples_csv(csv, &curve, overwrite)
        .with_context(|| format!("failed to write {}", csv.display()))?;
    println!(
        "Exported {} samples to {}",
        curve.time_samp().len(),
        csv.display()
    );
    Ok(())
}

fn print_summary(path: &Path, curve: &LightCurve) {
    let flag = |b: bool| if b { "yes" } else { "no" };

    println!();
    println!("=== Light Curve Record ===");
    println!("File:           {}", path.display());
    println!("Seed:           {}", curve.seed());
    println!("Noise seed:     {}", curve.seed_n());
    println!();
    println!("--- Process ---");
    println!("Mean mag:       {:.4}", curve.meanmag());
    println!("Initial mag:    {:.4}", curve.mag0());
    println!("Tau:            {:.3} d", curve.tau());
    println!("Sigma:          {:.3e} mag d^-1/2", curve.sigma());
    println!("Noise amp:      {:.2}%", curve.amp_n() * 100.0);
    println!("Delay:          {:.3} d", curve.tdelay());
    println!();
    println!("--- Sampling ---");
    println!("Daily:          {}", flag(curve.daily()));
    println!("Weekly:         {}", flag(curve.weekly()));
    println!("Season:         {}", flag(curve.season()));
    println!(
        "User indices:   {}",
        curve.usrind().iter().filter(|&&m| m != 0).count()
    );
    println!();
    println!("--- Arrays ---");
    for (name, value) in curve.fields() {
        if matches!(value, FieldValue::Floats(_) | FieldValue::Ints(_)) {
            println!("{:<16}{}", format!("{name}:"), value.len());
        }
    }
}
