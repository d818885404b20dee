mod config;
mod model;
mod ode;
mod report;
mod solver;
mod ssa;
mod stats;
mod thresholds;

use crate::config::Params;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the JSON parameter file.
    #[arg(long, default_value = "parameters/params.json")]
    params: PathBuf,

    /// Time horizon of each simulation run.
    #[arg(long, default_value_t = 500.0)]
    tmax: f64,

    /// Write the full results to this JSON file.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the deterministic mean-field model and its sweeps.
    Ode,

    /// Run stochastic replicates with the Gillespie algorithm.
    Ssa {
        /// Number of independent replicates per s value.
        #[arg(long, default_value_t = 50)]
        runs: usize,

        /// Base seed for reproducible replicate streams.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = Cli::parse();
    log::info!("{args:#?}");

    let params = Params::from_file(&args.params).context("failed to load parameters")?;
    log::info!("{params:#?}");

    match args.command {
        Command::Ode => run_ode(&params, args.tmax, args.out.as_deref()),
        Command::Ssa { runs, seed } => run_ssa(&params, args.tmax, runs, seed, args.out.as_deref()),
    }
}

fn run_ode(params: &Params, tmax: f64, out: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let time_series = ode::run_time_series(params, tmax).context("failed to run time series")?;
    let sweep = ode::run_beta_sweep(params, tmax);
    log::info!("completed ODE runs in {:.2} s", start.elapsed().as_secs_f64());

    for entry in &time_series {
        let (f, p) = entry.trajectory.final_state();
        let total: Vec<f64> = entry
            .trajectory
            .f
            .iter()
            .zip(&entry.trajectory.p)
            .map(|(f, p)| f + p)
            .collect();
        log::info!(
            "s = {}: final F = {f:.4}, P = {p:.4}, tail drift = {:.1e}",
            entry.s,
            stats::relative_plateau(&total, 0.1)
        );
    }

    let thresholds = report::threshold_summary(params);
    report::print_thresholds(&thresholds);

    if let Some(out) = out {
        let results = report::OdeReport {
            time_series,
            sweep,
            thresholds,
        };
        report::write_json(&results, out).context("failed to write results")?;
        log::info!("results written to {out:?}");
    }

    Ok(())
}

fn run_ssa(
    params: &Params,
    tmax: f64,
    runs: usize,
    seed: Option<u64>,
    out: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let batches = ssa::run_multiple_ssa(params, tmax, runs, seed)
        .context("failed to run stochastic replicates")?;
    log::info!("completed SSA runs in {:.2} s", start.elapsed().as_secs_f64());

    let summaries = report::summarize_batches(&batches);
    report::print_batch_summaries(&summaries);

    if let Some(out) = out {
        let means = report::batch_means(&batches);
        let results = report::SsaReport {
            batches,
            means,
            summaries,
        };
        report::write_json(&results, out).context("failed to write results")?;
        log::info!("results written to {out:?}");
    }

    Ok(())
}
