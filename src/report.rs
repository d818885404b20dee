//! Console summaries and the JSON hand-off to external plotting.
//!
//! The engines only build result structures; everything user-facing goes
//! through here.

use crate::config::Params;
use crate::ode::{BetaSweep, TimeSeries};
use crate::ssa::ReplicateBatch;
use crate::stats::{self, Summary};
use crate::thresholds;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

/// Analytical thresholds evaluated at the base parameters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThresholdSummary {
    pub beta_crit: f64,
    pub beta_crit_per_cost: f64,
    pub beta_crit_per_loss: f64,
}

pub fn threshold_summary(params: &Params) -> ThresholdSummary {
    ThresholdSummary {
        beta_crit: thresholds::beta_crit(params),
        beta_crit_per_cost: thresholds::beta_crit_per_cost(params),
        beta_crit_per_loss: thresholds::beta_crit_per_loss(params),
    }
}

pub fn print_thresholds(summary: &ThresholdSummary) {
    println!("\nAnalytical thresholds (base parameters):");
    println!("Critical β = {:.4}", summary.beta_crit);
    println!("Critical β / c = {:.4}", summary.beta_crit_per_cost);
    println!("Critical β / δ = {:.4}", summary.beta_crit_per_loss);
}

/// Replicate-averaged trajectories of one batch, on the batch's time grid.
#[derive(Debug, Clone, Serialize)]
pub struct BatchMeans {
    pub s: f64,
    pub f: Vec<f64>,
    pub p: Vec<f64>,
}

pub fn batch_means(batches: &[ReplicateBatch]) -> Vec<BatchMeans> {
    batches
        .iter()
        .map(|batch| BatchMeans {
            s: batch.s,
            f: stats::column_means(&batch.f),
            p: stats::column_means(&batch.p),
        })
        .collect()
}

/// Final-time statistics of one replicate batch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub s: f64,
    pub final_f: Summary,
    pub final_p: Summary,
    pub extinct_fraction: f64,
}

pub fn summarize_batches(batches: &[ReplicateBatch]) -> Vec<BatchSummary> {
    batches
        .iter()
        .map(|batch| BatchSummary {
            s: batch.s,
            final_f: stats::final_column_summary(&batch.f),
            final_p: stats::final_column_summary(&batch.p),
            extinct_fraction: stats::extinct_fraction(&batch.p),
        })
        .collect()
}

pub fn print_batch_summaries(summaries: &[BatchSummary]) {
    for summary in summaries {
        println!("s = {:.2}", summary.s);
        println!(
            "Mean F (final) = {:.4} ± {:.4}",
            summary.final_f.mean, summary.final_f.std_dev
        );
        println!(
            "Mean P (final) = {:.4} ± {:.4}",
            summary.final_p.mean, summary.final_p.std_dev
        );
        println!(
            "Fraction of runs where plasmids go extinct: {:.2}\n",
            summary.extinct_fraction
        );
    }
}

/// Everything a plotting collaborator needs from a deterministic run.
#[derive(Debug, Serialize)]
pub struct OdeReport {
    pub time_series: Vec<TimeSeries>,
    pub sweep: BetaSweep,
    pub thresholds: ThresholdSummary,
}

/// Everything a plotting collaborator needs from a stochastic run.
#[derive(Debug, Serialize)]
pub struct SsaReport {
    pub batches: Vec<ReplicateBatch>,
    pub means: Vec<BatchMeans>,
    pub summaries: Vec<BatchSummary>,
}

/// Write a report as pretty-printed JSON (non-finite values become null).
pub fn write_json<T: Serialize, P: AsRef<Path>>(report: &T, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).context("failed to serialize report")?;
    Ok(())
}
