// src/bin/categorize_trials.rs - Checkpointed tier categorization run
//
// Fetches each trial's details and runs the two-pass oracle over them. The
// checkpoint is saved after every trial, so an interrupted run can resume
// without re-spending oracle calls.
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

use trials_lib::categorize::{categorize_with_verification, OpenAiOracle};
use trials_lib::categorize::prompts::format_tier;
use trials_lib::registry::{extract_nct_id, RegistryClient};
use trials_lib::store::{
    read_trial_list, write_tier_assignments, CategorizationCheckpoint,
};
use trials_lib::utils::env::load_env;

#[derive(Parser, Debug)]
#[command(
    name = "categorize_trials",
    about = "Assign priority tiers to trials with the two-pass classification oracle"
)]
struct Args {
    /// Input trial sheet CSV (needs a Study URL column)
    #[arg(long)]
    input: PathBuf,

    /// Output CSV of tier assignments
    #[arg(long, default_value = "trial_tiers.csv")]
    output: PathBuf,

    /// Checkpoint file for resumable runs
    #[arg(long, default_value = "categorization_checkpoint.json")]
    checkpoint: PathBuf,

    /// Process at most this many trials
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let args = Args::parse();
    let entries = read_trial_list(&args.input)
        .with_context(|| format!("Failed to read trial sheet {}", args.input.display()))?;

    let mut nct_ids: Vec<String> = Vec::new();
    for entry in &entries {
        match extract_nct_id(&entry.study_url) {
            Some(nct_id) => {
                if !nct_ids.iter().any(|existing| existing.as_str() == nct_id) {
                    nct_ids.push(nct_id.to_string());
                }
            }
            None => warn!("No NCT identifier in study URL '{}'", entry.study_url),
        }
    }
    if let Some(limit) = args.limit {
        nct_ids.truncate(limit);
    }

    let mut checkpoint = CategorizationCheckpoint::load(&args.checkpoint)?;
    let pending: Vec<String> = nct_ids
        .iter()
        .filter(|nct| !checkpoint.is_processed(nct))
        .cloned()
        .collect();
    info!(
        "{} trials total, {} already categorized, {} pending",
        nct_ids.len(),
        nct_ids.len() - pending.len(),
        pending.len()
    );

    let client = RegistryClient::new()?;
    let oracle = OpenAiOracle::from_env()?;
    info!("Using oracle model {}", oracle.model());

    let progress = ProgressBar::new(pending.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    for nct_id in &pending {
        progress.set_message(nct_id.clone());
        match client.fetch_trial(nct_id).await {
            Ok(trial) => match categorize_with_verification(&oracle, &trial).await {
                Ok(assignment) => {
                    info!(
                        "{} -> tier {} ({})",
                        nct_id,
                        format_tier(assignment.tier),
                        assignment.tier_label
                    );
                    checkpoint.record(assignment);
                    checkpoint.save(&args.checkpoint)?;
                }
                Err(e) => warn!("Categorization for {} failed: {:#}", nct_id, e),
            },
            Err(e) => warn!("Fetch for {} failed: {:#}", nct_id, e),
        }
        progress.inc(1);
    }
    progress.finish_with_message("Categorization complete");

    write_tier_assignments(&args.output, &checkpoint.results)?;

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for assignment in &checkpoint.results {
        *distribution.entry(format_tier(assignment.tier)).or_default() += 1;
    }
    for (tier, count) in &distribution {
        info!("Tier {}: {} trials", tier, count);
    }
    let corrected = checkpoint
        .results
        .iter()
        .filter(|a| a.verification_corrected)
        .count();
    info!(
        "Verification corrected {} of {} assignments",
        corrected,
        checkpoint.results.len()
    );
    Ok(())
}
