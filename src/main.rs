// src/main.rs - Site extraction pipeline
//
// Reads a trial sheet, fetches each study from the registry, flattens the
// sites into center-level rows, canonicalizes the institution column, and
// writes the center- and contact-level CSVs.
use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use trials_lib::matching::canonicalize::assign_clean_names;
use trials_lib::models::{flatten_trial, FacilityRecord};
use trials_lib::registry::{extract_nct_id, RegistryClient};
use trials_lib::store::{
    expand_contact_rows, read_trial_list, write_contact_rows, write_facility_rows,
};
use trials_lib::utils::env::load_env;
use trials_lib::utils::get_memory_usage;
use trials_lib::utils::proximity::is_local_site;

#[derive(Parser, Debug)]
#[command(
    name = "pipeline",
    about = "Fetch trial sites, canonicalize institutions, and write center- and contact-level sheets"
)]
struct Args {
    /// Input trial sheet CSV (needs a Study URL column, Priority is optional)
    #[arg(long)]
    input: PathBuf,

    /// Center-level output CSV
    #[arg(long, default_value = "trials_center_level.csv")]
    center_output: PathBuf,

    /// Contact-level output CSV
    #[arg(long, default_value = "trials_contact_level.csv")]
    contact_output: PathBuf,

    /// Process at most this many trials
    #[arg(long)]
    limit: Option<usize>,

    /// Concurrent registry fetches
    #[arg(long, default_value_t = 5)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let args = Args::parse();
    let run_id = Uuid::new_v4();
    let start_time = Instant::now();
    info!("Starting site extraction pipeline (run ID: {})", run_id);

    let mut entries = read_trial_list(&args.input)
        .with_context(|| format!("Failed to read trial sheet {}", args.input.display()))?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    info!("Loaded {} trial entries from {}", entries.len(), args.input.display());

    let client = RegistryClient::new()?;
    let progress = ProgressBar::new(entries.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    progress.set_message("Fetching trials...");

    // Ordered buffering keeps row order deterministic for canonicalization.
    let fetches = futures::stream::iter(entries.into_iter().map(|entry| {
        let client = client.clone();
        let progress = progress.clone();
        async move {
            let result = match extract_nct_id(&entry.study_url) {
                Some(nct_id) => client
                    .fetch_trial(nct_id)
                    .await
                    .map(|trial| (trial, entry.study_url.clone(), entry.priority.clone())),
                None => Err(anyhow::anyhow!(
                    "No NCT identifier in study URL '{}'",
                    entry.study_url
                )),
            };
            progress.inc(1);
            result
        }
    }))
    .buffered(args.concurrency)
    .collect::<Vec<_>>()
    .await;
    progress.finish_with_message("Fetch complete");

    let mut rows: Vec<FacilityRecord> = Vec::new();
    let mut fetched = 0usize;
    for result in fetches {
        match result {
            Ok((trial, study_url, priority)) => {
                fetched += 1;
                rows.extend(flatten_trial(&trial, &study_url, &priority));
            }
            Err(e) => warn!("Skipping trial: {:#}", e),
        }
    }
    info!("Fetched {} trials into {} site rows", fetched, rows.len());

    for row in rows.iter_mut() {
        row.is_local = is_local_site(&row.country, &row.state, row.latitude, row.longitude);
    }
    let local_count = rows.iter().filter(|r| r.is_local).count();
    info!("Flagged {} local site rows", local_count);

    let raw_unique = unique_count(rows.iter().map(|r| r.institution.as_str()));
    assign_clean_names(&mut rows);
    let clean_unique = unique_count(rows.iter().map(|r| r.institution_clean.as_str()));
    info!(
        "Institution normalization: {} unique raw names -> {} unique clean names ({} merged)",
        raw_unique,
        clean_unique,
        raw_unique.saturating_sub(clean_unique)
    );

    write_facility_rows(&args.center_output, &rows)?;
    let contact_rows = expand_contact_rows(&rows);
    write_contact_rows(&args.contact_output, &contact_rows)?;

    info!(
        "Pipeline run {} finished in {:.2?} (memory: {} MB)",
        run_id,
        start_time.elapsed(),
        get_memory_usage()
    );
    Ok(())
}

fn unique_count<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.collect::<std::collections::HashSet<_>>().len()
}
