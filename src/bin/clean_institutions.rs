// src/bin/clean_institutions.rs - Re-run canonicalization over an existing sheet
//
// Useful after keyword table or dictionary updates: reads a center-level CSV,
// recomputes the Institution_clean column in place, and reports how many
// names changed.
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use trials_lib::matching::canonicalize::canonicalize_institutions;
use trials_lib::store::{read_facility_rows, write_facility_rows};
use trials_lib::utils::env::load_env;

#[derive(Parser, Debug)]
#[command(
    name = "clean_institutions",
    about = "Recompute the Institution_clean column of a center-level sheet"
)]
struct Args {
    /// Center-level CSV to clean
    #[arg(long)]
    input: PathBuf,

    /// Output CSV; defaults to overwriting the input
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let args = Args::parse();
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());

    let mut rows = read_facility_rows(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    info!("Loaded {} center-level rows", rows.len());

    let clean = canonicalize_institutions(&rows);
    let mut changed = 0usize;
    for (row, name) in rows.iter_mut().zip(clean) {
        if row.institution_clean != name {
            changed += 1;
        }
        row.institution_clean = name;
    }

    write_facility_rows(&output, &rows)?;
    info!(
        "Rewrote {} rows to {} ({} clean names changed)",
        rows.len(),
        output.display(),
        changed
    );
    Ok(())
}
