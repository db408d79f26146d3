// tests/canonicalizer.rs - End-to-end canonicalization over a mixed batch
use trials_lib::matching::canonicalize::canonicalize_institutions;
use trials_lib::models::FacilityRecord;

fn row(institution: &str, city: &str, state: &str, country: &str) -> FacilityRecord {
    FacilityRecord {
        institution: institution.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        country: country.to_string(),
        ..Default::default()
    }
}

fn mixed_batch() -> Vec<FacilityRecord> {
    vec![
        // Keyword-table merges across locations.
        row("Mayo Clinic Hospital (Site 1007)", "Phoenix", "AZ", "United States"),
        row("Mayo Clinic Cancer Center", "Rochester", "MN", "United States"),
        // Dictionary display name for a whole-name exact match.
        row("START", "San Antonio", "TX", "United States"),
        row("START Midwest", "Grand Rapids", "MI", "United States"),
        // Unknown names, same location, near-duplicate spellings.
        row("Norton Cancer Institute - Downtown", "Louisville", "KY", "United States"),
        row("Norton Cancer Institute Downtown", "Louisville", "KY", "United States"),
        // Same unknown name, different city.
        row("Norton Cancer Institute - Downtown", "Lexington", "KY", "United States"),
        // Generic placeholders never fuzzy-merge.
        row("Research Site", "Louisville", "KY", "United States"),
        // Sentinel row from a location with no facility.
        row("N/A", "Madrid", "", "Spain"),
    ]
}

#[test]
fn output_is_aligned_and_order_preserving() {
    let rows = mixed_batch();
    let clean = canonicalize_institutions(&rows);
    assert_eq!(clean.len(), rows.len());
    // Row order in equals row order out.
    assert_eq!(clean[8], "N/A");
}

#[test]
fn keyword_merges_ignore_location() {
    let clean = canonicalize_institutions(&mixed_batch());
    assert_eq!(clean[0], "Mayo Clinic");
    assert_eq!(clean[1], "Mayo Clinic");
}

#[test]
fn exact_match_gets_dictionary_display_name() {
    let clean = canonicalize_institutions(&mixed_batch());
    assert_eq!(clean[2], "START (South Texas Accelerated Research Therapeutics)");
    assert_eq!(clean[3], "START (South Texas Accelerated Research Therapeutics)");
}

#[test]
fn fuzzy_fallback_merges_only_within_location() {
    let clean = canonicalize_institutions(&mixed_batch());
    // Same city: the two spellings collapse to the first row's name.
    assert_eq!(clean[4], clean[5]);
    assert_eq!(clean[4], "Norton Cancer Institute - Downtown");
    // Different city: identical raw name, but no cross-location merge and no
    // keyword, so it stays its own normalized name.
    assert_eq!(clean[6], "Norton Cancer Institute - Downtown");
}

#[test]
fn generic_placeholder_is_untouched() {
    let clean = canonicalize_institutions(&mixed_batch());
    assert_eq!(clean[7], "Research Site");
}

#[test]
fn rerunning_on_clean_output_is_stable() {
    let mut rows = mixed_batch();
    let first = canonicalize_institutions(&rows);
    for (row, name) in rows.iter_mut().zip(&first) {
        row.institution = name.clone();
    }
    assert_eq!(canonicalize_institutions(&rows), first);
}

#[test]
fn empty_batch_yields_empty_output() {
    assert!(canonicalize_institutions(&[]).is_empty());
}
