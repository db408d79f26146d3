// src/matching/canonicalize.rs - Two-pass institution canonicalization
//
// Pass 1 is global: keyword-matched rows canonicalize to their curated display
// name regardless of location, so one health system in three cities collapses
// to one identity. Pass 2 is location-scoped: rows the keyword table does not
// know are fuzzy-matched only against peers sharing the same (city, state,
// country) key, which keeps unrelated placeholder sites in different cities
// from merging.
use log::info;
use std::collections::HashMap;

use crate::matching::keywords::{canonical_name_for, extract_keywords};
use crate::matching::normalize::normalize_institution_name;
use crate::matching::similarity::{
    are_institutions_similar, is_generic_name, FALLBACK_GENERIC_MARKERS,
};
use crate::models::{FacilityRecord, LocationKey};

/// Canonicalize the institution column of a row batch.
///
/// Returns one clean name per input row, aligned 1:1 and in input order.
/// Deterministic for a fixed input ordering; the fallback union propagation is
/// order-sensitive, so reordering rows can change results at the margin.
pub fn canonicalize_institutions(rows: &[FacilityRecord]) -> Vec<String> {
    let normalized: Vec<String> = rows
        .iter()
        .map(|row| normalize_institution_name(&row.institution))
        .collect();

    let (mut canonical_by_index, candidates) = global_keyword_pass(&normalized);
    let keyword_matches = canonical_by_index.len();

    location_fallback_pass(rows, &normalized, &candidates, &mut canonical_by_index);

    info!(
        "Canonicalized {} rows: {} via keyword table, {} via location fallback, {} self-canonical",
        rows.len(),
        keyword_matches,
        canonical_by_index.len() - keyword_matches,
        rows.len() - canonical_by_index.len()
    );

    normalized
        .iter()
        .enumerate()
        .map(|(idx, norm)| {
            canonical_by_index
                .get(&idx)
                .cloned()
                .unwrap_or_else(|| norm.clone())
        })
        .collect()
}

/// Convenience wrapper: canonicalize and write the result back onto the rows.
pub fn assign_clean_names(rows: &mut [FacilityRecord]) {
    let clean = canonicalize_institutions(rows);
    for (row, name) in rows.iter_mut().zip(clean) {
        row.institution_clean = name;
    }
}

/// First pass. Rows whose normalized name yields a keyword are resolved
/// immediately: the curated display name when the dictionary has one, the
/// normalized name itself otherwise. Rows with no keyword are returned as
/// fallback candidates.
fn global_keyword_pass(normalized: &[String]) -> (HashMap<usize, String>, Vec<usize>) {
    let mut canonical_by_index = HashMap::new();
    let mut candidates = Vec::new();

    for (idx, norm) in normalized.iter().enumerate() {
        let keywords = extract_keywords(norm);
        match keywords.into_iter().next() {
            Some(keyword) => {
                let canonical = canonical_name_for(keyword)
                    .map(str::to_string)
                    .unwrap_or_else(|| norm.clone());
                canonical_by_index.insert(idx, canonical);
            }
            None => candidates.push(idx),
        }
    }

    (canonical_by_index, candidates)
}

/// Second pass, over fallback candidates only, scoped by location key.
///
/// Within each multi-row location group, candidate pairs are compared in row
/// order. On a match the earlier row's already-assigned canonical value (if
/// any) propagates to the later row; otherwise the earlier row's normalized
/// name is assigned to both. This is greedy propagation over the running map,
/// not transitive-closure union-find: under some pair orderings a three-way
/// equivalence class ends up split. Deliberately preserved behavior - see the
/// greedy_fallback_is_not_transitive test.
fn location_fallback_pass(
    rows: &[FacilityRecord],
    normalized: &[String],
    candidates: &[usize],
    canonical_by_index: &mut HashMap<usize, String>,
) {
    let mut groups: HashMap<LocationKey, Vec<usize>> = HashMap::new();
    for &idx in candidates {
        groups.entry(rows[idx].location_key()).or_default().push(idx);
    }

    for indices in groups.values() {
        if indices.len() <= 1 {
            continue;
        }

        for (pos, &i) in indices.iter().enumerate() {
            let norm_i = &normalized[i];
            if is_generic_name(&norm_i.to_lowercase(), FALLBACK_GENERIC_MARKERS) {
                continue;
            }

            for &j in &indices[pos + 1..] {
                let norm_j = &normalized[j];
                if !are_institutions_similar(norm_i, norm_j) {
                    continue;
                }
                match canonical_by_index.get(&i).cloned() {
                    Some(assigned) => {
                        canonical_by_index.insert(j, assigned);
                    }
                    None => {
                        canonical_by_index.insert(i, norm_i.clone());
                        canonical_by_index.insert(j, norm_i.clone());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(institution: &str, city: &str, state: &str, country: &str) -> FacilityRecord {
        FacilityRecord {
            institution: institution.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            country: country.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn keyword_rows_merge_across_locations() {
        let rows = vec![
            row("Mayo Clinic Hospital", "Phoenix", "AZ", "USA"),
            row("Mayo Clinic Cancer Center", "Rochester", "MN", "USA"),
            row("Mayo Clinic (Site 1007)", "Jacksonville", "FL", "USA"),
        ];
        let clean = canonicalize_institutions(&rows);
        assert_eq!(clean, vec!["Mayo Clinic"; 3]);
    }

    #[test]
    fn distinct_systems_stay_separate() {
        let rows = vec![
            row("MD Anderson Cancer Center", "Houston", "TX", "USA"),
            row(
                "University of Texas MD Anderson Cancer Center",
                "Houston",
                "TX",
                "USA",
            ),
            row("Banner MD Anderson Cancer Center", "Gilbert", "AZ", "USA"),
        ];
        let clean = canonicalize_institutions(&rows);
        assert_eq!(
            clean,
            vec![
                "MD Anderson Cancer Center",
                "MD Anderson Cancer Center",
                "Banner MD Anderson Cancer Center",
            ]
        );
    }

    #[test]
    fn fallback_is_location_scoped() {
        // Highly similar unknown names in different cities never merge.
        let rows = vec![
            row("Lakeview Regional Medical Center", "Springfield", "IL", "USA"),
            row("Lakeview Regional Medical Centre", "Dayton", "OH", "USA"),
        ];
        let clean = canonicalize_institutions(&rows);
        assert_eq!(clean[0], "Lakeview Regional Medical Center");
        assert_eq!(clean[1], "Lakeview Regional Medical Centre");
    }

    #[test]
    fn fallback_merges_within_location() {
        let rows = vec![
            row("Lakeview Regional Medical Center", "Springfield", "IL", "USA"),
            row("Lakeview Regional Medical Centre", "Springfield", "IL", "USA"),
        ];
        let clean = canonicalize_institutions(&rows);
        assert_eq!(clean[0], clean[1]);
        assert_eq!(clean[0], "Lakeview Regional Medical Center");
    }

    #[test]
    fn generic_placeholders_stay_isolated() {
        let rows = vec![
            row("Research Site", "Boston", "MA", "USA"),
            row("Research Site", "Boston", "MA", "USA"),
            row("Research Site A", "Boston", "MA", "USA"),
        ];
        let clean = canonicalize_institutions(&rows);
        // Identical placeholders share a clean name trivially; the suffixed
        // variant is never fuzzy-merged into them.
        assert_eq!(clean[0], "Research Site");
        assert_eq!(clean[1], "Research Site");
        assert_eq!(clean[2], "Research Site A");
    }

    #[test]
    fn greedy_fallback_is_not_transitive() {
        // Pair (0,1) is dissimilar, (0,2) and (1,2) are similar. The pass
        // first assigns row 0's name to rows 0 and 2, then the later (1,2)
        // match overwrites row 2 with row 1's name, splitting the class.
        // Pins the accepted greedy-propagation limitation.
        let rows = vec![
            row("Parkside Cancer Institute", "Palm Springs", "CA", "USA"),
            row(
                "Parkside Cancer Institute of the Desert and Valley",
                "Palm Springs",
                "CA",
                "USA",
            ),
            row(
                "Parkside Cancer Institute of the Desert",
                "Palm Springs",
                "CA",
                "USA",
            ),
        ];
        let clean = canonicalize_institutions(&rows);
        assert_eq!(clean[0], "Parkside Cancer Institute");
        assert_eq!(clean[1], "Parkside Cancer Institute of the Desert and Valley");
        assert_eq!(clean[2], "Parkside Cancer Institute of the Desert and Valley");
    }

    #[test]
    fn deterministic_for_fixed_order() {
        let rows = vec![
            row("Mayo Clinic Hospital", "Phoenix", "AZ", "USA"),
            row("Cedar Grove Oncology Associates", "Tulsa", "OK", "USA"),
            row("Cedar Grove Oncology Assoc", "Tulsa", "OK", "USA"),
            row("Research Site", "Tulsa", "OK", "USA"),
        ];
        assert_eq!(
            canonicalize_institutions(&rows),
            canonicalize_institutions(&rows)
        );
    }

    #[test]
    fn idempotent_on_own_output() {
        let mut rows = vec![
            row("Mayo Clinic (Site 1007)", "Phoenix", "AZ", "USA"),
            row("START San Antonio", "San Antonio", "TX", "USA"),
            row("Cedar Grove Oncology Associates", "Tulsa", "OK", "USA"),
            row("Cedar Grove Oncology Assoc", "Tulsa", "OK", "USA"),
        ];
        let first = canonicalize_institutions(&rows);
        for (r, name) in rows.iter_mut().zip(&first) {
            r.institution = name.clone();
        }
        let second = canonicalize_institutions(&rows);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_and_sentinel_rows_are_harmless() {
        let rows = vec![
            row("", "Boston", "MA", "USA"),
            row("", "Boston", "MA", "USA"),
            row("N/A", "Boston", "MA", "USA"),
        ];
        let clean = canonicalize_institutions(&rows);
        assert_eq!(clean[0], "");
        assert_eq!(clean[1], "");
        assert_eq!(clean[2], "N/A");
    }

    #[test]
    fn assign_clean_names_writes_back() {
        let mut rows = vec![row("Moffitt Cancer Center", "Tampa", "FL", "USA")];
        assign_clean_names(&mut rows);
        assert_eq!(rows[0].institution_clean, "Moffitt Cancer Center");
    }
}
