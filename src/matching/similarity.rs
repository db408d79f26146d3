// src/matching/similarity.rs - Pairwise institution-name equivalence
use crate::matching::keywords::extract_keywords;
use crate::utils::constants::{SIMILARITY_THRESHOLD, SUBSTRING_SIMILARITY_THRESHOLD};

/// Names carrying no identifying information. Exempt from fuzzy matching:
/// two generic names are equivalent only when exactly equal.
pub const GENERIC_NAME_MARKERS: &[&str] =
    &["research site", "local institution", "site ", "location "];

/// Extended marker list used when sweeping fallback candidates; the fallback
/// pass additionally refuses to seed merges from "clinical trial site" rows.
pub const FALLBACK_GENERIC_MARKERS: &[&str] = &[
    "research site",
    "local institution",
    "site ",
    "location ",
    "clinical trial site",
];

pub fn is_generic_name(lowered: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| lowered.contains(marker))
}

/// Character-sequence similarity ratio in [0, 1]: twice the longest common
/// subsequence length over the combined length of both strings. Inputs are
/// compared as given; callers lower-case beforehand when case must not matter.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }

    // Single-row LCS dynamic program; group sizes keep n*m small.
    let mut prev = vec![0usize; b_chars.len() + 1];
    let mut curr = vec![0usize; b_chars.len() + 1];
    for &ca in &a_chars {
        for (j, &cb) in b_chars.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[b_chars.len()];

    (2.0 * lcs as f64) / total as f64
}

/// Decide whether two institution names refer to the same institution.
///
/// Exact (case-insensitive) equality always matches. Generic placeholder
/// names match only exactly. When both names carry a keyword the keywords
/// decide outright; otherwise the decision falls to the sequence ratio, with
/// a relaxed threshold when one name contains the other (truncated or
/// expanded variants depress the raw ratio).
pub fn are_institutions_similar(name1: &str, name2: &str) -> bool {
    let n1 = name1.to_lowercase().trim().to_string();
    let n2 = name2.to_lowercase().trim().to_string();

    if n1 == n2 {
        return true;
    }

    if is_generic_name(&n1, GENERIC_NAME_MARKERS) || is_generic_name(&n2, GENERIC_NAME_MARKERS) {
        return false;
    }

    let keywords1 = extract_keywords(name1);
    let keywords2 = extract_keywords(name2);
    if !keywords1.is_empty() && !keywords2.is_empty() {
        return keywords1 == keywords2;
    }

    let ratio = similarity_ratio(&n1, &n2);
    if ratio >= SIMILARITY_THRESHOLD {
        return true;
    }

    if (n1.contains(&n2) || n2.contains(&n1)) && ratio >= SUBSTRING_SIMILARITY_THRESHOLD {
        return true;
    }

    false
}
