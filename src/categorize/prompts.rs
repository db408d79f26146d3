// src/categorize/prompts.rs - Prompt templates for the tier oracle
//
// Template placeholders use {snake_case} names and are substituted with
// `str::replace`, so the literal JSON braces in the response schemas need no
// escaping.
use crate::models::TrialRecord;

/// Longest slice of the brief summary forwarded to the oracle, in chars.
const BRIEF_SUMMARY_MAX_CHARS: usize = 1000;
/// Longest slice of the eligibility criteria forwarded to the oracle.
const ELIGIBILITY_MAX_CHARS: usize = 3500;

const CATEGORIZATION_TEMPLATE: &str = r#"You are analyzing a clinical trial to determine if a patient can enroll.

PATIENT PROFILE:
- Has KRAS G12D mutation (NOT G12C, NOT BRAF, NOT wild-type)
- Has colorectal adenocarcinoma (colon/rectal cancer)

TRIAL DATA:
-----------
NCT ID: {nct_id}
Title: {title}
Official Title: {official_title}
Listed Conditions: {conditions}
Interventions: {interventions}

Brief Summary:
{brief_summary}

ELIGIBILITY CRITERIA:
{eligibility_criteria}
-----------

STEP-BY-STEP ANALYSIS:

STEP 1: What MUTATION does the trial REQUIRE?
Read eligibility carefully:
- "G12D-only" = Explicitly requires KRAS G12D only
- "Multi-KRAS" = Accepts multiple KRAS variants (G12D, G12C, G12V, etc.)
- "No-mutation-required" = No mention of KRAS/RAS/BRAF requirement

STEP 2: What CANCER TYPES does the trial accept?
Check "Listed Conditions" above:
- "CRC-only" = Only colorectal/colon/rectal
- "GI-focused" = Only GI cancers (CRC + pancreas + gastric + bile duct)
- "Solid-tumors" = Broad solid tumors OR includes non-GI like NSCLC/lung/breast

STEP 3: Assign TIER using this DECISION TREE:

Is mutation required?
- YES, G12D-only:
    - CRC-only -> TIER 1
    - GI-focused -> TIER 1.5
    - Solid-tumors -> TIER 2
- YES, Multi-KRAS:
    - Any cancer -> TIER 2
- NO, no mutation required:
    - CRC accepted -> TIER 3 (Always Tier 3!)

CRITICAL RULES (CHECK THESE FIRST):
1. NO mutation requirement -> ALWAYS Tier 3 (even if Solid-tumors!)
2. Multi-KRAS -> ALWAYS Tier 2 (regardless of cancer scope)
3. Solid-tumors scope -> ALWAYS Tier 2 (IF mutation is required)
4. Cannot enroll (BRAF/G12C/wild-type only) -> ALWAYS Tier 4

TIER DEFINITIONS:
- Tier 1: G12D-only + CRC-only (RARE: trial only accepts CRC, nothing else)
- Tier 1.5: G12D-only + GI-focused (CRC + pancreas + gastric, NO lung/breast)
- Tier 2: Multi-KRAS + any cancer OR G12D + Solid-tumors
- Tier 3: CRC accepted + NO mutation requirement <- MOST COMMON!
- Tier 4: Patient cannot enroll (wrong mutation or not CRC)

COMMON MISTAKES TO AVOID:
WRONG: "No mutation + Solid-tumors = Tier 2"
RIGHT: "No mutation + ANY cancer = Tier 3"

WRONG: "Solid-tumors always = Tier 2"
RIGHT: "Solid-tumors = Tier 2 ONLY IF mutation required"

EXAMPLES:
1. Listed: ["Solid Tumor"], Mutation: G12D -> Tier 2 (mutation required + solid tumors)
2. Listed: ["Solid Tumor"], Mutation: None -> Tier 3 (NO mutation = always Tier 3)
3. Listed: ["CRC"], Mutation: None -> Tier 3 (NO mutation = Tier 3)
4. Listed: ["CRC"], Mutation: G12D -> Tier 1 (G12D + CRC-only)
5. Listed: ["CRC", "PDAC"], Mutation: G12D -> Tier 1.5 (G12D + GI-focused)
6. Listed: ["CRC", "NSCLC"], Mutation: G12D -> Tier 2 (includes lung = solid tumors)
7. Listed: ["CRC"], Mutation: Multi-KRAS -> Tier 2 (Multi-KRAS = always Tier 2)

Respond with ONLY valid JSON:
{
    "analysis": {
        "is_crc_adenocarcinoma": true/false,
        "mutation_in_eligibility": "exact text or 'none'",
        "explicit_mutation_requirement": "G12D-only/Multi-KRAS/No-mutation-required/BRAF-required/RAS-wild-type"
    },
    "classification": {
        "accepts_g12d_patient": true/false,
        "accepts_crc_patient": true/false,
        "cancer_scope": "CRC-only/GI-focused/Solid-tumors/Other",
        "tier": 1/1.5/2/3/4,
        "tier_reason": "brief explanation"
    },
    "confidence": {
        "score": 0.0-1.0,
        "mutation_clarity": "high/medium/low",
        "cancer_clarity": "high/medium/low",
        "notes": "any uncertainty"
    }
}
"#;

const VERIFICATION_TEMPLATE: &str = r#"You are verifying a clinical trial categorization.

ORIGINAL CATEGORIZATION:
NCT: {nct_id}
Tier: {tier}
Mutation: {mutation}
Cancer Scope: {cancer_scope}
Reason: {reason}

VERIFICATION CHECKLIST:
- If mutation = "No-mutation-required" -> tier MUST be 3 or 4 (never 2)
- If mutation = "Multi-KRAS" -> tier MUST be 2 (always)
- If cancer_scope = "Solid-tumors" AND mutation required -> tier should be 2
- If cancer_scope = "Solid-tumors" AND NO mutation -> tier should be 3

EDGE CASE DETECTION:
Is this categorization: "No-mutation-required + Solid-tumors = Tier 2"?
-> This is WRONG. Correct tier is 3.

Review the original categorization above. Is it correct?

Respond with JSON:
{
    "is_correct": true/false,
    "corrected_tier": X (if incorrect),
    "corrected_reason": "explanation" (if incorrect),
    "verification_notes": "what you checked"
}
"#;

/// Build the first-pass categorization prompt for a trial.
pub fn categorization_prompt(trial: &TrialRecord) -> String {
    CATEGORIZATION_TEMPLATE
        .replace("{nct_id}", &trial.nct_id)
        .replace("{title}", &trial.brief_title)
        .replace("{official_title}", &trial.official_title)
        .replace("{conditions}", &join_or(&trial.conditions, "Not specified"))
        .replace(
            "{interventions}",
            &join_or(&trial.interventions, "Not specified"),
        )
        .replace(
            "{brief_summary}",
            truncate_chars_or(&trial.brief_summary, BRIEF_SUMMARY_MAX_CHARS, "Not available"),
        )
        .replace(
            "{eligibility_criteria}",
            truncate_chars_or(
                &trial.eligibility_criteria,
                ELIGIBILITY_MAX_CHARS,
                "Not available",
            ),
        )
}

/// Build the second-pass verification prompt for a first-pass result.
pub fn verification_prompt(
    nct_id: &str,
    tier: f64,
    mutation: &str,
    cancer_scope: &str,
    reason: &str,
) -> String {
    VERIFICATION_TEMPLATE
        .replace("{nct_id}", nct_id)
        .replace("{tier}", &format_tier(tier))
        .replace("{mutation}", mutation)
        .replace("{cancer_scope}", cancer_scope)
        .replace("{reason}", reason)
}

/// Render tiers without a trailing ".0" except for the half tier.
pub fn format_tier(tier: f64) -> String {
    if tier.fract() == 0.0 {
        format!("{:.0}", tier)
    } else {
        format!("{}", tier)
    }
}

fn join_or(items: &[String], default: &str) -> String {
    if items.is_empty() {
        default.to_string()
    } else {
        items.join(", ")
    }
}

/// Slice to at most `max` chars on a char boundary; empty input gets the
/// default placeholder.
fn truncate_chars_or<'a>(text: &'a str, max: usize, default: &'a str) -> &'a str {
    if text.is_empty() {
        return default;
    }
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrialRecord;

    fn sample_trial() -> TrialRecord {
        TrialRecord {
            nct_id: "NCT06179160".into(),
            brief_title: "RMC-9805 in KRAS G12D Tumors".into(),
            official_title: "A Phase 1 Study of RMC-9805".into(),
            brief_summary: "Summary.".into(),
            conditions: vec!["Colorectal Cancer".into(), "Pancreatic Cancer".into()],
            interventions: vec!["RMC-9805".into()],
            eligibility_criteria: "KRAS G12D mutation required".into(),
            ..Default::default()
        }
    }

    #[test]
    fn categorization_prompt_substitutes_all_placeholders() {
        let prompt = categorization_prompt(&sample_trial());
        assert!(prompt.contains("NCT ID: NCT06179160"));
        assert!(prompt.contains("Listed Conditions: Colorectal Cancer, Pancreatic Cancer"));
        assert!(prompt.contains("Interventions: RMC-9805"));
        assert!(!prompt.contains("{nct_id}"));
        assert!(!prompt.contains("{eligibility_criteria}"));
    }

    #[test]
    fn categorization_prompt_defaults_empty_fields() {
        let trial = TrialRecord {
            nct_id: "NCT00000001".into(),
            ..Default::default()
        };
        let prompt = categorization_prompt(&trial);
        assert!(prompt.contains("Listed Conditions: Not specified"));
        assert!(prompt.contains("Brief Summary:\nNot available"));
    }

    #[test]
    fn long_eligibility_is_truncated() {
        let mut trial = sample_trial();
        trial.eligibility_criteria = "x".repeat(5000);
        let prompt = categorization_prompt(&trial);
        assert!(prompt.contains(&"x".repeat(ELIGIBILITY_MAX_CHARS)));
        assert!(!prompt.contains(&"x".repeat(ELIGIBILITY_MAX_CHARS + 1)));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars_or(&text, 4, "-").chars().count(), 4);
        assert_eq!(truncate_chars_or("", 4, "Not available"), "Not available");
    }

    #[test]
    fn tier_formatting_keeps_half_tier() {
        assert_eq!(format_tier(1.5), "1.5");
        assert_eq!(format_tier(3.0), "3");
        let prompt = verification_prompt("NCT1", 1.5, "G12D-only", "GI-focused", "r");
        assert!(prompt.contains("Tier: 1.5"));
        assert!(prompt.contains("Cancer Scope: GI-focused"));
    }
}
