// src/store/mod.rs - CSV persistence and categorization checkpoints
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::models::{FacilityRecord, TierAssignment};

/// One row of the contact-level sheet: the same site columns as the
/// center-level sheet, but one row per individual contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRow {
    #[serde(rename = "NCT Code")]
    pub nct_code: String,
    #[serde(rename = "Trial Name")]
    pub trial_name: String,
    #[serde(rename = "Study URL")]
    pub study_url: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Institution")]
    pub institution: String,
    #[serde(rename = "Institution_clean")]
    pub institution_clean: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Zip")]
    pub zip: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Contact Name")]
    pub contact_name: String,
    #[serde(rename = "Contact Phone")]
    pub contact_phone: String,
    #[serde(rename = "Contact Email")]
    pub contact_email: String,
    #[serde(rename = "Study Contact Name")]
    pub study_contact_name: String,
    #[serde(rename = "Study Contact Phone")]
    pub study_contact_phone: String,
    #[serde(rename = "Study Contact Email")]
    pub study_contact_email: String,
    #[serde(rename = "Study Contact Backup Name")]
    pub study_contact_backup_name: String,
    #[serde(rename = "Study Contact Backup Phone")]
    pub study_contact_backup_phone: String,
    #[serde(rename = "Study Contact Backup Email")]
    pub study_contact_backup_email: String,
}

/// One entry from the input trial sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialListEntry {
    pub study_url: String,
    pub priority: String,
}

pub fn read_facility_rows(path: &Path) -> Result<Vec<FacilityRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: FacilityRecord =
            record.with_context(|| format!("Malformed row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_facility_rows(path: &Path, rows: &[FacilityRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Saved {} center-level rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_contact_rows(path: &Path, rows: &[ContactRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Saved {} contact-level rows to {}", rows.len(), path.display());
    Ok(())
}

/// Expand center-level rows into one row per contact.
///
/// Every site keeps at least one row even with no contact at all. The
/// condensed `Contact 3` column is split back into individual contacts;
/// malformed fragments with fewer than three fields are dropped.
pub fn expand_contact_rows(rows: &[FacilityRecord]) -> Vec<ContactRow> {
    let mut expanded = Vec::new();

    for row in rows {
        let base = ContactRow {
            nct_code: row.nct_code.clone(),
            trial_name: row.trial_name.clone(),
            study_url: row.study_url.clone(),
            priority: row.priority.clone(),
            institution: row.institution.clone(),
            institution_clean: row.institution_clean.clone(),
            city: row.city.clone(),
            state: row.state.clone(),
            zip: row.zip.clone(),
            country: row.country.clone(),
            study_contact_name: row.study_contact_name.clone(),
            study_contact_phone: row.study_contact_phone.clone(),
            study_contact_email: row.study_contact_email.clone(),
            study_contact_backup_name: row.study_contact_backup_name.clone(),
            study_contact_backup_phone: row.study_contact_backup_phone.clone(),
            study_contact_backup_email: row.study_contact_backup_email.clone(),
            ..Default::default()
        };

        let mut first = base.clone();
        first.contact_name = row.contact_name.clone();
        first.contact_phone = row.contact_phone.clone();
        first.contact_email = row.contact_email.clone();
        expanded.push(first);

        if !row.contact_2_name.is_empty()
            || !row.contact_2_phone.is_empty()
            || !row.contact_2_email.is_empty()
        {
            let mut second = base.clone();
            second.contact_name = row.contact_2_name.clone();
            second.contact_phone = row.contact_2_phone.clone();
            second.contact_email = row.contact_2_email.clone();
            expanded.push(second);
        }

        if !row.contact_3.trim().is_empty() {
            for fragment in row.contact_3.split("||") {
                let parts: Vec<&str> = fragment.split('|').collect();
                if parts.len() >= 3 {
                    let mut extra = base.clone();
                    extra.contact_name = parts[0].trim().to_string();
                    extra.contact_phone = parts[1].trim().to_string();
                    extra.contact_email = parts[2].trim().to_string();
                    expanded.push(extra);
                }
            }
        }
    }

    expanded
}

/// Read the input trial sheet. Header matching is case-insensitive; the
/// "Study URL" column is required, "Priority" is optional. Rows with an empty
/// URL cell are skipped.
pub fn read_trial_list(path: &Path) -> Result<Vec<TrialListEntry>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open trial sheet {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let url_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("study url"))
        .ok_or_else(|| anyhow!("Trial sheet {} has no 'Study URL' column", path.display()))?;
    let priority_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("priority"));

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let study_url = record.get(url_idx).unwrap_or("").trim().to_string();
        if study_url.is_empty() {
            continue;
        }
        let priority = priority_idx
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
            .trim()
            .to_string();
        entries.push(TrialListEntry {
            study_url,
            priority,
        });
    }

    Ok(entries)
}

pub fn write_tier_assignments(path: &Path, assignments: &[TierAssignment]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for assignment in assignments {
        writer.serialize(assignment)?;
    }
    writer.flush()?;
    info!(
        "Saved {} tier assignments to {}",
        assignments.len(),
        path.display()
    );
    Ok(())
}

/// Resumable state for the categorization run, persisted as JSON after every
/// trial so an interrupted run loses at most one oracle call.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategorizationCheckpoint {
    pub processed_ncts: HashSet<String>,
    pub results: Vec<TierAssignment>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for CategorizationCheckpoint {
    fn default() -> Self {
        Self {
            processed_ncts: HashSet::new(),
            results: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl CategorizationCheckpoint {
    /// Load from disk; a missing file starts a fresh run.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Corrupt checkpoint {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))
    }

    pub fn record(&mut self, assignment: TierAssignment) {
        self.processed_ncts.insert(assignment.nct_id.clone());
        self.results.push(assignment);
        self.updated_at = Utc::now();
    }

    pub fn is_processed(&self, nct_id: &str) -> bool {
        self.processed_ncts.contains(nct_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn trial_list_headers_are_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        fs::write(
            &path,
            "Trial,STUDY url,PRIORITY\n\
             A,https://clinicaltrials.gov/study/NCT00000001,1\n\
             B,,2\n\
             C,https://clinicaltrials.gov/study/NCT00000002,\n",
        )
        .unwrap();

        let entries = read_trial_list(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].study_url,
            "https://clinicaltrials.gov/study/NCT00000001"
        );
        assert_eq!(entries[0].priority, "1");
        assert_eq!(entries[1].priority, "");
    }

    #[test]
    fn trial_list_requires_url_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        fs::write(&path, "Trial,Priority\nA,1\n").unwrap();
        assert!(read_trial_list(&path).is_err());
    }

    #[test]
    fn contact_expansion_unpacks_condensed_column() {
        let row = FacilityRecord {
            nct_code: "NCT00000001".into(),
            institution: "Mayo Clinic Hospital".into(),
            institution_clean: "Mayo Clinic".into(),
            contact_name: "A".into(),
            contact_phone: "1".into(),
            contact_email: "a@x.org".into(),
            contact_2_name: "B".into(),
            contact_3: "C | 3 | c@x.org || D | 4 | d@x.org || broken".into(),
            ..Default::default()
        };

        let expanded = expand_contact_rows(&[row]);
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].contact_name, "A");
        assert_eq!(expanded[1].contact_name, "B");
        assert_eq!(expanded[2].contact_name, "C");
        assert_eq!(expanded[3].contact_email, "d@x.org");
        assert!(expanded.iter().all(|r| r.institution_clean == "Mayo Clinic"));
    }

    #[test]
    fn contactless_site_keeps_one_row() {
        let row = FacilityRecord {
            nct_code: "NCT00000001".into(),
            institution: "Research Site".into(),
            ..Default::default()
        };
        let expanded = expand_contact_rows(&[row]);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].contact_name, "");
    }

    #[test]
    fn facility_rows_round_trip_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("centers.csv");
        let rows = vec![FacilityRecord {
            nct_code: "NCT00000001".into(),
            institution: "Mayo Clinic (Site 3)".into(),
            institution_clean: "Mayo Clinic".into(),
            is_local: true,
            ..Default::default()
        }];

        write_facility_rows(&path, &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("NCT Code,"));
        assert!(text.contains("Institution_clean"));

        let reread = read_facility_rows(&path).unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread[0].institution_clean, "Mayo Clinic");
        assert!(reread[0].is_local);
    }

    #[test]
    fn checkpoint_missing_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let checkpoint =
            CategorizationCheckpoint::load(&dir.path().join("absent.json")).unwrap();
        assert!(checkpoint.processed_ncts.is_empty());
        assert!(checkpoint.results.is_empty());
    }

    #[test]
    fn checkpoint_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = CategorizationCheckpoint::default();
        checkpoint.record(TierAssignment {
            nct_id: "NCT00000001".into(),
            tier: 1.5,
            tier_label: "G12D-only + GI-focused".into(),
            tier_reason: "r".into(),
            mutation_requirement: "G12D-only".into(),
            cancer_scope: "GI-focused".into(),
            accepts_g12d_patient: true,
            accepts_crc_patient: true,
            confidence_score: 0.9,
            verification_performed: false,
            verification_corrected: false,
            verification_notes: String::new(),
        });
        checkpoint.save(&path).unwrap();

        let reloaded = CategorizationCheckpoint::load(&path).unwrap();
        assert!(reloaded.is_processed("NCT00000001"));
        assert!(!reloaded.is_processed("NCT00000002"));
        assert_eq!(reloaded.results.len(), 1);
        assert_eq!(reloaded.results[0].tier, 1.5);
    }
}
