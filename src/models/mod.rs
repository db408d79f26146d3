// src/models/mod.rs - Core row and record types shared across the pipeline
use serde::{Deserialize, Serialize};

/// One row per (trial, location) pair, as flattened from a registry record.
///
/// Field names carry serde renames so the struct serializes directly to the
/// center-level CSV column headers. Missing values are empty strings, never
/// nulls; rows have no identity beyond their positional index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(rename = "NCT Code", default)]
    pub nct_code: String,
    #[serde(rename = "Trial Name", default)]
    pub trial_name: String,
    #[serde(rename = "Study URL", default)]
    pub study_url: String,
    #[serde(rename = "Priority", default)]
    pub priority: String,
    #[serde(rename = "Institution", default)]
    pub institution: String,
    #[serde(rename = "Institution_clean", default)]
    pub institution_clean: String,
    #[serde(rename = "City", default)]
    pub city: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Zip", default)]
    pub zip: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "Is Local", default)]
    pub is_local: bool,
    #[serde(rename = "Contact Name", default)]
    pub contact_name: String,
    #[serde(rename = "Contact Phone", default)]
    pub contact_phone: String,
    #[serde(rename = "Contact Email", default)]
    pub contact_email: String,
    #[serde(rename = "Contact 2 Name", default)]
    pub contact_2_name: String,
    #[serde(rename = "Contact 2 Phone", default)]
    pub contact_2_phone: String,
    #[serde(rename = "Contact 2 Email", default)]
    pub contact_2_email: String,
    /// Third and later contacts, condensed as "Name | Phone | Email || ...".
    #[serde(rename = "Contact 3", default)]
    pub contact_3: String,
    #[serde(rename = "Study Contact Name", default)]
    pub study_contact_name: String,
    #[serde(rename = "Study Contact Phone", default)]
    pub study_contact_phone: String,
    #[serde(rename = "Study Contact Email", default)]
    pub study_contact_email: String,
    #[serde(rename = "Study Contact Backup Name", default)]
    pub study_contact_backup_name: String,
    #[serde(rename = "Study Contact Backup Phone", default)]
    pub study_contact_backup_phone: String,
    #[serde(rename = "Study Contact Backup Email", default)]
    pub study_contact_backup_email: String,
    /// Geo point from the registry, when present. Not persisted to CSV.
    #[serde(skip)]
    pub latitude: Option<f64>,
    #[serde(skip)]
    pub longitude: Option<f64>,
}

impl FacilityRecord {
    pub fn location_key(&self) -> LocationKey {
        LocationKey {
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
        }
    }
}

/// Grouping key for the fallback fuzzy-matching pass. Fuzzy matching across
/// different locations is disallowed by design, so this key scopes the
/// pairwise comparisons. Empty-string-safe: absent fields group together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    pub city: String,
    pub state: String,
    pub country: String,
}

/// A named contact attached to a trial or one of its sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// One site entry from a registry record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialLocation {
    pub facility: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contacts: Vec<ContactInfo>,
}

/// Structured trial record as returned by the registry client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialRecord {
    pub nct_id: String,
    pub brief_title: String,
    pub official_title: String,
    pub brief_summary: String,
    pub conditions: Vec<String>,
    pub interventions: Vec<String>,
    pub eligibility_criteria: String,
    pub phases: Vec<String>,
    pub central_contacts: Vec<ContactInfo>,
    pub locations: Vec<TrialLocation>,
}

impl TrialRecord {
    /// Official title when available, otherwise the brief title.
    pub fn display_title(&self) -> &str {
        if self.official_title.is_empty() {
            &self.brief_title
        } else {
            &self.official_title
        }
    }
}

/// Flatten a trial into one `FacilityRecord` per site.
///
/// The first two site contacts get dedicated columns; any further contacts are
/// condensed into the `Contact 3` column as "Name | Phone | Email || ...".
/// Study-level contacts repeat on every row.
pub fn flatten_trial(trial: &TrialRecord, study_url: &str, priority: &str) -> Vec<FacilityRecord> {
    let (study_contact, study_backup) = match trial.central_contacts.as_slice() {
        [] => (ContactInfo::default(), ContactInfo::default()),
        [primary] => (primary.clone(), ContactInfo::default()),
        [primary, backup, ..] => (primary.clone(), backup.clone()),
    };

    trial
        .locations
        .iter()
        .map(|loc| {
            let mut record = FacilityRecord {
                nct_code: trial.nct_id.clone(),
                trial_name: trial.display_title().to_string(),
                study_url: study_url.to_string(),
                priority: priority.to_string(),
                institution: loc.facility.clone(),
                city: loc.city.clone(),
                state: loc.state.clone(),
                zip: loc.zip.clone(),
                country: loc.country.clone(),
                latitude: loc.latitude,
                longitude: loc.longitude,
                study_contact_name: study_contact.name.clone(),
                study_contact_phone: study_contact.phone.clone(),
                study_contact_email: study_contact.email.clone(),
                study_contact_backup_name: study_backup.name.clone(),
                study_contact_backup_phone: study_backup.phone.clone(),
                study_contact_backup_email: study_backup.email.clone(),
                ..Default::default()
            };
            if let Some(first) = loc.contacts.first() {
                record.contact_name = first.name.clone();
                record.contact_phone = first.phone.clone();
                record.contact_email = first.email.clone();
            }
            if let Some(second) = loc.contacts.get(1) {
                record.contact_2_name = second.name.clone();
                record.contact_2_phone = second.phone.clone();
                record.contact_2_email = second.email.clone();
            }
            if loc.contacts.len() > 2 {
                record.contact_3 = loc.contacts[2..]
                    .iter()
                    .map(|c| format!("{} | {} | {}", c.name, c.phone, c.email))
                    .collect::<Vec<_>>()
                    .join(" || ");
            }
            record
        })
        .collect()
}

/// Priority tier for the KRAS G12D colorectal patient profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tier {
    /// G12D-only mutation requirement, CRC-only cancer scope.
    One,
    /// G12D-only, GI-focused scope (CRC + pancreas + gastric, no lung/breast).
    OnePointFive,
    /// Multi-KRAS acceptance, or G12D with broad solid-tumor scope.
    Two,
    /// CRC accepted with no mutation requirement.
    Three,
    /// Patient cannot enroll.
    Four,
}

impl Tier {
    /// Map the oracle's numeric tier onto the enum. Anything unrecognized is
    /// treated as not-enrollable.
    pub fn from_value(value: f64) -> Tier {
        if (value - 1.0).abs() < f64::EPSILON {
            Tier::One
        } else if (value - 1.5).abs() < f64::EPSILON {
            Tier::OnePointFive
        } else if (value - 2.0).abs() < f64::EPSILON {
            Tier::Two
        } else if (value - 3.0).abs() < f64::EPSILON {
            Tier::Three
        } else {
            Tier::Four
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Tier::One => 1.0,
            Tier::OnePointFive => 1.5,
            Tier::Two => 2.0,
            Tier::Three => 3.0,
            Tier::Four => 4.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::One => "G12D-only + CRC-only",
            Tier::OnePointFive => "G12D-only + GI-focused",
            Tier::Two => "Multi-KRAS or solid-tumor scope",
            Tier::Three => "CRC accepted, no mutation requirement",
            Tier::Four => "Cannot enroll",
        }
    }
}

/// Final, possibly verification-corrected, tier assignment for one trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierAssignment {
    pub nct_id: String,
    pub tier: f64,
    pub tier_label: String,
    pub tier_reason: String,
    pub mutation_requirement: String,
    pub cancer_scope: String,
    pub accepts_g12d_patient: bool,
    pub accepts_crc_patient: bool,
    pub confidence_score: f64,
    pub verification_performed: bool,
    pub verification_corrected: bool,
    pub verification_notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_value_maps_half_tier() {
        assert_eq!(Tier::from_value(1.5), Tier::OnePointFive);
        assert_eq!(Tier::from_value(3.0), Tier::Three);
        // Unknown values collapse to not-enrollable.
        assert_eq!(Tier::from_value(7.0), Tier::Four);
    }

    #[test]
    fn flatten_trial_condenses_extra_contacts() {
        let trial = TrialRecord {
            nct_id: "NCT00000001".into(),
            brief_title: "Brief".into(),
            official_title: "Official".into(),
            locations: vec![TrialLocation {
                facility: "Mayo Clinic".into(),
                city: "Rochester".into(),
                state: "Minnesota".into(),
                country: "United States".into(),
                contacts: vec![
                    ContactInfo {
                        name: "A".into(),
                        phone: "1".into(),
                        email: "a@x.org".into(),
                    },
                    ContactInfo {
                        name: "B".into(),
                        phone: "2".into(),
                        email: "b@x.org".into(),
                    },
                    ContactInfo {
                        name: "C".into(),
                        phone: "3".into(),
                        email: "c@x.org".into(),
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };

        let rows = flatten_trial(&trial, "https://clinicaltrials.gov/study/NCT00000001", "1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trial_name, "Official");
        assert_eq!(rows[0].contact_name, "A");
        assert_eq!(rows[0].contact_2_name, "B");
        assert_eq!(rows[0].contact_3, "C | 3 | c@x.org");
    }

    #[test]
    fn location_key_groups_empty_fields() {
        let a = FacilityRecord {
            institution: "Research Site".into(),
            ..Default::default()
        };
        let b = FacilityRecord {
            institution: "Other Site".into(),
            ..Default::default()
        };
        assert_eq!(a.location_key(), b.location_key());
    }
}
