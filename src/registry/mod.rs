// src/registry/mod.rs - ClinicalTrials.gov API v2 client
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;

use crate::models::{ContactInfo, TrialLocation, TrialRecord};

const REGISTRY_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 3;
/// Linear backoff step in seconds: 1s, 2s, 3s between attempts.
const RETRY_STEP_SECS: u64 = 1;

static NCT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"NCT\d+").unwrap());

/// Pull the NCT identifier out of a study URL or free-form cell.
pub fn extract_nct_id(text: &str) -> Option<&str> {
    NCT_ID_RE.find(text).map(|m| m.as_str())
}

/// HTTP client for the registry. Cheap to clone; reuses one connection pool.
#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build registry HTTP client")?;
        Ok(Self {
            client,
            base_url: REGISTRY_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let mut client = Self::new()?;
        client.base_url = base_url;
        Ok(client)
    }

    /// Fetch one study and parse it into a `TrialRecord`.
    ///
    /// Retries transient failures up to `MAX_RETRIES` times with linear
    /// backoff. The returned record always carries the requested NCT id even
    /// when the payload omits it.
    pub async fn fetch_trial(&self, nct_id: &str) -> Result<TrialRecord> {
        let url = format!("{}/{}", self.base_url, nct_id);
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_STEP_SECS * (attempt as u64 + 1);
                warn!(
                    "Registry fetch for {} failed (attempt {}/{}), retrying in {}s",
                    nct_id, attempt, MAX_RETRIES, delay
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }

            match self.fetch_once(&url).await {
                Ok(data) => {
                    debug!("Fetched registry record for {}", nct_id);
                    return Ok(parse_trial(nct_id, &data));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Registry fetch for {} produced no error detail", nct_id)))
    }

    async fn fetch_once(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(&[("format", "json")])
            .send()
            .await
            .with_context(|| format!("Registry request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Registry returned HTTP {} for {}", status, url));
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to decode registry JSON from {}", url))
    }
}

/// Parse a raw API v2 study payload. Missing structural fields degrade to
/// empty values; missing facility/city/state/country fall back to "N/A" so
/// downstream CSV rows stay aligned with the original sheets.
fn parse_trial(nct_id: &str, data: &Value) -> TrialRecord {
    let protocol = &data["protocolSection"];
    let identification = &protocol["identificationModule"];

    let mut record = TrialRecord {
        nct_id: str_field(identification, "nctId", nct_id),
        brief_title: str_field(identification, "briefTitle", ""),
        official_title: str_field(identification, "officialTitle", ""),
        brief_summary: str_field(&protocol["descriptionModule"], "briefSummary", ""),
        conditions: str_array(&protocol["conditionsModule"]["conditions"]),
        eligibility_criteria: str_field(
            &protocol["eligibilityModule"],
            "eligibilityCriteria",
            "",
        ),
        phases: str_array(&protocol["designModule"]["phases"]),
        ..Default::default()
    };

    if let Some(interventions) = protocol["armsInterventionsModule"]["interventions"].as_array() {
        record.interventions = interventions
            .iter()
            .map(|i| str_field(i, "name", ""))
            .filter(|name| !name.is_empty())
            .collect();
    }

    let contacts_locations = &protocol["contactsLocationsModule"];
    record.central_contacts = parse_contacts(&contacts_locations["centralContacts"]);

    if let Some(locations) = contacts_locations["locations"].as_array() {
        record.locations = locations.iter().map(parse_location).collect();
    }

    record
}

fn parse_location(loc: &Value) -> TrialLocation {
    TrialLocation {
        facility: str_field(loc, "facility", "N/A"),
        city: str_field(loc, "city", "N/A"),
        state: str_field(loc, "state", "N/A"),
        zip: str_field(loc, "zip", ""),
        country: str_field(loc, "country", "N/A"),
        latitude: loc["geoPoint"]["lat"].as_f64(),
        longitude: loc["geoPoint"]["lon"].as_f64(),
        contacts: parse_contacts(&loc["contacts"]),
    }
}

fn parse_contacts(value: &Value) -> Vec<ContactInfo> {
    value
        .as_array()
        .map(|contacts| {
            contacts
                .iter()
                .map(|c| ContactInfo {
                    name: str_field(c, "name", ""),
                    phone: str_field(c, "phone", ""),
                    email: str_field(c, "email", ""),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(value: &Value, key: &str, default: &str) -> String {
    value[key]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn str_array(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
