// src/categorize/oracle.rs - Two-pass tier classification oracle
//
// Pass 1 categorizes a trial against the patient profile. Pass 2 re-checks
// the result with a focused verification prompt, but only when the first
// pass looks like a known failure mode or reports low confidence. A failed
// verification call never discards the first-pass answer.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::categorize::prompts;
use crate::models::{Tier, TierAssignment, TrialRecord};
use crate::utils::env::{required_var, var_or};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_RETRIES: u32 = 3;
/// Linear backoff step between completion attempts: 2s, 4s.
const RETRY_STEP_SECS: u64 = 2;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const TEMPERATURE: f64 = 0.1;
const MAX_COMPLETION_TOKENS: u32 = 1000;
/// First-pass results below this confidence always get a second pass.
const VERIFICATION_CONFIDENCE_FLOOR: f64 = 0.8;

const SYSTEM_PROMPT: &str =
    "You are an expert clinical trial analyst. Always respond with valid JSON only, no markdown.";

/// First-pass categorization payload. All fields are defaulted so a partial
/// model response still parses; a missing tier degrades to not-enrollable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategorizationResult {
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub is_crc_adenocarcinoma: bool,
    #[serde(default)]
    pub mutation_in_eligibility: String,
    #[serde(default)]
    pub explicit_mutation_requirement: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub accepts_g12d_patient: bool,
    #[serde(default)]
    pub accepts_crc_patient: bool,
    #[serde(default)]
    pub cancer_scope: String,
    #[serde(default = "default_tier")]
    pub tier: f64,
    #[serde(default)]
    pub tier_reason: String,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            accepts_g12d_patient: false,
            accepts_crc_patient: false,
            cancer_scope: String::new(),
            tier: default_tier(),
            tier_reason: String::new(),
        }
    }
}

fn default_tier() -> f64 {
    Tier::Four.as_f64()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Confidence {
    #[serde(default = "default_confidence")]
    pub score: f64,
    #[serde(default)]
    pub mutation_clarity: String,
    #[serde(default)]
    pub cancer_clarity: String,
    #[serde(default)]
    pub notes: String,
}

impl Default for Confidence {
    fn default() -> Self {
        Self {
            score: default_confidence(),
            mutation_clarity: String::new(),
            cancer_clarity: String::new(),
            notes: String::new(),
        }
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// Second-pass verification payload. A silent model defaults to agreeing
/// with the first pass.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResult {
    #[serde(default = "default_true")]
    pub is_correct: bool,
    #[serde(default)]
    pub corrected_tier: Option<f64>,
    #[serde(default)]
    pub corrected_reason: String,
    #[serde(default)]
    pub verification_notes: String,
}

fn default_true() -> bool {
    true
}

#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    async fn categorize(&self, trial: &TrialRecord) -> Result<CategorizationResult>;
    async fn verify(
        &self,
        nct_id: &str,
        result: &CategorizationResult,
    ) -> Result<VerificationResult>;
}

/// Oracle backed by the OpenAI chat completions API.
pub struct OpenAiOracle {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiOracle {
    /// Build from `OPENAI_API_KEY` and optional `OPENAI_MODEL` env vars.
    pub fn from_env() -> Result<Self> {
        let api_key = required_var("OPENAI_API_KEY")?;
        let model = var_or("OPENAI_MODEL", DEFAULT_MODEL);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build oracle HTTP client")?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one JSON-mode completion with retries and return the raw content.
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": TEMPERATURE,
            "max_tokens": MAX_COMPLETION_TOKENS,
        });

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_STEP_SECS * attempt as u64;
                warn!(
                    "Oracle completion failed (attempt {}/{}), retrying in {}s",
                    attempt, MAX_RETRIES, delay
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }

            match self.complete_once(&url, &body).await {
                Ok(content) => return Ok(content),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Oracle completion produced no error detail")))
    }

    async fn complete_once(&self, url: &str, body: &serde_json::Value) -> Result<String> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .context("Oracle request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Oracle returned HTTP {}: {}", status, detail));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to decode oracle completion")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Oracle completion had no choices"))
    }
}

#[async_trait]
impl ClassificationOracle for OpenAiOracle {
    async fn categorize(&self, trial: &TrialRecord) -> Result<CategorizationResult> {
        let prompt = prompts::categorization_prompt(trial);
        let content = self.complete_json(&prompt).await?;
        debug!("Categorization response for {}: {}", trial.nct_id, content);
        serde_json::from_str(&content)
            .with_context(|| format!("Unparseable categorization for {}", trial.nct_id))
    }

    async fn verify(
        &self,
        nct_id: &str,
        result: &CategorizationResult,
    ) -> Result<VerificationResult> {
        let prompt = prompts::verification_prompt(
            nct_id,
            result.classification.tier,
            &result.analysis.explicit_mutation_requirement,
            &result.classification.cancer_scope,
            &result.classification.tier_reason,
        );
        let content = self.complete_json(&prompt).await?;
        serde_json::from_str(&content)
            .with_context(|| format!("Unparseable verification for {}", nct_id))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Decide whether a first-pass result needs the verification pass.
///
/// Flags the known failure modes: no-mutation trials landing in tier 2,
/// multi-KRAS trials landing anywhere but tier 2, and anything the model
/// itself was unsure about.
pub fn detect_edge_case(result: &CategorizationResult) -> bool {
    let tier = result.classification.tier;
    let mutation = &result.analysis.explicit_mutation_requirement;

    if mutation.contains("No-mutation") && tier == 2.0 {
        return true;
    }
    if mutation.contains("Multi-KRAS") && tier != 2.0 {
        return true;
    }
    result.confidence.score < VERIFICATION_CONFIDENCE_FLOOR
}

/// Categorize one trial end to end and fold the result into a
/// `TierAssignment`.
pub async fn categorize_with_verification(
    oracle: &dyn ClassificationOracle,
    trial: &TrialRecord,
) -> Result<TierAssignment> {
    let result = oracle.categorize(trial).await?;

    let mut tier = result.classification.tier;
    let mut reason = result.classification.tier_reason.clone();
    let mut performed = false;
    let mut corrected = false;
    let mut notes = String::new();

    if detect_edge_case(&result) {
        match oracle.verify(&trial.nct_id, &result).await {
            Ok(verification) => {
                performed = true;
                notes = verification.verification_notes;
                if !verification.is_correct {
                    if let Some(new_tier) = verification.corrected_tier {
                        debug!(
                            "Verification corrected {} from tier {} to {}",
                            trial.nct_id, tier, new_tier
                        );
                        tier = new_tier;
                        reason = verification.corrected_reason;
                        corrected = true;
                    }
                }
            }
            Err(e) => {
                // Trust the first pass when verification itself fails.
                warn!("Verification for {} failed: {:#}", trial.nct_id, e);
            }
        }
    }

    Ok(TierAssignment {
        nct_id: trial.nct_id.clone(),
        tier,
        tier_label: Tier::from_value(tier).label().to_string(),
        tier_reason: reason,
        mutation_requirement: result.analysis.explicit_mutation_requirement,
        cancer_scope: result.classification.cancer_scope,
        accepts_g12d_patient: result.classification.accepts_g12d_patient,
        accepts_crc_patient: result.classification.accepts_crc_patient,
        confidence_score: result.confidence.score,
        verification_performed: performed,
        verification_corrected: corrected,
        verification_notes: notes,
    })
}
