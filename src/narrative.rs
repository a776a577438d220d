//! Narrative enrichment for credibility reports.
//!
//! A language model turns a finished report into a short analyst summary.
//! The enrichment step is best effort:
//! 1. Reuse a cached narrative for the GSTIN if one is intact
//! 2. Otherwise make exactly one generation attempt through the circuit breaker
//! 3. Any failure (transport, status, malformed body, empty text, open breaker)
//!    yields `FALLBACK_EXPLANATION`; nothing propagates to the caller

use crate::circuit_breaker::{create_llm_circuit_breaker, LlmCircuitBreaker};
use crate::config::Config;
use crate::constants::FALLBACK_EXPLANATION;
use crate::errors::AppError;
use crate::models::CredibilityReport;
use crate::narrative_cache::NarrativeCache;
use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Builds the analyst prompt for a report.
pub fn build_prompt(report: &CredibilityReport) -> String {
    format!(
        "Act as a senior credit risk analyst for MSMEs in India.\n\
         Analyze the following business data for GSTIN {gstin}:\n\n\
         - Overall Risk Score: {score}/100\n\
         - Risk Category: {tier}\n\
         - GST Compliance (Tax): Filing regularity {filing}%, Turnover stability {stability}%\n\
         - Judicial Data (Legal): {cases} total cases, {fraud} fraud cases, {bounces} cheque bounce indicators.\n\
         - Behavioral: Anomaly score {anomaly}% with {spikes} turnover spikes.\n\n\
         Provide a concise, 3-4 sentence professional summary of WHY this risk level was assigned \
         and the logic behind the suggested trade action: {action}.\n\
         Focus on the specific red flags or positive indicators.",
        gstin = report.gstin,
        score = report.overall_score,
        tier = report.risk_level,
        filing = report.compliance.filing_regularity,
        stability = report.compliance.turnover_trend_stability,
        cases = report.judicial.case_count,
        fraud = report.judicial.fraud_related_cases,
        bounces = report.judicial.cheque_bounce_indicators,
        anomaly = report.behavioral.anomaly_score,
        spikes = if report.behavioral.turnover_spikes {
            "significant"
        } else {
            "no"
        },
        action = report.trade_action,
    )
}

/// Text generation backend.
///
/// Implementations must be `Send + Sync` so one instance can be shared across
/// request handlers and background tasks behind an `Arc`.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generates text for `prompt`. Errors are absorbed by `NarrativeEnricher`.
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}

// ============ Gemini ============

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any are non-blank.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Client for the Gemini `generateContent` endpoint.
///
/// Constructed once by the application entry point and injected into the enricher.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com`.
    /// * `model` - Model name used in the request path.
    /// * `api_key` - Credential sent in the `x-goog-api-key` header.
    /// * `timeout` - Per-request timeout applied by the HTTP client.
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create Gemini client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Builds a client from configuration. Returns `None` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(ref api_key) = config.gemini_api_key else {
            return Ok(None);
        };

        Self::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            api_key.clone(),
            Duration::from_secs(config.gemini_timeout_secs),
        )
        .map(Some)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl NarrativeGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let url = self.endpoint();
        // Key travels in a header, so the URL is safe to log
        tracing::info!("Requesting narrative from Gemini: {}", url);

        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Gemini returned {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Gemini response: {}", e))
        })?;

        parsed.text().ok_or_else(|| {
            AppError::ExternalApiError("Gemini response contained no text".to_string())
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Generator used when no API key is configured. Always fails.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl NarrativeGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::ExternalApiError(
            "No language model API key configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}

// ============ Enricher ============

/// Best-effort narrative enrichment. `enrich` never fails.
#[derive(Clone)]
pub struct NarrativeEnricher {
    generator: Arc<dyn NarrativeGenerator>,
    breaker: LlmCircuitBreaker,
    cache: NarrativeCache,
}

impl NarrativeEnricher {
    /// Enricher with the default breaker and a 1 hour narrative cache.
    pub fn new(generator: Arc<dyn NarrativeGenerator>) -> Self {
        Self {
            generator,
            breaker: create_llm_circuit_breaker(),
            cache: NarrativeCache::default(),
        }
    }

    /// Replaces the default narrative cache.
    pub fn with_cache(mut self, cache: NarrativeCache) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the default circuit breaker.
    pub fn with_breaker(mut self, breaker: LlmCircuitBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    /// Picks the Gemini backend when configured, otherwise `UnconfiguredGenerator`.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let generator: Arc<dyn NarrativeGenerator> = match GeminiClient::from_config(config)? {
            Some(client) => Arc::new(client),
            None => Arc::new(UnconfiguredGenerator),
        };
        tracing::info!("Narrative generator: {}", generator.name());
        Ok(Self::new(generator))
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Returns a narrative for `report`, or `FALLBACK_EXPLANATION` on any failure.
    pub async fn enrich(&self, report: &CredibilityReport) -> String {
        if let Some(narrative) = self.cache.get(&report.gstin).await {
            return narrative;
        }

        let prompt = build_prompt(report);
        let generator = Arc::clone(&self.generator);
        let result = self
            .breaker
            .call(async move { generator.generate(&prompt).await })
            .await;

        match result {
            Ok(narrative) => {
                tracing::info!("✓ Narrative generated for {}", report.gstin);
                self.cache.insert(&report.gstin, &narrative).await;
                narrative
            }
            Err(failsafe::Error::Rejected) => {
                tracing::warn!(
                    "Narrative circuit open, using fallback for {}",
                    report.gstin
                );
                FALLBACK_EXPLANATION.to_string()
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::error!("Narrative generation failed for {}: {}", report.gstin, e);
                FALLBACK_EXPLANATION.to_string()
            }
        }
    }
}
