use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PENDING_EXPLANATION;

// ============ Scoring Models ============

/// Relative weight of each sub-score in the overall score. Sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub legal: f64,
    pub tax: f64,
    pub behavioral: f64,
}

/// Risk tier derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classifies an overall score: `>= 75` is LOW, `>= 45` is MEDIUM, anything below is HIGH.
    pub fn from_score(score: u8) -> Self {
        if score >= 75 {
            RiskLevel::Low
        } else if score >= 45 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Recommended trade action for this tier.
    pub fn trade_action(self) -> TradeAction {
        match self {
            RiskLevel::Low => TradeAction::SafeForCredit,
            RiskLevel::Medium => TradeAction::PartialCredit,
            RiskLevel::High => TradeAction::AdvancePaymentOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credit policy recommended to a supplier dealing with the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    #[serde(rename = "Safe for Credit")]
    SafeForCredit,
    #[serde(rename = "Partial Credit")]
    PartialCredit,
    #[serde(rename = "Advance Payment Only")]
    AdvancePaymentOnly,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::SafeForCredit => "Safe for Credit",
            TradeAction::PartialCredit => "Partial Credit",
            TradeAction::AdvancePaymentOnly => "Advance Payment Only",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Report Models ============

/// GST filing behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstCompliance {
    /// 0-100, equal to the tax sub-score.
    pub filing_regularity: u8,
    /// 0-100.
    pub return_frequency_consistency: u8,
    /// 0-100.
    pub turnover_trend_stability: u8,
    pub last_filed_month: String,
}

/// Court and litigation exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudicialMetadata {
    pub case_count: u32,
    pub fraud_related_cases: u32,
    pub cheque_bounce_indicators: u32,
    /// 0-100, equal to the legal sub-score.
    pub litigation_risk_score: u8,
}

/// Anomalies in reported turnover and filing cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralPatterns {
    pub turnover_spikes: bool,
    pub irregular_filing_gaps: bool,
    /// 0-100, equal to the behavioral sub-score.
    pub anomaly_score: u8,
}

/// Credibility report for one GSTIN lookup.
///
/// Everything except `explanation` and `timestamp` is a pure function of the GSTIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredibilityReport {
    pub gstin: String,
    pub business_name: String,
    /// 0-100.
    pub overall_score: u8,
    pub risk_level: RiskLevel,
    pub trade_action: TradeAction,
    pub explanation: String,
    pub compliance: GstCompliance,
    pub judicial: JudicialMetadata,
    pub behavioral: BehavioralPatterns,
    pub timestamp: DateTime<Utc>,
}

impl CredibilityReport {
    /// Returns a copy of the report carrying `explanation`.
    pub fn with_explanation(self, explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
            ..self
        }
    }

    /// True while the placeholder narrative has not been replaced.
    pub fn is_explanation_pending(&self) -> bool {
        self.explanation == PENDING_EXPLANATION
    }

    /// Compares the derived assessment, ignoring `explanation` and `timestamp`.
    pub fn same_assessment(&self, other: &CredibilityReport) -> bool {
        self.gstin == other.gstin
            && self.business_name == other.business_name
            && self.overall_score == other.overall_score
            && self.risk_level == other.risk_level
            && self.trade_action == other.trade_action
            && self.compliance == other.compliance
            && self.judicial == other.judicial
            && self.behavioral == other.behavioral
    }
}

// ============ API Models ============

#[derive(Debug, Deserialize)]
pub struct GstinQueryParams {
    pub gstin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GstinValidationResponse {
    pub gstin: String,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub gstin: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub lookup_id: Uuid,
    pub report: CredibilityReport,
}
