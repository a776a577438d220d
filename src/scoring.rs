//! Deterministic credibility scoring.
//!
//! A GSTIN is reduced to an integer seed and every field of the report is drawn
//! from `frac(sin(seed + offset) * 10000)` at a fixed offset. The generator is
//! kept bit-compatible with the dashboard's demo output, so changing the formula,
//! the offsets or the order of floating point operations changes every report.

use chrono::Utc;

use crate::constants::{LAST_FILED_MONTH, MOCK_BUSINESS_NAMES, PENDING_EXPLANATION, RISK_WEIGHTS};
use crate::models::{
    BehavioralPatterns, CredibilityReport, GstCompliance, JudicialMetadata, RiskLevel,
    ScoringWeights,
};

const TAX_OFFSET: u32 = 1;
const LEGAL_OFFSET: u32 = 2;
const BEHAVIORAL_OFFSET: u32 = 3;
const RETURN_FREQUENCY_OFFSET: u32 = 4;
const TURNOVER_STABILITY_OFFSET: u32 = 5;
const CASE_COUNT_OFFSET: u32 = 6;
const FRAUD_CASES_OFFSET: u32 = 7;
const CHEQUE_BOUNCE_OFFSET: u32 = 8;
const TURNOVER_SPIKE_OFFSET: u32 = 9;
const FILING_GAP_OFFSET: u32 = 10;

/// Sum of the UTF-16 code units of the identifier.
pub fn gstin_seed(gstin: &str) -> u64 {
    gstin.encode_utf16().map(u64::from).sum()
}

/// `frac(sin(x) * 10000)`, a value in `[0, 1)`.
pub fn unit_random(x: f64) -> f64 {
    let v = x.sin() * 10000.0;
    v - v.floor()
}

/// `floor(unit_random(seed + offset) * scale)`, a value in `[0, scale)`.
pub fn scaled_draw(seed: u64, offset: u32, scale: u32) -> u32 {
    let x = seed as f64 + f64::from(offset);
    (unit_random(x) * f64::from(scale)).floor() as u32
}

fn percent_draw(seed: u64, offset: u32) -> u8 {
    scaled_draw(seed, offset, 100) as u8
}

/// `floor(tax * w.tax + legal * w.legal + behavioral * w.behavioral)`, clamped to 100.
pub fn weighted_score(tax: u8, legal: u8, behavioral: u8, weights: &ScoringWeights) -> u8 {
    let score = f64::from(tax) * weights.tax
        + f64::from(legal) * weights.legal
        + f64::from(behavioral) * weights.behavioral;
    score.floor().clamp(0.0, 100.0) as u8
}

/// Builds the credibility report for `gstin`.
///
/// Accepts any string; format validation belongs to the caller. Two calls with
/// the same input differ only in `timestamp`.
pub fn generate_report(gstin: &str) -> CredibilityReport {
    let seed = gstin_seed(gstin);

    let tax_score = percent_draw(seed, TAX_OFFSET);
    let legal_score = percent_draw(seed, LEGAL_OFFSET);
    let behavioral_score = percent_draw(seed, BEHAVIORAL_OFFSET);

    let overall_score = weighted_score(tax_score, legal_score, behavioral_score, &RISK_WEIGHTS);
    let risk_level = RiskLevel::from_score(overall_score);

    let compliance = GstCompliance {
        filing_regularity: tax_score,
        return_frequency_consistency: percent_draw(seed, RETURN_FREQUENCY_OFFSET),
        turnover_trend_stability: percent_draw(seed, TURNOVER_STABILITY_OFFSET),
        last_filed_month: LAST_FILED_MONTH.to_string(),
    };

    let (fraud_related_cases, cheque_bounce_indicators) = match risk_level {
        RiskLevel::High => (
            scaled_draw(seed, FRAUD_CASES_OFFSET, 3) + 1,
            scaled_draw(seed, CHEQUE_BOUNCE_OFFSET, 5) + 1,
        ),
        RiskLevel::Medium => (0, scaled_draw(seed, CHEQUE_BOUNCE_OFFSET, 2)),
        RiskLevel::Low => (0, 0),
    };

    let judicial = JudicialMetadata {
        case_count: scaled_draw(seed, CASE_COUNT_OFFSET, 15),
        fraud_related_cases,
        cheque_bounce_indicators,
        litigation_risk_score: legal_score,
    };

    let behavioral = BehavioralPatterns {
        turnover_spikes: draw_exceeds(seed, TURNOVER_SPIKE_OFFSET, 0.8)
            && risk_level == RiskLevel::High,
        irregular_filing_gaps: draw_exceeds(seed, FILING_GAP_OFFSET, 0.7)
            && risk_level != RiskLevel::Low,
        anomaly_score: behavioral_score,
    };

    let business_name = MOCK_BUSINESS_NAMES[(seed % MOCK_BUSINESS_NAMES.len() as u64) as usize];

    tracing::debug!(
        gstin = %gstin,
        seed,
        overall_score,
        risk_level = %risk_level,
        "Generated credibility report"
    );

    CredibilityReport {
        gstin: gstin.to_string(),
        business_name: business_name.to_string(),
        overall_score,
        risk_level,
        trade_action: risk_level.trade_action(),
        explanation: PENDING_EXPLANATION.to_string(),
        compliance,
        judicial,
        behavioral,
        timestamp: Utc::now(),
    }
}

fn draw_exceeds(seed: u64, offset: u32, threshold: f64) -> bool {
    unit_random(seed as f64 + f64::from(offset)) > threshold
}
