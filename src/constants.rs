use crate::models::ScoringWeights;

/// Weights applied to the three sub-scores. Legal exposure dominates.
pub const RISK_WEIGHTS: ScoringWeights = ScoringWeights {
    legal: 0.45,
    tax: 0.30,
    behavioral: 0.25,
};

/// Display names, indexed by `seed % MOCK_BUSINESS_NAMES.len()`.
pub const MOCK_BUSINESS_NAMES: [&str; 10] = [
    "Shiv Shakti Enterprises",
    "Arora Logistics Pvt Ltd",
    "Bharat Steel & Alloys",
    "Deepak Textiles",
    "Mehra Trading Co.",
    "Modern Infrastructure Group",
    "Vardhaman Polymers",
    "Ojas Electronics",
    "Jai Hind Chemicals",
    "Quality Packaging Solutions",
];

/// Narrative attached to a freshly generated report.
pub const PENDING_EXPLANATION: &str = "Analysis pending...";

/// Narrative used whenever the language model cannot produce one.
pub const FALLBACK_EXPLANATION: &str = "AI-driven analysis is temporarily unavailable. Based on metadata weights, this score reflects aggregated compliance and judicial signals.";

pub const LAST_FILED_MONTH: &str = "Oct 2024";

/// 2 digits (state), 5 letters + 4 digits + 1 letter (PAN), entity code, literal Z, checksum.
pub const GSTIN_PATTERN: &str = r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z]{1}[1-9A-Z]{1}Z[0-9A-Z]{1}$";

pub const INVALID_GSTIN_MESSAGE: &str =
    "Please enter a valid 15-digit GSTIN (e.g., 22AAAAA0000A1Z5)";
