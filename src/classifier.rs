//! Geography Classifier
//!
//! Infers the market a query is about from keyword cues:
//! - Hong Kong: "港股", "hong kong", ".hk", ...
//! - Mainland China: "a股", "上证", "shanghai", ...
//! - US: "美股", "nasdaq", "nyse", ...
//!
//! Cue groups are checked in that order, so HK wins over China and China over US.

use crate::models::Geography;

/// Static keyword lists — zero allocation
const HK_KEYWORDS: &[&str] = &["港股", "hk股", "香港", "hong kong", ".hk"];

const CHINA_KEYWORDS: &[&str] = &[
    "a股", "沪市", "深市", "上证", "深证", "shanghai", "shenzhen",
];

const US_KEYWORDS: &[&str] = &["美股", "纳斯达克", "纽交所", "nasdaq", "nyse", "us stock"];

/// Precedence order for region cues
const CUE_GROUPS: &[(Geography, &[&str])] = &[
    (Geography::HongKong, HK_KEYWORDS),
    (Geography::China, CHINA_KEYWORDS),
    (Geography::UnitedStates, US_KEYWORDS),
];

/// Geography classifier
pub struct GeographyClassifier;

impl GeographyClassifier {
    /// Classify the market a text refers to.
    ///
    /// Falls back to `fallback` when no cue matches; a `Global` fallback
    /// is narrowed to the US market.
    pub fn classify(text: &str, fallback: Geography) -> Geography {
        let lowered = text.to_lowercase();

        CUE_GROUPS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(*kw)))
            .map(|(geography, _)| *geography)
            .unwrap_or(match fallback {
                Geography::Global => Geography::UnitedStates,
                other => other,
            })
    }
}
