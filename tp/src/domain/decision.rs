//! Weather suitability decision

use serde::{Deserialize, Serialize};

use super::trip::AnalysisKey;

pub const DEFAULT_REASONING: &str = "Weather conditions analyzed";
pub const DEFAULT_RECOMMENDATION: &str = "Proceed with your trip";

const PARSE_FAILURE_REASONING: &str = "Unable to parse weather analysis, proceeding with caution";
const PARSE_FAILURE_RECOMMENDATION: &str = "Review weather data manually before traveling";
const ANALYSIS_FAILURE_REASONING: &str = "Unable to analyze weather, proceeding with caution";
const ANALYSIS_FAILURE_RECOMMENDATION: &str = "Review weather data manually";

/// Whether the weather allows the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    #[default]
    Suitable,
    NotSuitable,
}

impl Verdict {
    /// Parse the model's verdict (`SUITABLE` / `NOT_SUITABLE`)
    ///
    /// Case-insensitive; `-`, `_` and runs of whitespace are interchangeable,
    /// so `not suitable` and `Not-Suitable` both read as `NotSuitable`.
    pub fn parse(s: &str) -> Option<Self> {
        let words: Vec<String> = s
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();
        match words.join("_").as_str() {
            "SUITABLE" => Some(Self::Suitable),
            "NOT_SUITABLE" => Some(Self::NotSuitable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suitable => "SUITABLE",
            Self::NotSuitable => "NOT_SUITABLE",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured outcome of a weather analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitabilityDecision {
    #[serde(rename = "decision")]
    pub verdict: Verdict,
    pub reasoning: String,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

impl Default for SuitabilityDecision {
    fn default() -> Self {
        Self {
            verdict: Verdict::Suitable,
            reasoning: DEFAULT_REASONING.to_string(),
            concerns: Vec::new(),
            recommendation: DEFAULT_RECOMMENDATION.to_string(),
        }
    }
}

impl SuitabilityDecision {
    /// Substitute used when the model answered but the answer was not valid JSON
    pub fn parse_failure(verdict: Verdict) -> Self {
        Self {
            verdict,
            reasoning: PARSE_FAILURE_REASONING.to_string(),
            concerns: Vec::new(),
            recommendation: PARSE_FAILURE_RECOMMENDATION.to_string(),
        }
    }

    /// Substitute used when no answer could be obtained at all
    pub fn analysis_failure(verdict: Verdict) -> Self {
        Self {
            verdict,
            reasoning: ANALYSIS_FAILURE_REASONING.to_string(),
            concerns: Vec::new(),
            recommendation: ANALYSIS_FAILURE_RECOMMENDATION.to_string(),
        }
    }

    pub fn is_suitable(&self) -> bool {
        self.verdict == Verdict::Suitable
    }
}

/// A decision together with the analysis it answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub key: AnalysisKey,
    pub decision: SuitabilityDecision,
    /// True when the decision is a substitute produced after a fault
    #[serde(default)]
    pub fallback: bool,
    pub decided_at: i64,
}

impl DecisionRecord {
    pub fn new(key: AnalysisKey, decision: SuitabilityDecision, fallback: bool) -> Self {
        Self {
            key,
            decision,
            fallback,
            decided_at: super::now_ms(),
        }
    }
}
