//! Risk tier classification by keyword matching.
//!
//! Deterministic and side-effect free: lowercase the message, then look for
//! lexicon phrases as plain substrings. Precedence is IMMINENT > HIGH > MODERATE
//! > LOW and a lower tier never overrides a higher one.

use crate::brain::lexicon::Lexicon;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Severity tier, totally ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Moderate,
    High,
    Imminent,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Imminent => "imminent",
        }
    }

    /// HIGH and IMMINENT take the crisis path.
    pub fn is_crisis(&self) -> bool {
        *self >= RiskLevel::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "moderate" => Ok(RiskLevel::Moderate),
            "high" => Ok(RiskLevel::High),
            "imminent" => Ok(RiskLevel::Imminent),
            other => Err(AppError::Validation(format!("unknown risk level '{}'", other))),
        }
    }
}

/// Category of concerning content behind a tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisType {
    SuicideIdeation,
    SuicidePlan,
    SelfHarm,
    SevereDistress,
    #[default]
    #[serde(rename = "none")]
    NoCrisis,
}

impl CrisisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisType::SuicideIdeation => "suicide_ideation",
            CrisisType::SuicidePlan => "suicide_plan",
            CrisisType::SelfHarm => "self_harm",
            CrisisType::SevereDistress => "severe_distress",
            CrisisType::NoCrisis => "none",
        }
    }
}

impl fmt::Display for CrisisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output. The factor sets are for audit only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub crisis_type: CrisisType,
    pub risk_factors: BTreeSet<String>,
    pub protective_factors: BTreeSet<String>,
    pub immediate_action_required: bool,
}

/// Keyword-based risk classifier over an immutable lexicon.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    lexicon: Lexicon,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

impl RiskClassifier {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Classify a raw message.
    pub fn classify(&self, text: &str) -> RiskAssessment {
        let text = text.trim();
        if text.is_empty() {
            return RiskAssessment::default();
        }
        let lower = text.to_lowercase();

        let timing = matches(&lower, &self.lexicon.temporal_method);
        let lethality = matches(&lower, &self.lexicon.lethality_intent);
        let self_harm = matches(&lower, &self.lexicon.self_harm);

        let (level, crisis_type) = if !lethality.is_empty() && !timing.is_empty() {
            (RiskLevel::Imminent, CrisisType::SuicidePlan)
        } else if !lethality.is_empty() {
            (RiskLevel::High, CrisisType::SuicideIdeation)
        } else if !self_harm.is_empty() {
            (RiskLevel::Moderate, CrisisType::SelfHarm)
        } else {
            (RiskLevel::Low, CrisisType::NoCrisis)
        };

        let mut risk_factors: BTreeSet<String> = matches(&lower, &self.lexicon.risk_factors);
        risk_factors.extend(lethality);
        risk_factors.extend(self_harm);
        // Distress markers are audit-only; they never raise the tier.
        risk_factors.extend(matches(&lower, &self.lexicon.severe_distress));
        if level == RiskLevel::Imminent {
            risk_factors.extend(timing);
        }

        RiskAssessment {
            level,
            crisis_type,
            risk_factors,
            protective_factors: matches(&lower, &self.lexicon.protective_factors),
            immediate_action_required: level == RiskLevel::Imminent,
        }
    }
}

fn matches(lower: &str, phrases: &[String]) -> BTreeSet<String> {
    phrases
        .iter()
        .filter(|phrase| lower.contains(phrase.as_str()))
        .cloned()
        .collect()
}
