//! Keyword lexicons used by the risk classifier.
//!
//! Loaded once at startup (built-in defaults, optionally replaced by a JSON file)
//! and never mutated afterwards. All entries are stored lowercased.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Time or method references. Only meaningful together with a lethality phrase.
const TEMPORAL_METHOD: &[&str] = &[
    "tonight",
    "today",
    "tomorrow",
    "right now",
    "this week",
    "plan",
    "pills",
    "overdose",
    "rope",
    "gun",
    "jump off",
    "bridge",
    "goodbye letter",
];

/// Statements of intent to die.
const LETHALITY_INTENT: &[&str] = &[
    "kill myself",
    "killing myself",
    "suicide",
    "suicidal",
    "end it all",
    "end my life",
    "want to die",
    "wanna die",
    "better off dead",
    "take my own life",
    "hang myself",
];

const SELF_HARM: &[&str] = &[
    "cut myself",
    "cutting myself",
    "self harm",
    "self-harm",
    "selfharm",
    "hurt myself",
    "hurting myself",
    "burn myself",
    "harm myself",
];

/// Acute distress without self-harm or lethality language.
const SEVERE_DISTRESS: &[&str] = &[
    "can't take it anymore",
    "cant take it anymore",
    "can't go on",
    "cant go on",
    "falling apart",
    "breaking down",
    "can't cope",
    "losing control",
];

/// Isolation and hopelessness markers.
const RISK_FACTORS: &[&str] = &[
    "alone",
    "lonely",
    "no one cares",
    "nobody cares",
    "hopeless",
    "worthless",
    "burden",
    "no point",
    "trapped",
    "isolated",
    "no friends",
    "empty",
];

/// Support and future-orientation markers.
const PROTECTIVE_FACTORS: &[&str] = &[
    "my family",
    "my friends",
    "my mum",
    "my mom",
    "my dad",
    "my parents",
    "therapist",
    "counsellor",
    "counselor",
    "support",
    "looking forward",
    "hopeful",
    "my pet",
    "future",
];

/// Immutable phrase lists for the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    pub temporal_method: Vec<String>,
    pub lethality_intent: Vec<String>,
    pub self_harm: Vec<String>,
    #[serde(default)]
    pub severe_distress: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub protective_factors: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            temporal_method: owned(TEMPORAL_METHOD),
            lethality_intent: owned(LETHALITY_INTENT),
            self_harm: owned(SELF_HARM),
            severe_distress: owned(SEVERE_DISTRESS),
            risk_factors: owned(RISK_FACTORS),
            protective_factors: owned(PROTECTIVE_FACTORS),
        }
    }
}

impl Lexicon {
    /// Parses a lexicon from JSON. Entries are lowercased and blank ones dropped.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let lexicon: Lexicon = serde_json::from_str(json)?;
        let lexicon = lexicon.normalized();
        if lexicon.lethality_intent.is_empty() || lexicon.self_harm.is_empty() {
            return Err(AppError::Config(
                "lexicon must define lethality_intent and self_harm phrases".to_string(),
            ));
        }
        Ok(lexicon)
    }

    /// Reads a lexicon file, or returns the built-in lexicon when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                info!("Loading risk lexicon from {}", path.display());
                let json = std::fs::read_to_string(path)?;
                Self::from_json(&json)
            }
            None => Ok(Self::default()),
        }
    }

    fn normalized(self) -> Self {
        Self {
            temporal_method: normalize(self.temporal_method),
            lethality_intent: normalize(self.lethality_intent),
            self_harm: normalize(self.self_harm),
            severe_distress: normalize(self.severe_distress),
            risk_factors: normalize(self.risk_factors),
            protective_factors: normalize(self.protective_factors),
        }
    }
}

fn owned(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| p.to_string()).collect()
}

fn normalize(phrases: Vec<String>) -> Vec<String> {
    phrases
        .into_iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
