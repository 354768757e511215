//! Support topic detection for the template responder.
//!
//! Word-boundary regex matching, checked in a fixed priority order. This never
//! sees crisis language in practice: the controller routes that away first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// What a free-text message is mostly about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportTopic {
    Anxiety,
    Depression,
    Stress,
    Greeting,
    /// Nothing specific matched.
    General,
}

impl SupportTopic {
    pub fn label(&self) -> &'static str {
        match self {
            SupportTopic::Anxiety => "anxiety",
            SupportTopic::Depression => "depression",
            SupportTopic::Stress => "stress",
            SupportTopic::Greeting => "greeting",
            SupportTopic::General => "general",
        }
    }
}

impl fmt::Display for SupportTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// NOTE: expect() is acceptable here, the patterns are compile-time constants.
static ANXIETY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(anxious|anxiety|panic|panicking|worried|worrying|nervous)\b")
        .expect("Invalid regex: anxiety pattern")
});

static DEPRESSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(depressed|depression|sad|hopeless|empty|numb|miserable)\b")
        .expect("Invalid regex: depression pattern")
});

static STRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(stress|stressed|stressful|overwhelmed|pressure|burnt out|burned out)\b")
        .expect("Invalid regex: stress pattern")
});

static GREETING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hello|hi|hey|hiya|good morning|good afternoon|good evening)\b")
        .expect("Invalid regex: greeting pattern")
});

/// Classifies a message into a `SupportTopic`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicClassifier;

impl TopicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// First matching topic in priority order: anxiety, depression, stress, greeting.
    pub fn classify(&self, text: &str) -> SupportTopic {
        let ordered: [(SupportTopic, &Regex); 4] = [
            (SupportTopic::Anxiety, &*ANXIETY_PATTERN),
            (SupportTopic::Depression, &*DEPRESSION_PATTERN),
            (SupportTopic::Stress, &*STRESS_PATTERN),
            (SupportTopic::Greeting, &*GREETING_PATTERN),
        ];
        ordered
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(topic, _)| *topic)
            .unwrap_or(SupportTopic::General)
    }
}
