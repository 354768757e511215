//! Question bank and band tables for the supported self-report questionnaires.
//!
//! Pure data: no state, no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest value a single answer may take.
pub const MAX_ANSWER: u8 = 3;

/// Scale shown under every question.
pub const ANSWER_SCALE: &str =
    "0 = Not at all\n1 = Several days\n2 = More than half the days\n3 = Nearly every day";

const PHQ9_QUESTIONS: &[&str] = &[
    "Little interest or pleasure in doing things",
    "Feeling down, depressed, or hopeless",
    "Trouble falling or staying asleep, or sleeping too much",
    "Feeling tired or having little energy",
    "Poor appetite or overeating",
    "Feeling bad about yourself, or that you are a failure or have let yourself or your family down",
    "Trouble concentrating on things",
    "Moving or speaking so slowly that other people could have noticed",
    "Thoughts that you would be better off dead, or of hurting yourself",
];

const GAD7_QUESTIONS: &[&str] = &[
    "Feeling nervous, anxious, or on edge",
    "Not being able to stop or control worrying",
    "Worrying too much about different things",
    "Trouble relaxing",
    "Being so restless that it is hard to sit still",
    "Becoming easily annoyed or irritable",
    "Feeling afraid as if something awful might happen",
];

/// Named severity bands shared by both instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minimal,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minimal => "Minimal",
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::ModeratelySevere => "Moderately severe",
            Severity::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a band table. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityBand {
    pub min: u8,
    pub max: u8,
    pub severity: Severity,
    pub recommendation: &'static str,
}

const PHQ9_BANDS: &[SeverityBand] = &[
    SeverityBand {
        min: 0,
        max: 4,
        severity: Severity::Minimal,
        recommendation: "Your responses suggest minimal depression symptoms. Continue with healthy habits.",
    },
    SeverityBand {
        min: 5,
        max: 9,
        severity: Severity::Mild,
        recommendation: "Your responses suggest mild depression. Consider speaking with a counselor.",
    },
    SeverityBand {
        min: 10,
        max: 14,
        severity: Severity::Moderate,
        recommendation: "Your responses suggest moderate depression. I recommend professional support.",
    },
    SeverityBand {
        min: 15,
        max: 19,
        severity: Severity::ModeratelySevere,
        recommendation: "Your responses suggest moderately severe depression. Please see a mental health professional.",
    },
    SeverityBand {
        min: 20,
        max: 27,
        severity: Severity::Severe,
        recommendation: "Your responses suggest severe depression. Please see a mental health professional soon.",
    },
];

const GAD7_BANDS: &[SeverityBand] = &[
    SeverityBand {
        min: 0,
        max: 4,
        severity: Severity::Minimal,
        recommendation: "Your responses suggest minimal anxiety symptoms.",
    },
    SeverityBand {
        min: 5,
        max: 9,
        severity: Severity::Mild,
        recommendation: "Your responses suggest mild anxiety. Consider anxiety management techniques.",
    },
    SeverityBand {
        min: 10,
        max: 14,
        severity: Severity::Moderate,
        recommendation: "Your responses suggest moderate anxiety. Consider professional support.",
    },
    SeverityBand {
        min: 15,
        max: 21,
        severity: Severity::Severe,
        recommendation: "Your responses suggest severe anxiety. Please consider professional help.",
    },
];

/// A supported screening questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Patient Health Questionnaire, 9 items (depression).
    Phq9,
    /// Generalized Anxiety Disorder scale, 7 items.
    Gad7,
}

impl Instrument {
    pub const ALL: [Instrument; 2] = [Instrument::Phq9, Instrument::Gad7];

    /// Stable identifier used in logs.
    pub fn id(&self) -> &'static str {
        match self {
            Instrument::Phq9 => "phq9",
            Instrument::Gad7 => "gad7",
        }
    }

    /// Display name, also the value written to the assessment log.
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Phq9 => "PHQ-9",
            Instrument::Gad7 => "GAD-7",
        }
    }

    /// What the questionnaire screens for, used in headings.
    pub fn topic(&self) -> &'static str {
        match self {
            Instrument::Phq9 => "Depression",
            Instrument::Gad7 => "Anxiety",
        }
    }

    pub fn questions(&self) -> &'static [&'static str] {
        match self {
            Instrument::Phq9 => PHQ9_QUESTIONS,
            Instrument::Gad7 => GAD7_QUESTIONS,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions().len()
    }

    /// Question text at a 0-based index.
    pub fn question(&self, index: usize) -> Option<&'static str> {
        self.questions().get(index).copied()
    }

    pub fn max_score(&self) -> u8 {
        self.question_count() as u8 * MAX_ANSWER
    }

    pub fn bands(&self) -> &'static [SeverityBand] {
        match self {
            Instrument::Phq9 => PHQ9_BANDS,
            Instrument::Gad7 => GAD7_BANDS,
        }
    }

    /// Scores at or above this value get crisis resources appended to the result.
    pub fn escalation_threshold(&self) -> u8 {
        match self {
            Instrument::Phq9 => 15,
            Instrument::Gad7 => 15,
        }
    }

    /// Looks up the band for a total score. Scores above the table clamp to the
    /// last band.
    pub fn band_for(&self, total_score: u8) -> &'static SeverityBand {
        let bands = self.bands();
        bands
            .iter()
            .find(|band| total_score >= band.min && total_score <= band.max)
            .unwrap_or(&bands[bands.len() - 1])
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
