use crate::brain::RiskLevel;
use crate::error::AppError;
use crate::screening::instrument::MAX_ANSWER;
use crate::screening::Instrument;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Where a user currently is in the conversation flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    /// Free conversation; every message goes through the risk classifier.
    #[default]
    Normal,
    /// Answering the PHQ-9 depression questionnaire.
    ScreeningPhq9,
    /// Answering the GAD-7 anxiety questionnaire.
    ScreeningGad7,
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Normal => "normal",
            ConversationMode::ScreeningPhq9 => "screening_phq9",
            ConversationMode::ScreeningGad7 => "screening_gad7",
        }
    }

    /// The instrument being administered, if any.
    pub fn instrument(&self) -> Option<Instrument> {
        match self {
            ConversationMode::Normal => None,
            ConversationMode::ScreeningPhq9 => Some(Instrument::Phq9),
            ConversationMode::ScreeningGad7 => Some(Instrument::Gad7),
        }
    }

    pub fn for_instrument(instrument: Instrument) -> Self {
        match instrument {
            Instrument::Phq9 => ConversationMode::ScreeningPhq9,
            Instrument::Gad7 => ConversationMode::ScreeningGad7,
        }
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(ConversationMode::Normal),
            "screening_phq9" => Ok(ConversationMode::ScreeningPhq9),
            "screening_gad7" => Ok(ConversationMode::ScreeningGad7),
            other => Err(AppError::Validation(format!("unknown conversation mode '{}'", other))),
        }
    }
}

/// The single active conversation record of a user.
///
/// `step` is not stored separately: it is always `responses.len()`, so the
/// "one response per answered question" invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_id: String,
    #[serde(default)]
    pub mode: ConversationMode,
    /// Answers given so far, each in `0..=3`.
    #[serde(default)]
    pub responses: Vec<u8>,
    /// Unix timestamp of the last write, filled in by the store.
    #[serde(default)]
    pub updated_at: i64,
}

impl ConversationState {
    /// The state of a user with no active screening.
    pub fn normal(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            mode: ConversationMode::Normal,
            responses: Vec::new(),
            updated_at: 0,
        }
    }

    /// A fresh screening at question zero.
    pub fn screening(user_id: impl Into<String>, instrument: Instrument) -> Self {
        Self {
            user_id: user_id.into(),
            mode: ConversationMode::for_instrument(instrument),
            responses: Vec::new(),
            updated_at: 0,
        }
    }

    /// Index of the next unanswered question.
    pub fn step(&self) -> usize {
        self.responses.len()
    }

    pub fn is_normal(&self) -> bool {
        self.mode == ConversationMode::Normal
    }
}

/// Row shape of the `conversation_states` table.
#[derive(Debug, FromRow)]
pub struct ConversationStateRow {
    pub user_id: String,
    pub mode: String,
    pub step: i64,
    pub responses: Json<Vec<u8>>,
    pub updated_at: i64,
}

impl TryFrom<ConversationStateRow> for ConversationState {
    type Error = AppError;

    fn try_from(row: ConversationStateRow) -> Result<Self, Self::Error> {
        let mode: ConversationMode = row.mode.parse()?;
        let responses = row.responses.0;
        if row.step != responses.len() as i64 {
            return Err(AppError::Validation(format!(
                "conversation state for {} has step {} but {} responses",
                row.user_id,
                row.step,
                responses.len()
            )));
        }
        match mode.instrument() {
            None if !responses.is_empty() => {
                return Err(AppError::Validation(format!(
                    "conversation state for {} is normal but carries responses",
                    row.user_id
                )));
            }
            Some(instrument) if responses.len() >= instrument.question_count() => {
                return Err(AppError::Validation(format!(
                    "conversation state for {} has {} answers for {}",
                    row.user_id,
                    responses.len(),
                    instrument
                )));
            }
            _ => {}
        }
        if responses.iter().any(|&r| r > MAX_ANSWER) {
            return Err(AppError::Validation(format!(
                "conversation state for {} has an answer outside 0-{}",
                row.user_id, MAX_ANSWER
            )));
        }
        Ok(Self {
            user_id: row.user_id,
            mode,
            responses,
            updated_at: row.updated_at,
        })
    }
}

/// A chat user as known to the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    /// Preferred display name, when the transport supplied one.
    pub display_name: Option<String>,
    pub created_at: i64,
    pub last_active: i64,
    #[serde(default)]
    pub conversation_count: i64,
    /// Last non-LOW risk level seen for this user.
    pub last_risk_level: Option<String>,
}

impl UserProfile {
    pub fn name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.last_risk_level.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Name used in templates when the transport gave none.
pub const DEFAULT_DISPLAY_NAME: &str = "friend";

/// A completed questionnaire as written to the append-only log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssessmentRecord {
    pub id: i64,
    pub user_id: String,
    /// Instrument display name, e.g. "PHQ-9".
    pub instrument: String,
    pub total_score: i64,
    pub severity: String,
    pub responses: Json<Vec<u8>>,
    pub created_at: i64,
}

impl AssessmentRecord {
    /// One-line summary handed to the open-ended responder.
    pub fn summary(&self) -> String {
        format!("{}: {} ({})", self.instrument, self.total_score, self.severity)
    }
}

/// Audit record for a HIGH or IMMINENT classification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrisisAlert {
    pub id: String,
    pub user_id: String,
    pub crisis_type: String,
    pub level: String,
    /// JSON snapshot of the assessment and the triggering message.
    pub snapshot: String,
    pub created_at: i64,
}

/// Menu buttons the transport can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    /// Start the PHQ-9 questionnaire.
    AssessDepression,
    /// Start the GAD-7 questionnaire.
    AssessAnxiety,
    /// Safety check (not yet a questionnaire).
    AssessSafety,
    /// Show the crisis resource sheet.
    Crisis,
}

impl ActionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::AssessDepression => "assess_depression",
            ActionId::AssessAnxiety => "assess_anxiety",
            ActionId::AssessSafety => "assess_safety",
            ActionId::Crisis => "crisis",
        }
    }
}

impl FromStr for ActionId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "assess_depression" => Ok(ActionId::AssessDepression),
            "assess_anxiety" => Ok(ActionId::AssessAnxiety),
            "assess_safety" => Ok(ActionId::AssessSafety),
            "crisis" => Ok(ActionId::Crisis),
            other => Err(AppError::Validation(format!("unknown action '{}'", other))),
        }
    }
}

/// A (label, action) pair rendered as a button by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub label: String,
    pub action_id: ActionId,
}

impl SuggestedAction {
    pub fn new(label: impl Into<String>, action_id: ActionId) -> Self {
        Self {
            label: label.into(),
            action_id,
        }
    }
}

/// Outbound payload for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    /// Only populated for menu-driven entry points.
    #[serde(default)]
    pub suggested_actions: Vec<SuggestedAction>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_actions: Vec::new(),
        }
    }

    pub fn with_actions(text: impl Into<String>, suggested_actions: Vec<SuggestedAction>) -> Self {
        Self {
            text: text.into(),
            suggested_actions,
        }
    }
}

/// One message as delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub text: String,
}

impl InboundMessage {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            text: text.into(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// What the open-ended responder knows about the user besides the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderContext {
    pub user_id: String,
    pub display_name: String,
    pub last_risk_level: Option<RiskLevel>,
    /// Most recent assessment summaries, newest first.
    pub recent_assessments: Vec<String>,
}
