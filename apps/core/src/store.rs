//! Storage seams used by the conversation controller.
//!
//! `ConversationStore` holds the mutable per-user records; `AssessmentLog` is
//! append-only. Both are implemented by `database::SqliteStore`, and tests wrap
//! it to inject failures.

use crate::brain::{RiskAssessment, RiskLevel};
use crate::error::AppError;
use crate::models::{AssessmentRecord, ConversationState, CrisisAlert, UserProfile};
use crate::screening::ScreeningResult;
use async_trait::async_trait;

/// Per-user conversation state and profile.
#[async_trait]
pub trait ConversationStore: Send + Sync + 'static {
    /// The stored state, or `None` when the user has no active screening.
    async fn get_state(&self, user_id: &str) -> Result<Option<ConversationState>, AppError>;

    /// Inserts or replaces the user's state.
    async fn put_state(&self, state: &ConversationState) -> Result<(), AppError>;

    /// Removes the user's state. Returns whether one existed.
    async fn delete_state(&self, user_id: &str) -> Result<bool, AppError>;

    /// Creates the profile on first contact and refreshes `last_active`.
    /// A supplied display name replaces the stored one.
    async fn touch_user(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, AppError>;

    async fn increment_conversation_count(&self, user_id: &str) -> Result<(), AppError>;

    async fn set_last_risk_level(&self, user_id: &str, level: RiskLevel) -> Result<(), AppError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AssessmentLog: Send + Sync + 'static {
    async fn append_assessment(
        &self,
        user_id: &str,
        result: &ScreeningResult,
    ) -> Result<AssessmentRecord, AppError>;

    /// Records a HIGH or IMMINENT classification together with the message.
    async fn append_crisis_alert(
        &self,
        user_id: &str,
        assessment: &RiskAssessment,
        message: &str,
    ) -> Result<CrisisAlert, AppError>;

    /// Newest first.
    async fn recent_assessments(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AssessmentRecord>, AppError>;
}
