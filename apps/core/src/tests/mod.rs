//! Test Module
//!
//! Cross-module test suite for the triage engine.
//!
//! ## Test Categories
//! - `brain_tests`: risk classification and scoring properties
//! - `database_tests`: SQLite store for state, users, assessments and alerts
//! - `integration_tests`: full conversations through the controller
//! - `chaos_test`: storage and responder failure injection
//! - `supervisor_tests`: actor front door and concurrency

pub mod brain_tests;

use crate::actors::messages::{ActorError, AppError};
use crate::actors::traits::OpenEndedResponder;
use crate::brain::{RiskAssessment, RiskClassifier, RiskLevel};
use crate::controller::{ControllerSettings, ConversationController};
use crate::database::{self, SqliteStore};
use crate::models::{AssessmentRecord, ConversationState, CrisisAlert, ResponderContext, UserProfile};
use crate::screening::ScreeningResult;
use crate::store::{AssessmentLog, ConversationStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Database fixture
// ============================================================================

/// A file-backed SQLite store that lives as long as the fixture.
pub struct TestDb {
    pub store: Arc<SqliteStore>,
    _dir: TempDir,
}

pub async fn create_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.sqlite");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = database::init_db(&db_url, 5)
        .await
        .expect("Failed to initialize test database");

    TestDb {
        store: Arc::new(SqliteStore::new(pool)),
        _dir: dir,
    }
}

pub fn fast_settings() -> ControllerSettings {
    ControllerSettings {
        storage_timeout: Duration::from_secs(2),
        responder_timeout: Duration::from_millis(300),
        recent_assessments: 3,
    }
}

pub fn controller_for<S>(store: Arc<S>) -> ConversationController<S>
where
    S: ConversationStore + AssessmentLog,
{
    ConversationController::new(store, RiskClassifier::default()).with_settings(fast_settings())
}

// ============================================================================
// Mock responders
// ============================================================================

/// Returns a fixed reply and records every call.
pub struct RecordingResponder {
    reply: String,
    pub calls: Arc<Mutex<Vec<(String, ResponderContext)>>>,
}

impl RecordingResponder {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OpenEndedResponder for RecordingResponder {
    async fn generate(&self, text: String, context: ResponderContext) -> Result<String, AppError> {
        self.calls.lock().unwrap().push((text, context));
        Ok(self.reply.clone())
    }
}

/// Always fails.
pub struct FailingResponder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl OpenEndedResponder for FailingResponder {
    async fn generate(&self, _text: String, _context: ResponderContext) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Actor(ActorError::Responder("Simulated provider failure".to_string())))
    }
}

/// Answers only after `delay`.
pub struct SlowResponder {
    pub delay: Duration,
}

#[async_trait]
impl OpenEndedResponder for SlowResponder {
    async fn generate(&self, _text: String, _context: ResponderContext) -> Result<String, AppError> {
        tokio::time::sleep(self.delay).await;
        Ok("too late".to_string())
    }
}

// ============================================================================
// Failure-injecting store
// ============================================================================

/// Wraps `SqliteStore` and fails selected operations on demand.
pub struct FlakyStore {
    pub inner: Arc<SqliteStore>,
    pub fail_get: AtomicBool,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_users: AtomicBool,
    pub fail_log: AtomicBool,
    /// Delay applied to `get_state`, for timeout tests.
    pub get_delay: Mutex<Option<Duration>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            fail_get: AtomicBool::new(false),
            fail_put: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_users: AtomicBool::new(false),
            fail_log: AtomicBool::new(false),
            get_delay: Mutex::new(None),
        }
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), AppError> {
        if flag.load(Ordering::SeqCst) {
            Err(AppError::Database(sqlx::Error::Protocol(format!(
                "simulated {} failure",
                operation
            ))))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn get_state(&self, user_id: &str) -> Result<Option<ConversationState>, AppError> {
        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Self::check(&self.fail_get, "get_state")?;
        self.inner.get_state(user_id).await
    }

    async fn put_state(&self, state: &ConversationState) -> Result<(), AppError> {
        Self::check(&self.fail_put, "put_state")?;
        self.inner.put_state(state).await
    }

    async fn delete_state(&self, user_id: &str) -> Result<bool, AppError> {
        Self::check(&self.fail_delete, "delete_state")?;
        self.inner.delete_state(user_id).await
    }

    async fn touch_user(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, AppError> {
        Self::check(&self.fail_users, "touch_user")?;
        self.inner.touch_user(user_id, display_name).await
    }

    async fn increment_conversation_count(&self, user_id: &str) -> Result<(), AppError> {
        Self::check(&self.fail_users, "increment_conversation_count")?;
        self.inner.increment_conversation_count(user_id).await
    }

    async fn set_last_risk_level(&self, user_id: &str, level: RiskLevel) -> Result<(), AppError> {
        Self::check(&self.fail_users, "set_last_risk_level")?;
        self.inner.set_last_risk_level(user_id, level).await
    }
}

#[async_trait]
impl AssessmentLog for FlakyStore {
    async fn append_assessment(
        &self,
        user_id: &str,
        result: &ScreeningResult,
    ) -> Result<AssessmentRecord, AppError> {
        Self::check(&self.fail_log, "append_assessment")?;
        self.inner.append_assessment(user_id, result).await
    }

    async fn append_crisis_alert(
        &self,
        user_id: &str,
        assessment: &RiskAssessment,
        message: &str,
    ) -> Result<CrisisAlert, AppError> {
        Self::check(&self.fail_log, "append_crisis_alert")?;
        self.inner.append_crisis_alert(user_id, assessment, message).await
    }

    async fn recent_assessments(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AssessmentRecord>, AppError> {
        Self::check(&self.fail_log, "recent_assessments")?;
        self.inner.recent_assessments(user_id, limit).await
    }
}

/// True when `text` carries all three hotline numbers.
pub fn has_hotlines(text: &str) -> bool {
    use crate::composer::{EMERGENCY, KIDS_HELPLINE, LIFELINE};
    text.contains(LIFELINE) && text.contains(KIDS_HELPLINE) && text.contains(EMERGENCY)
}
