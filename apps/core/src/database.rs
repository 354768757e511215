use crate::brain::{RiskAssessment, RiskLevel};
use crate::error::AppError;
use crate::models::{
    AssessmentRecord, ConversationState, ConversationStateRow, CrisisAlert, UserProfile,
};
use crate::screening::ScreeningResult;
use crate::store::{AssessmentLog, ConversationStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use std::str::FromStr;
use tracing::{info, instrument};
use uuid::Uuid;

/// Opens (creating if needed) the SQLite database and applies migrations.
pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    info!("Initializing database at: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}

/// SQLite-backed implementation of both storage traits.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT user_id, display_name, created_at, last_active, conversation_count, last_risk_level
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn crisis_alerts(&self, user_id: &str) -> Result<Vec<CrisisAlert>, AppError> {
        let alerts = sqlx::query_as::<_, CrisisAlert>(
            r#"
            SELECT id, user_id, crisis_type, level, snapshot, created_at
            FROM crisis_alerts
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(alerts)
    }
}

// --- Conversation state and users ---

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn get_state(&self, user_id: &str) -> Result<Option<ConversationState>, AppError> {
        let row = sqlx::query_as::<_, ConversationStateRow>(
            r#"
            SELECT user_id, mode, step, responses, updated_at
            FROM conversation_states
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ConversationState::try_from).transpose()
    }

    #[instrument(skip(self, state), fields(user_id = %state.user_id, mode = %state.mode, step = state.step()))]
    async fn put_state(&self, state: &ConversationState) -> Result<(), AppError> {
        let updated_at = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO conversation_states (user_id, mode, step, responses, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                mode = excluded.mode,
                step = excluded.step,
                responses = excluded.responses,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&state.user_id)
        .bind(state.mode.as_str())
        .bind(state.step() as i64)
        .bind(Json(&state.responses))
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_state(&self, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM conversation_states WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_user(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<UserProfile, AppError> {
        let now = Utc::now().timestamp();

        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (user_id, display_name, created_at, last_active, conversation_count)
            VALUES (?, ?, ?, ?, 0)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, users.display_name),
                last_active = excluded.last_active
            RETURNING user_id, display_name, created_at, last_active, conversation_count, last_risk_level
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn increment_conversation_count(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET conversation_count = conversation_count + 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_last_risk_level(&self, user_id: &str, level: RiskLevel) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_risk_level = ? WHERE user_id = ?")
            .bind(level.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// --- Append-only log ---

#[async_trait]
impl AssessmentLog for SqliteStore {
    #[instrument(skip(self, result), fields(instrument = %result.instrument, total = result.total_score))]
    async fn append_assessment(
        &self,
        user_id: &str,
        result: &ScreeningResult,
    ) -> Result<AssessmentRecord, AppError> {
        let created_at = Utc::now().timestamp();

        let record = sqlx::query_as::<_, AssessmentRecord>(
            r#"
            INSERT INTO assessments (user_id, instrument, total_score, severity, responses, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, instrument, total_score, severity, responses, created_at
            "#,
        )
        .bind(user_id)
        .bind(result.instrument.name())
        .bind(result.total_score as i64)
        .bind(result.severity.label())
        .bind(Json(&result.responses))
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    #[instrument(skip(self, assessment, message), fields(level = %assessment.level))]
    async fn append_crisis_alert(
        &self,
        user_id: &str,
        assessment: &RiskAssessment,
        message: &str,
    ) -> Result<CrisisAlert, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp();
        let snapshot = serde_json::to_string(&serde_json::json!({
            "assessment": assessment,
            "message": message,
        }))?;

        let alert = sqlx::query_as::<_, CrisisAlert>(
            r#"
            INSERT INTO crisis_alerts (id, user_id, crisis_type, level, snapshot, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, crisis_type, level, snapshot, created_at
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(assessment.crisis_type.as_str())
        .bind(assessment.level.as_str())
        .bind(&snapshot)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(alert)
    }

    async fn recent_assessments(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AssessmentRecord>, AppError> {
        let records = sqlx::query_as::<_, AssessmentRecord>(
            r#"
            SELECT id, user_id, instrument, total_score, severity, responses, created_at
            FROM assessments
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
