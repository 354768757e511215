//! Conversation entry point.
//!
//! One call per inbound message: commands first, then either the screening
//! engine (when a questionnaire is in progress) or the risk classifier followed
//! by the crisis template or the open-ended responder. Every failure is turned
//! into a reply; nothing here returns an error to the transport.

use crate::actors::traits::OpenEndedResponder;
use crate::brain::{RiskAssessment, RiskClassifier, RiskLevel};
use crate::composer;
use crate::error::AppError;
use crate::fallback::TemplateResponder;
use crate::models::{
    ActionId, ConversationState, InboundMessage, ResponderContext, Response, UserProfile,
    DEFAULT_DISPLAY_NAME,
};
use crate::screening::{Instrument, ScreeningEngine, ScreeningStep};
use crate::store::{AssessmentLog, ConversationStore};
use crate::user_locks::UserLocks;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Timeouts and limits applied by the controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub storage_timeout: Duration,
    pub responder_timeout: Duration,
    /// Assessment summaries handed to the responder.
    pub recent_assessments: i64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_secs(5),
            responder_timeout: Duration::from_secs(20),
            recent_assessments: 3,
        }
    }
}

/// Slash commands understood before any other routing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Assess,
    Crisis,
    Cancel,
    Unknown(String),
}

impl Command {
    /// `None` when the text is not a command.
    fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        // Group chats address commands as /help@botname
        let name = name.split('@').next().unwrap_or(name).to_lowercase();
        Some(match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "assess" => Command::Assess,
            "crisis" => Command::Crisis,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(word.to_string()),
        })
    }
}

pub struct ConversationController<S>
where
    S: ConversationStore + AssessmentLog,
{
    store: Arc<S>,
    classifier: RiskClassifier,
    engine: ScreeningEngine,
    responder: Option<Arc<dyn OpenEndedResponder>>,
    fallback: TemplateResponder,
    locks: UserLocks,
    settings: ControllerSettings,
}

impl<S> ConversationController<S>
where
    S: ConversationStore + AssessmentLog,
{
    /// A controller that answers open-ended messages from templates only.
    pub fn new(store: Arc<S>, classifier: RiskClassifier) -> Self {
        Self {
            store,
            classifier,
            engine: ScreeningEngine::new(),
            responder: None,
            fallback: TemplateResponder::new(),
            locks: UserLocks::new(),
            settings: ControllerSettings::default(),
        }
    }

    /// Routes open-ended messages to `responder`, keeping templates as fallback.
    pub fn with_responder(mut self, responder: Arc<dyn OpenEndedResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Handles a message from a transport that supplies no display name.
    pub async fn handle_message(&self, user_id: &str, text: &str) -> Response {
        self.handle_inbound(&InboundMessage::new(user_id, text)).await
    }

    #[instrument(skip(self, inbound), fields(user_id = %inbound.user_id))]
    pub async fn handle_inbound(&self, inbound: &InboundMessage) -> Response {
        let user_id = inbound.user_id.as_str();
        debug!("Inbound message: {}", inbound.text);

        let profile = match self
            .storage(self.store.touch_user(user_id, inbound.display_name.as_deref()))
            .await
        {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Failed to update user profile: {}", e);
                None
            }
        };
        let name = display_name(profile.as_ref(), inbound);

        let (response, level) = match Command::parse(&inbound.text) {
            Some(command) => {
                self.run_command(user_id, &name, command, &inbound.text)
                    .await
            }
            None => self.route_text(user_id, &name, profile.as_ref(), &inbound.text).await,
        };

        self.record_activity(user_id, level).await;
        response
    }

    /// Handles a menu button press.
    #[instrument(skip(self))]
    pub async fn handle_action(&self, user_id: &str, action: ActionId) -> Response {
        match action {
            ActionId::AssessDepression => self.start_screening(user_id, Instrument::Phq9).await,
            ActionId::AssessAnxiety => self.start_screening(user_id, Instrument::Gad7).await,
            ActionId::AssessSafety => composer::safety_check(),
            ActionId::Crisis => composer::crisis_resources(),
        }
    }

    /// Starts `instrument`, discarding any screening already in progress.
    #[instrument(skip(self))]
    pub async fn start_screening(&self, user_id: &str, instrument: Instrument) -> Response {
        let _guard = self.locks.acquire(user_id).await;
        let (state, prompt) = self.engine.start(user_id, instrument);
        match self.storage(self.store.put_state(&state)).await {
            Ok(()) => {
                info!(%instrument, "Screening started");
                Response::text(prompt)
            }
            Err(e) => {
                error!("Failed to save new screening: {}", e);
                composer::technical_difficulty()
            }
        }
    }

    /// Clears any active process for the user.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: &str) -> Response {
        let _guard = self.locks.acquire(user_id).await;
        match self.storage(self.store.delete_state(user_id)).await {
            Ok(had_active) => {
                if had_active {
                    info!("Active process cancelled");
                }
                composer::cancelled(had_active)
            }
            Err(e) => {
                error!("Failed to cancel: {}", e);
                composer::technical_difficulty()
            }
        }
    }

    async fn run_command(
        &self,
        user_id: &str,
        name: &str,
        command: Command,
        text: &str,
    ) -> (Response, Option<RiskLevel>) {
        debug!(?command, "Command");
        let response = match command {
            Command::Start => composer::welcome(name),
            Command::Help => composer::help(),
            Command::Assess => composer::assess_menu(),
            Command::Crisis => composer::crisis_resources(),
            Command::Cancel => self.cancel(user_id).await,
            Command::Unknown(word) => {
                return self.unknown_command(user_id, name, &word, text).await;
            }
        };
        (response, None)
    }

    /// Slash-prefixed text we don't recognise is still screened for crisis
    /// language before being rejected as a command.
    async fn unknown_command(
        &self,
        user_id: &str,
        name: &str,
        word: &str,
        text: &str,
    ) -> (Response, Option<RiskLevel>) {
        let assessment = self.classifier.classify(text);
        let level = assessment.level;
        let response = if level.is_crisis() {
            self.crisis(user_id, name, &assessment, text).await
        } else {
            composer::unknown_command(word)
        };
        (response, Some(level))
    }

    /// Free text: screening answer or classified message. Also returns the risk
    /// level when the classifier ran.
    async fn route_text(
        &self,
        user_id: &str,
        name: &str,
        profile: Option<&UserProfile>,
        text: &str,
    ) -> (Response, Option<RiskLevel>) {
        {
            let _guard = self.locks.acquire(user_id).await;
            let state = match self.load_state(user_id).await {
                Ok(state) => state,
                Err(e) => {
                    error!("Failed to load conversation state: {}", e);
                    return (composer::technical_difficulty(), None);
                }
            };
            if !state.is_normal() {
                return (self.answer_screening(&state, text).await, None);
            }
        }

        let assessment = self.classifier.classify(text);
        let level = assessment.level;
        let response = if level.is_crisis() {
            self.crisis(user_id, name, &assessment, text).await
        } else {
            self.open_ended(user_id, name, profile, text).await
        };
        (response, Some(level))
    }

    /// Absent state means normal. An unreadable record is dropped so the user
    /// is not stuck behind it.
    async fn load_state(&self, user_id: &str) -> Result<ConversationState, AppError> {
        match self.storage(self.store.get_state(user_id)).await {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Ok(ConversationState::normal(user_id)),
            Err(AppError::Validation(reason)) => {
                warn!("Discarding invalid conversation state: {}", reason);
                self.storage(self.store.delete_state(user_id)).await?;
                Ok(ConversationState::normal(user_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Applies one answer. Caller holds the user's lock.
    async fn answer_screening(&self, state: &ConversationState, text: &str) -> Response {
        let step = match self.engine.submit_answer(state, text) {
            Ok(step) => step,
            Err(e) => {
                debug!("Answer rejected: {}", e);
                return composer::reprompt(&e);
            }
        };

        match step {
            ScreeningStep::NextQuestion { prompt, state } => {
                match self.storage(self.store.put_state(&state)).await {
                    Ok(()) => Response::text(prompt),
                    Err(e) => {
                        error!("Failed to save screening progress: {}", e);
                        composer::technical_difficulty()
                    }
                }
            }
            ScreeningStep::Completed { result, state } => {
                if let Err(e) = self.storage(self.store.delete_state(&state.user_id)).await {
                    error!("Failed to clear completed screening: {}", e);
                    return composer::technical_difficulty();
                }
                info!(
                    instrument = %result.instrument,
                    total = result.total_score,
                    severity = %result.severity,
                    escalate = result.escalate,
                    "Screening completed"
                );
                if let Err(e) = self
                    .storage(self.store.append_assessment(&state.user_id, &result))
                    .await
                {
                    error!("Failed to log assessment: {}", e);
                }
                composer::screening_result(&result)
            }
        }
    }

    /// Crisis template. The alert is best effort; the reply never waits on it
    /// succeeding.
    async fn crisis(
        &self,
        user_id: &str,
        name: &str,
        assessment: &RiskAssessment,
        text: &str,
    ) -> Response {
        warn!(
            level = %assessment.level,
            crisis_type = %assessment.crisis_type,
            immediate = assessment.immediate_action_required,
            "Crisis detected"
        );
        if let Err(e) = self
            .storage(self.store.append_crisis_alert(user_id, assessment, text))
            .await
        {
            error!("Failed to log crisis alert: {}", e);
        }
        composer::crisis_response(assessment.level, name)
    }

    async fn open_ended(
        &self,
        user_id: &str,
        name: &str,
        profile: Option<&UserProfile>,
        text: &str,
    ) -> Response {
        let context = self.responder_context(user_id, name, profile).await;

        if let Some(responder) = &self.responder {
            match timeout(
                self.settings.responder_timeout,
                responder.generate(text.to_string(), context.clone()),
            )
            .await
            {
                Ok(Ok(reply)) => return Response::text(reply),
                Ok(Err(e)) => warn!("Responder failed, using templates: {}", e),
                Err(_) => warn!("Responder timed out, using templates"),
            }
        }

        Response::text(self.fallback.reply(text, &context))
    }

    async fn responder_context(
        &self,
        user_id: &str,
        name: &str,
        profile: Option<&UserProfile>,
    ) -> ResponderContext {
        let recent_assessments = match self
            .storage(
                self.store
                    .recent_assessments(user_id, self.settings.recent_assessments),
            )
            .await
        {
            Ok(records) => records.iter().map(|r| r.summary()).collect(),
            Err(e) => {
                warn!("Failed to load recent assessments: {}", e);
                Vec::new()
            }
        };

        ResponderContext {
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            last_risk_level: profile.and_then(|p| p.risk_level()),
            recent_assessments,
        }
    }

    async fn record_activity(&self, user_id: &str, level: Option<RiskLevel>) {
        if let Err(e) = self
            .storage(self.store.increment_conversation_count(user_id))
            .await
        {
            warn!("Failed to update conversation count: {}", e);
        }
        if let Some(level) = level.filter(|l| *l != RiskLevel::Low) {
            if let Err(e) = self
                .storage(self.store.set_last_risk_level(user_id, level))
                .await
            {
                warn!("Failed to update last risk level: {}", e);
            }
        }
    }

    async fn storage<T>(
        &self,
        operation: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        timeout(self.settings.storage_timeout, operation).await?
    }
}

fn display_name(profile: Option<&UserProfile>, inbound: &InboundMessage) -> String {
    profile
        .map(|p| p.name_or_default().to_string())
        .or_else(|| inbound.display_name.clone())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}
