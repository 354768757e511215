use crate::models::{ActionId, InboundMessage, ResponderContext, Response};
use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// An error originating from the open-ended responder actor.
    #[error("Responder request failed: {0}")]
    Responder(String),
    /// A generic internal error within an actor.
    #[error("Internal system error: {0}")]
    Internal(String),
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the provider-backed responder actor.
#[derive(Debug)]
pub enum ResponderMessage {
    /// A request to generate a complete supportive reply.
    Generate {
        text: String,
        context: ResponderContext,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A free-text (or slash command) message from a user.
    ProcessUserMessage {
        inbound: InboundMessage,
        /// A channel to send the composed response back.
        responder: oneshot::Sender<Response>,
    },
    /// A menu button press.
    RunAction {
        user_id: String,
        action: ActionId,
        responder: oneshot::Sender<Response>,
    },
    /// A command to stop the supervisor loop.
    Shutdown,
}
