use crate::actors::messages::{AppError, SupervisorMessage};
use crate::composer;
use crate::controller::ConversationController;
use crate::models::{ActionId, InboundMessage, Response};
use crate::store::{AssessmentLog, ConversationStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{error, info, instrument};

/// A handle to the `SupervisorActor`.
///
/// This is the front door for transports. Each request runs in its own task, so
/// a slow reply for one user never delays another; ordering between messages of
/// the same user is enforced by the controller's per-user lock.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    request_timeout: Duration,
}

impl SupervisorHandle {
    /// Spawns the supervisor around `controller`.
    ///
    /// # Arguments
    ///
    /// * `controller` - The conversation controller shared by all request tasks.
    /// * `request_timeout` - Upper bound for one request, after which the caller
    ///   gets the technical-difficulty reply.
    pub fn new<S>(controller: Arc<ConversationController<S>>, request_timeout: Duration) -> Self
    where
        S: ConversationStore + AssessmentLog,
    {
        let (sender, receiver) = mpsc::channel(32);
        let actor = SupervisorRunner {
            receiver,
            controller,
        };
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            request_timeout,
        }
    }

    /// Processes one inbound message. Never fails: actor or timeout problems
    /// become the technical-difficulty reply.
    #[instrument(skip(self, inbound), fields(user_id = %inbound.user_id))]
    pub async fn process_message(&self, inbound: InboundMessage) -> Response {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ProcessUserMessage {
            inbound,
            responder: send,
        };
        self.request(msg, recv).await
    }

    /// Runs a menu action for `user_id`.
    #[instrument(skip(self))]
    pub async fn run_action(&self, user_id: String, action: ActionId) -> Response {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::RunAction {
            user_id,
            action,
            responder: send,
        };
        self.request(msg, recv).await
    }

    /// Stops accepting new requests. Tasks already spawned finish normally.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(SupervisorMessage::Shutdown)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn request(&self, msg: SupervisorMessage, recv: oneshot::Receiver<Response>) -> Response {
        if let Err(e) = self.sender.send(msg).await {
            error!("Supervisor unavailable: {}", e);
            return composer::technical_difficulty();
        }
        match timeout(self.request_timeout, recv).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!("Supervisor dropped the request: {}", e);
                composer::technical_difficulty()
            }
            Err(_) => {
                error!("Request timed out after {:?}", self.request_timeout);
                composer::technical_difficulty()
            }
        }
    }
}

// --- Actor Runner ---
struct SupervisorRunner<S>
where
    S: ConversationStore + AssessmentLog,
{
    receiver: mpsc::Receiver<SupervisorMessage>,
    controller: Arc<ConversationController<S>>,
}

impl<S> SupervisorRunner<S>
where
    S: ConversationStore + AssessmentLog,
{
    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, SupervisorMessage::Shutdown) {
                info!("Supervisor shutting down...");
                break;
            }
            self.handle_message(msg);
        }
        info!("Supervisor stopped");
    }

    fn handle_message(&self, msg: SupervisorMessage) {
        let controller = Arc::clone(&self.controller);
        match msg {
            SupervisorMessage::ProcessUserMessage { inbound, responder } => {
                tokio::spawn(async move {
                    let response = controller.handle_inbound(&inbound).await;
                    let _ = responder.send(response);
                });
            }
            SupervisorMessage::RunAction {
                user_id,
                action,
                responder,
            } => {
                tokio::spawn(async move {
                    let response = controller.handle_action(&user_id, action).await;
                    let _ = responder.send(response);
                });
            }
            SupervisorMessage::Shutdown => {}
        }
    }
}
