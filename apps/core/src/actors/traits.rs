use crate::actors::messages::AppError;
use crate::models::ResponderContext;
use async_trait::async_trait;

/// Produces an open-ended supportive reply for a message that did not trigger the
/// crisis path.
///
/// Two implementations exist: the provider-backed actor in `actors::responder`
/// and the template-backed `fallback::TemplateResponder`. The controller picks one
/// at construction time and always keeps the template variant as the fallback.
#[async_trait]
pub trait OpenEndedResponder: Send + Sync + 'static {
    /// Generates plain reply text, or fails so the caller can fall back.
    async fn generate(&self, text: String, context: ResponderContext) -> Result<String, AppError>;
}
