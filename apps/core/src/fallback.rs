use crate::actors::messages::AppError;
use crate::actors::traits::OpenEndedResponder;
use crate::brain::TopicClassifier;
use crate::composer;
use crate::models::ResponderContext;
use async_trait::async_trait;
use tracing::debug;

/// Local responder built from topic templates. Never fails and never blocks, so
/// the controller can always fall back to it.
#[derive(Debug, Clone, Default)]
pub struct TemplateResponder {
    topics: TopicClassifier,
}

impl TemplateResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous form used on the fallback path.
    pub fn reply(&self, text: &str, context: &ResponderContext) -> String {
        let topic = self.topics.classify(text);
        debug!(user_id = %context.user_id, %topic, "Template reply");
        composer::supportive_reply(topic, &context.display_name)
    }
}

#[async_trait]
impl OpenEndedResponder for TemplateResponder {
    async fn generate(&self, text: String, context: ResponderContext) -> Result<String, AppError> {
        Ok(self.reply(&text, &context))
    }
}
