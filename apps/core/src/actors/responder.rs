use crate::actors::messages::{ActorError, AppError, ResponderMessage};
use crate::actors::traits::OpenEndedResponder;
use crate::config::ResponderConfig;
use crate::models::ResponderContext;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a supportive mental health companion for young people. \
Reply warmly and briefly, validate feelings, and suggest one practical coping step. \
Do not diagnose. Encourage professional support when appropriate.";

const HEALTH_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// A handle to the provider-backed responder actor.
///
/// Cloneable; every clone talks to the same runner task, which owns the HTTP
/// client.
#[derive(Clone)]
pub struct ResponderActorHandle {
    sender: mpsc::Sender<ResponderMessage>,
    request_timeout: Duration,
}

impl ResponderActorHandle {
    /// Spawns the runner without probing the server.
    pub fn new(config: &ResponderConfig) -> Result<Self, AppError> {
        let (sender, receiver) = mpsc::channel(32);
        let actor = ResponderActorRunner::new(receiver, config)?;
        tokio::spawn(async move { actor.run().await });
        Ok(Self {
            sender,
            request_timeout: config.timeout(),
        })
    }

    /// Probes `{url}/health` and spawns the runner once the server answers.
    ///
    /// Fails after `health_retries` unsuccessful probes, in which case the caller
    /// runs without a provider.
    pub async fn connect(config: &ResponderConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let health_endpoint = format!("{}/health", config.url.trim_end_matches('/'));

        for attempt in 1..=config.health_retries {
            match client.get(&health_endpoint).send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Responder provider is ready after {} attempts", attempt);
                    return Self::new(config);
                }
                Ok(response) => {
                    info!("Provider responded with status {} on attempt {}", response.status(), attempt);
                }
                Err(e) => {
                    info!("Health check attempt {} failed: {}", attempt, e);
                }
            }
            if attempt < config.health_retries {
                tokio::time::sleep(HEALTH_RETRY_INTERVAL).await;
            }
        }

        Err(AppError::Actor(ActorError::Responder(format!(
            "provider at {} failed to become ready after {} attempts",
            config.url, config.health_retries
        ))))
    }
}

#[async_trait]
impl OpenEndedResponder for ResponderActorHandle {
    async fn generate(&self, text: String, context: ResponderContext) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = ResponderMessage::Generate {
            text,
            context,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        // The runner applies the request timeout; allow it to report first.
        timeout(self.request_timeout + Duration::from_secs(1), recv)
            .await?
            .map_err(|e| ActorError::Internal(e.to_string()))?
    }
}

// --- Actor Runner (Internal Logic) ---
struct ResponderActorRunner {
    receiver: mpsc::Receiver<ResponderMessage>,
    completion: Arc<CompletionClient>,
}

impl ResponderActorRunner {
    fn new(receiver: mpsc::Receiver<ResponderMessage>, config: &ResponderConfig) -> Result<Self, AppError> {
        Ok(Self {
            receiver,
            completion: Arc::new(CompletionClient::new(config)?),
        })
    }

    async fn run(mut self) {
        info!("ResponderActor started");
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }
        info!("ResponderActor stopped");
    }

    /// Completions run concurrently, one task per request.
    fn handle_message(&self, msg: ResponderMessage) {
        match msg {
            ResponderMessage::Generate {
                text,
                context,
                responder,
            } => {
                let completion = Arc::clone(&self.completion);
                tokio::spawn(async move {
                    let result = completion.generate(&text, &context).await;
                    if let Err(e) = &result {
                        warn!(user_id = %context.user_id, "Provider completion failed: {}", e);
                    }
                    let _ = responder.send(result);
                });
            }
        }
    }
}

/// Provider endpoint plus request settings, shared by all in-flight requests.
struct CompletionClient {
    client: Client,
    server_url: String,
    headers: HeaderMap,
    temperature: f32,
    max_tokens: u32,
    request_timeout: Duration,
}

impl CompletionClient {
    fn new(config: &ResponderConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::Config(format!("invalid responder token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            client: Client::new(),
            server_url: config.url.trim_end_matches('/').to_string(),
            headers,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout: config.timeout(),
        })
    }

    async fn generate(
        &self,
        text: &str,
        context: &ResponderContext,
    ) -> Result<String, AppError> {
        let prompt = build_prompt(text, context);
        debug!("Provider prompt: {}", prompt);

        let payload = serde_json::json!({
            "prompt": prompt,
            "stream": false,
            "n_predict": self.max_tokens,
            "temperature": self.temperature,
        });

        let request_future = self
            .client
            .post(format!("{}/completion", self.server_url))
            .headers(self.headers.clone())
            .json(&payload)
            .send();

        let res = timeout(self.request_timeout, request_future).await??;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ActorError::Responder(format!(
                "Completion request failed with status {}: {}",
                status, body
            ))
            .into());
        }

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| ActorError::Responder(e.to_string()))?;

        let content = json["content"].as_str().unwrap_or("").trim();
        if content.is_empty() {
            return Err(ActorError::Responder("Completion returned no content".to_string()).into());
        }
        Ok(content.to_string())
    }
}

/// Builds the completion prompt from the message and what we know about the user.
fn build_prompt(text: &str, context: &ResponderContext) -> String {
    let mut prompt = format!("{}\n\nUser name: {}\n", SYSTEM_PROMPT, context.display_name);
    if let Some(level) = context.last_risk_level {
        prompt.push_str(&format!("Last recorded risk level: {}\n", level));
    }
    if !context.recent_assessments.is_empty() {
        prompt.push_str(&format!(
            "Recent screenings: {}\n",
            context.recent_assessments.join("; ")
        ));
    }
    prompt.push_str(&format!("\nUser: {}\nAssistant:", text));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::RiskLevel;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: String) -> ResponderConfig {
        ResponderConfig {
            enabled: true,
            url,
            token: Some("secret".to_string()),
            timeout_secs: 1,
            health_retries: 2,
            ..Default::default()
        }
    }

    fn context() -> ResponderContext {
        ResponderContext {
            user_id: "u1".to_string(),
            display_name: "Sam".to_string(),
            last_risk_level: Some(RiskLevel::Moderate),
            recent_assessments: vec!["PHQ-9: 12 (Moderate)".to_string()],
        }
    }

    #[test]
    fn test_prompt_carries_context() {
        let prompt = build_prompt("hello", &context());
        assert!(prompt.contains("User name: Sam"));
        assert!(prompt.contains("moderate"));
        assert!(prompt.contains("PHQ-9: 12 (Moderate)"));
        assert!(prompt.ends_with("User: hello\nAssistant:"));
    }

    #[tokio::test]
    async fn test_generate_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"stream": false, "n_predict": 300})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": "  That sounds hard. Want to talk about it?  ",
                "stop": true
            })))
            .mount(&mock_server)
            .await;
        let handle = ResponderActorHandle::new(&test_config(mock_server.uri())).unwrap();

        // 2. Act
        let result = handle.generate("I feel off".to_string(), context()).await;

        // 3. Assert
        assert_eq!(result.unwrap(), "That sounds hard. Want to talk about it?");
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;
        let handle = ResponderActorHandle::new(&test_config(mock_server.uri())).unwrap();

        let result = handle.generate("hi".to_string(), context()).await;

        match result {
            Err(AppError::Actor(ActorError::Responder(msg))) => {
                assert!(msg.contains("status 500"));
                assert!(msg.contains("Internal Server Error"));
            }
            other => panic!("expected responder error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_empty_content_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": ""})))
            .mount(&mock_server)
            .await;
        let handle = ResponderActorHandle::new(&test_config(mock_server.uri())).unwrap();

        assert!(handle.generate("hi".to_string(), context()).await.is_err());
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": "late"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;
        let handle = ResponderActorHandle::new(&test_config(mock_server.uri())).unwrap();

        let result = handle.generate("hi".to_string(), context()).await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_concurrent_requests_overlap() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": "hang in there"}))
                    .set_delay(Duration::from_millis(600)),
            )
            .expect(3)
            .mount(&mock_server)
            .await;
        let handle = ResponderActorHandle::new(&test_config(mock_server.uri())).unwrap();

        let start = std::time::Instant::now();
        let (a, b, c) = tokio::join!(
            handle.generate("one".to_string(), context()),
            handle.generate("two".to_string(), context()),
            handle.generate("three".to_string(), context()),
        );
        let elapsed = start.elapsed();

        for result in [a, b, c] {
            assert_eq!(result.unwrap(), "hang in there");
        }
        // One after another would take at least 1.8s
        assert!(elapsed < Duration::from_millis(1500), "requests were serialized: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_connect_probes_health() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert!(ResponderActorHandle::connect(&test_config(mock_server.uri()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_connect_gives_up() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&mock_server)
            .await;

        let result = ResponderActorHandle::connect(&test_config(mock_server.uri())).await;
        assert!(matches!(result, Err(AppError::Actor(ActorError::Responder(_)))));
    }
}
