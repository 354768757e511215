// Triage console entry point
// Reads one user's messages from stdin and prints the bot's replies.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use triage_core::actors::responder::ResponderActorHandle;
use triage_core::actors::supervisor::SupervisorHandle;
use triage_core::brain::{Lexicon, RiskClassifier};
use triage_core::config::{AppConfig, LogFormat};
use triage_core::controller::{ControllerSettings, ConversationController};
use triage_core::database::{self, SqliteStore};
use triage_core::models::{ActionId, InboundMessage, Response};

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            let formatting_layer =
                BunyanFormattingLayer::new("triage-core".to_string(), std::io::stderr);
            Registry::default()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(formatting_layer)
                .init();
        }
    }
}

fn print_response(response: &Response) {
    println!("\n{}\n", response.text);
    for action in &response.suggested_actions {
        println!("  [#{}] {}", action.action_id.as_str(), action.label);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);
    info!("Triage engine starting");

    let lexicon = Lexicon::load(config.lexicon_path.as_deref()).context("failed to load lexicon")?;
    let pool = database::init_db(&config.database_url, config.db_max_connections)
        .await
        .context("failed to initialize database")?;
    let store = Arc::new(SqliteStore::new(pool));

    let settings = ControllerSettings {
        storage_timeout: config.storage_timeout(),
        responder_timeout: config.responder.timeout(),
        ..Default::default()
    };
    let mut controller = ConversationController::new(store, RiskClassifier::new(lexicon))
        .with_settings(settings);

    if config.responder.enabled {
        match ResponderActorHandle::connect(&config.responder).await {
            Ok(handle) => {
                info!("Using provider responder at {}", config.responder.url);
                controller = controller.with_responder(Arc::new(handle));
            }
            Err(e) => warn!("Provider responder disabled, using templates: {}", e),
        }
    }

    // Worst case: every storage call of one request times out, plus the responder.
    let request_timeout = config.storage_timeout() * 8 + config.responder.timeout();
    let supervisor = SupervisorHandle::new(Arc::new(controller), request_timeout);

    let user_id = config.console_user.clone();
    let display_name = std::env::var("USER").ok();
    println!("Type a message, /help for commands, #action_id to press a button. Ctrl-D quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match line.strip_prefix('#') {
            Some(raw) => match raw.parse::<ActionId>() {
                Ok(action) => supervisor.run_action(user_id.clone(), action).await,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            None => {
                let mut inbound = InboundMessage::new(user_id.clone(), line);
                if let Some(name) = &display_name {
                    inbound = inbound.with_display_name(name.clone());
                }
                supervisor.process_message(inbound).await
            }
        };
        print_response(&response);
    }

    supervisor.shutdown().await?;
    // Let in-flight tasks flush their writes
    tokio::time::sleep(Duration::from_millis(100)).await;
    info!("Triage engine stopped");
    Ok(())
}
