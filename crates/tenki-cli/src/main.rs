mod commands;

use std::sync::Arc;
use std::time::Duration;

use commands::{ASYNC_LOGGING, AsyncLogging, COMMAND, WeatherCommand};
use tenki_core::broker::{BrokerConfig, JobBroker};
use tenki_core::dispatch::{CommandDispatcher, DispatchError, SlashCommand};
use tenki_core::domain::HandlerName;
use tenki_core::impls::{InMemoryCache, InMemoryLock, InMemoryTriggerScheduler};
use tenki_core::jma::JmaClient;
use tenki_core::ports::{SystemClock, TriggerScheduler};
use tenki_core::registry::HandlerRegistry;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // (A) host primitives, shared by broker and dispatcher
    let clock = Arc::new(SystemClock);
    let cache = Arc::new(InMemoryCache::new(clock.clone()));
    let triggers = Arc::new(InMemoryTriggerScheduler::new(clock.clone()));
    let lock = Arc::new(InMemoryLock::new());

    // (B) job handlers the trigger scheduler may re-invoke by name
    let mut registry = HandlerRegistry::new();
    registry
        .register(HandlerName::new(ASYNC_LOGGING), Arc::new(AsyncLogging))
        .expect("fresh registry");

    let config = BrokerConfig::default();
    let broker = JobBroker::new(
        Arc::new(registry),
        cache.clone(),
        triggers.clone(),
        lock,
        clock.clone(),
        config.clone(),
    );

    // (C) command surface
    let verification_token = std::env::var("VERIFICATION_TOKEN").unwrap_or_default();
    let mut dispatcher = CommandDispatcher::new(verification_token.clone(), cache.clone());
    dispatcher.add_listener(
        COMMAND,
        Arc::new(WeatherCommand::new(Arc::new(JmaClient::new()))),
    );

    // (D) treat argv as the slash-command text, e.g. `tenki-cli tenki 東京`
    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let command = SlashCommand {
        token: verification_token,
        command: COMMAND.to_string(),
        text,
        trigger_id: format!("cli-{}", std::process::id()),
        user_id: "cli".to_string(),
    };

    match dispatcher.handle(&command).await {
        Ok(response) => println!("{}", response.text),
        // a redelivered one-time token answers with an empty body
        Err(DispatchError::DuplicateCommand(_)) => {}
        Err(err) => {
            let deferred = broker
                .enqueue(
                    &HandlerName::new(ASYNC_LOGGING),
                    &serde_json::json!({ "message": err.to_string() }),
                )
                .await;
            if let Err(enqueue_err) = deferred {
                tracing::error!(error = %enqueue_err, "could not defer error logging");
            }
            eprintln!("{err}");
        }
    }

    run_trigger_pump(&broker, &triggers, &config).await;
}

/// Stand-in for the host scheduler: re-invokes the consumer for every due
/// trigger, then keeps sweeping until the trigger table drains.
async fn run_trigger_pump(
    broker: &JobBroker,
    triggers: &InMemoryTriggerScheduler,
    config: &BrokerConfig,
) {
    tokio::time::sleep(config.enqueue_delay).await;

    for _ in 0..20 {
        for handle in triggers.take_due().await {
            if let Err(err) = broker.consume_job(&handle.handler).await {
                tracing::error!(handler = %handle.handler, error = %err, "consume failed");
            }
        }

        let remaining = triggers.list_clock_triggers().await;
        if remaining.is_empty() {
            break;
        }
        // one more pass per leftover handler lets the dequeue sweep clean
        // up triggers whose jobs already finished
        for handle in remaining {
            let _ = broker.consume_job(&handle.handler).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
