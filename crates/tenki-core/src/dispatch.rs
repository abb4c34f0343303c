//! Slash-command dispatch: token verification, replay suppression and
//! listener routing for inbound chat commands.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::CacheStore;

/// Replays of the same one-time token inside this window are rejected.
const HANDLED_TTL_SECONDS: u64 = 60;

/// One inbound slash command, as delivered by the chat platform.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    pub token: String,
    pub command: String,
    pub text: String,
    /// One-time delivery token; used to suppress platform redeliveries.
    pub trigger_id: String,
    #[serde(default)]
    pub user_id: String,
}

/// Where the reply is rendered: to everyone or only to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("verification token mismatch")]
    InvalidToken,

    /// The platform redelivered a command that was already handled.
    #[error("duplicate delivery for trigger_id={0}")]
    DuplicateCommand(String),

    #[error("no listener for command={0}")]
    UnknownCommand(String),

    #[error("{0}")]
    Listener(String),
}

/// A listener bound to one command string.
#[async_trait]
pub trait CommandListener: Send + Sync {
    async fn on_command(&self, command: &SlashCommand) -> Result<CommandResponse, DispatchError>;
}

/// Routes verified, first-time deliveries to their listener.
///
/// De-duplication rides on the same cache store the broker uses: the first
/// sighting of a one-time token records it with a short TTL, a second
/// sighting inside the window bounces as [`DispatchError::DuplicateCommand`]
/// so the entrypoint can answer the redelivery with an empty body.
pub struct CommandDispatcher {
    verification_token: String,
    listeners: HashMap<String, Arc<dyn CommandListener>>,
    cache: Arc<dyn CacheStore>,
}

impl CommandDispatcher {
    pub fn new(verification_token: impl Into<String>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            verification_token: verification_token.into(),
            listeners: HashMap::new(),
            cache,
        }
    }

    pub fn add_listener(&mut self, command: impl Into<String>, listener: Arc<dyn CommandListener>) {
        self.listeners.insert(command.into(), listener);
    }

    pub async fn handle(&self, command: &SlashCommand) -> Result<CommandResponse, DispatchError> {
        if command.token != self.verification_token {
            return Err(DispatchError::InvalidToken);
        }
        if self.already_handled(&command.trigger_id).await {
            tracing::warn!(
                trigger_id = %command.trigger_id,
                command = %command.command,
                "slash command duplicate called"
            );
            return Err(DispatchError::DuplicateCommand(command.trigger_id.clone()));
        }

        let listener = self
            .listeners
            .get(&command.command)
            .ok_or_else(|| DispatchError::UnknownCommand(command.command.clone()))?;

        listener.on_command(command).await
    }

    async fn already_handled(&self, one_time_token: &str) -> bool {
        let key = format!("command_dispatch#{one_time_token}");
        if self.cache.get(&key).await.is_some() {
            return true;
        }
        self.cache
            .put(&key, "handled".to_string(), Some(HANDLED_TTL_SECONDS))
            .await;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryCache, ManualClock};
    use chrono::Utc;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl CommandListener for Echo {
        async fn on_command(
            &self,
            command: &SlashCommand,
        ) -> Result<CommandResponse, DispatchError> {
            Ok(CommandResponse::in_channel(command.text.clone()))
        }
    }

    fn command(trigger_id: &str) -> SlashCommand {
        SlashCommand {
            token: "secret".to_string(),
            command: "/jma".to_string(),
            text: "tenki tokyo".to_string(),
            trigger_id: trigger_id.to_string(),
            user_id: "U1".to_string(),
        }
    }

    fn dispatcher() -> (Arc<ManualClock>, CommandDispatcher) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(InMemoryCache::new(clock.clone()));
        let mut dispatcher = CommandDispatcher::new("secret", cache);
        dispatcher.add_listener("/jma", Arc::new(Echo));
        (clock, dispatcher)
    }

    #[tokio::test]
    async fn routes_to_the_registered_listener() {
        let (_clock, dispatcher) = dispatcher();
        let response = dispatcher.handle(&command("t1")).await.unwrap();
        assert_eq!(response.response_type, ResponseType::InChannel);
        assert_eq!(response.text, "tenki tokyo");
    }

    #[tokio::test]
    async fn rejects_a_bad_verification_token() {
        let (_clock, dispatcher) = dispatcher();
        let mut cmd = command("t1");
        cmd.token = "wrong".to_string();
        assert!(matches!(
            dispatcher.handle(&cmd).await,
            Err(DispatchError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn second_delivery_of_the_same_token_is_a_duplicate() {
        let (_clock, dispatcher) = dispatcher();
        dispatcher.handle(&command("t1")).await.unwrap();
        assert!(matches!(
            dispatcher.handle(&command("t1")).await,
            Err(DispatchError::DuplicateCommand(id)) if id == "t1"
        ));
        // a different token goes through
        dispatcher.handle(&command("t2")).await.unwrap();
    }

    #[tokio::test]
    async fn dedup_window_expires_with_the_cache_entry() {
        let (clock, dispatcher) = dispatcher();
        dispatcher.handle(&command("t1")).await.unwrap();

        clock.advance(Duration::from_secs(HANDLED_TTL_SECONDS + 1));
        dispatcher.handle(&command("t1")).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_command_is_an_error() {
        let (_clock, dispatcher) = dispatcher();
        let mut cmd = command("t1");
        cmd.command = "/unknown".to_string();
        assert!(matches!(
            dispatcher.handle(&cmd).await,
            Err(DispatchError::UnknownCommand(_))
        ));
    }
}
