//! Bot command surface: the weather listener and the deferred-logging job.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use tenki_core::BrokerError;
use tenki_core::dispatch::{CommandListener, CommandResponse, DispatchError, SlashCommand};
use tenki_core::jma::ForecastApi;
use tenki_core::registry::JobHandler;

pub const COMMAND: &str = "/jma";
pub const ASYNC_LOGGING: &str = "async_logging";

fn usage_response() -> CommandResponse {
    CommandResponse::ephemeral(format!(
        "*Usage*\n* {COMMAND} [tenki|ame|bousai] place\n* {COMMAND} help"
    ))
}

/// Resolves a place against the area hierarchy and replies with the
/// overview forecast for its forecast office.
pub struct WeatherCommand {
    api: Arc<dyn ForecastApi>,
}

impl WeatherCommand {
    pub fn new(api: Arc<dyn ForecastApi>) -> Self {
        Self { api }
    }

    async fn forecast_response(&self, place: &str) -> Result<CommandResponse, DispatchError> {
        let area = self
            .api
            .area()
            .await
            .map_err(|err| DispatchError::Listener(err.to_string()))?;

        let Some(path_code) = area.find_path_code(place) else {
            return Ok(CommandResponse::ephemeral(format!(
                "Not found place. `{place}`."
            )));
        };

        let forecast = self
            .api
            .overview_forecast(&path_code)
            .await
            .map_err(|err| DispatchError::Listener(err.to_string()))?;

        Ok(CommandResponse::in_channel(forecast.text))
    }
}

#[async_trait]
impl CommandListener for WeatherCommand {
    async fn on_command(&self, command: &SlashCommand) -> Result<CommandResponse, DispatchError> {
        let mut params = command.text.split_whitespace();
        let (Some(subcommand), Some(place)) = (params.next(), params.next()) else {
            return Ok(usage_response());
        };

        match subcommand {
            "tenki" => self.forecast_response(place).await,
            // "ame" and "bousai" are reserved subcommands; usage for now
            _ => Ok(usage_response()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LogPayload {
    message: String,
    #[serde(default)]
    stack: String,
}

/// Deferred logging job: the entrypoint's error path enqueues here so
/// diagnostics stay off the request's critical path.
pub struct AsyncLogging;

#[async_trait]
impl JobHandler for AsyncLogging {
    async fn run(&self, payload: serde_json::Value) -> Result<(), BrokerError> {
        let log: LogPayload = serde_json::from_value(payload)?;
        tracing::info!(message = %log.message, stack = %log.stack, "deferred log");
        Ok(())
    }
}
