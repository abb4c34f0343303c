//! HTTP client for the weather host.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{Area, OverviewForecast};

pub const BASE_URI: &str = "http://www.jma.go.jp/";

#[derive(Debug, Error)]
pub enum JmaError {
    /// Transport-level failure (DNS, connect, read, ...).
    #[error("network access failed: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read access to the weather host's documents; the seam that lets the
/// command layer run against canned data in tests.
#[async_trait]
pub trait ForecastApi: Send + Sync {
    async fn area(&self) -> Result<Area, JmaError>;

    async fn overview_forecast(&self, path_code: &str) -> Result<OverviewForecast, JmaError>;
}

pub struct JmaClient {
    http: reqwest::Client,
    base_uri: String,
}

impl JmaClient {
    pub fn new() -> Self {
        Self::with_base_uri(BASE_URI)
    }

    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_uri: base_uri.into(),
        }
    }

    /// The host serves some documents (like forecasts for retired area
    /// codes) with status 404 and a JSON body, so 404 parses like 200.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, JmaError> {
        let response = self.http.get(url).send().await.map_err(|err| {
            tracing::warn!(url, error = %err, "request failed");
            JmaError::Transport(err.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| JmaError::Transport(err.to_string()))?;

        match status {
            200 | 404 => Ok(serde_json::from_str(&body)?),
            _ => {
                tracing::warn!(url, status, "weather host error");
                Err(JmaError::Status { status, body })
            }
        }
    }
}

impl Default for JmaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastApi for JmaClient {
    async fn area(&self) -> Result<Area, JmaError> {
        let url = format!("{}bosai/common/const/area.json", self.base_uri);
        self.fetch_json(&url).await
    }

    async fn overview_forecast(&self, path_code: &str) -> Result<OverviewForecast, JmaError> {
        let url = format!(
            "{}bosai/forecast/data/overview_forecast/{path_code}.json",
            self.base_uri
        );
        self.fetch_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Answers exactly one request on an ephemeral port, whatever the path.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request);
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/")
    }

    const FORECAST_BODY: &str = concat!(
        r#"{"publishingOffice":"気象庁","reportDatetime":"2021-08-01T10:37:00+09:00","#,
        r#""targetArea":"東京都","headlineText":"","text":"晴れています。"}"#
    );

    #[tokio::test]
    async fn ok_body_parses_as_the_document() {
        let client = JmaClient::with_base_uri(serve_once("200 OK", FORECAST_BODY));
        let forecast = client.overview_forecast("130000").await.unwrap();
        assert_eq!(forecast.target_area, "東京都");
    }

    #[tokio::test]
    async fn not_found_with_a_json_body_parses_like_ok() {
        let client = JmaClient::with_base_uri(serve_once("404 Not Found", FORECAST_BODY));
        let forecast = client.overview_forecast("999999").await.unwrap();
        assert_eq!(forecast.publishing_office, "気象庁");
    }

    #[tokio::test]
    async fn other_statuses_carry_code_and_body() {
        let client =
            JmaClient::with_base_uri(serve_once("503 Service Unavailable", "maintenance"));
        let err = client.overview_forecast("130000").await.unwrap_err();
        match err {
            JmaError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let client = JmaClient::with_base_uri(serve_once("200 OK", "<html>moved</html>"));
        let err = client.area().await.unwrap_err();
        assert!(matches!(err, JmaError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // bind then drop: a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = JmaClient::with_base_uri(format!("http://{addr}/"));
        let err = client.area().await.unwrap_err();
        assert!(matches!(err, JmaError::Transport(_)));
    }
}
