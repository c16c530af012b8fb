use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::StatusSection;

use super::error::{StatusError, StatusResult};
use super::models::{PollOutcome, StreamStatus};

/// Anything that can answer "is something live right now".
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> StatusResult<StreamStatus>;

    /// Fetch and fold any failure into an outcome. Transport failures mean
    /// connectivity is gone; every other failure falls back to pre-recorded
    /// programming.
    async fn poll(&self) -> PollOutcome {
        match self.fetch().await {
            Ok(status) => status.outcome(),
            Err(StatusError::Transport(err)) => PollOutcome::Unreachable(err.to_string()),
            Err(err) => PollOutcome::Degraded(err.to_string()),
        }
    }
}

/// Polls the site's stream-status endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpStatusSource {
    pub fn new(endpoint: &str, timeout: Duration) -> StatusResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| StatusError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(section: &StatusSection) -> StatusResult<Self> {
        Self::new(&section.endpoint, section.request_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> StatusResult<StreamStatus> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StatusError::HttpStatus {
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;
        let status: StreamStatus = serde_json::from_str(&body)?;
        debug!(
            target: "status.http",
            endpoint = %self.endpoint,
            live = status.is_live,
            "status fetched"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/api/stream-status")
    }

    #[tokio::test]
    async fn live_answer_maps_to_feed() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"isLive":true,"source":"youtube","youtubeVideoId":"abc"}"#,
        )
        .await;
        let source = HttpStatusSource::new(&endpoint, Duration::from_secs(2)).unwrap();
        assert_eq!(
            source.poll().await,
            PollOutcome::Live(crate::status::LiveFeed::youtube("abc"))
        );
    }

    #[tokio::test]
    async fn server_error_and_garbage_are_degraded() {
        let endpoint = serve_once("500 Internal Server Error", "{}").await;
        let source = HttpStatusSource::new(&endpoint, Duration::from_secs(2)).unwrap();
        assert!(matches!(source.poll().await, PollOutcome::Degraded(_)));

        let endpoint = serve_once("200 OK", "<html>").await;
        let source = HttpStatusSource::new(&endpoint, Duration::from_secs(2)).unwrap();
        assert!(matches!(source.poll().await, PollOutcome::Degraded(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let source =
            HttpStatusSource::new(&format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
        assert!(matches!(source.poll().await, PollOutcome::Unreachable(_)));
    }

    #[test]
    fn rejects_invalid_endpoint() {
        assert!(matches!(
            HttpStatusSource::new("not a url", Duration::from_secs(1)),
            Err(StatusError::InvalidEndpoint { .. })
        ));
    }
}
