use super::html_tables::parse_tables;
use crate::app::ports::PageSource;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::types::RawTable;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches server-rendered pages over HTTP and reads their tables.
///
/// The whole request, body included, must finish within the ready timeout.
/// After that the source waits `settle` before parsing, the way a browser
/// run would give late table scripts a moment.
pub struct HttpPageSource {
    client: reqwest::Client,
    settle: Duration,
}

impl HttpPageSource {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::navigation(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.settle()))
    }

    pub fn with_client(client: reqwest::Client, settle: Duration) -> Self {
        Self { client, settle }
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::navigation(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::navigation(format!("{url} responded with status {}", status.as_u16())));
        }
        resp.text().await.map_err(|e| FetchError::navigation(e.to_string()))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str, ready_timeout: Duration) -> Result<Vec<RawTable>, FetchError> {
        info!("Loading webpage: {}", url);
        let body = tokio::time::timeout(ready_timeout, self.get_body(url))
            .await
            .map_err(|_| {
                FetchError::timeout(format!("{url} not ready after {}s", ready_timeout.as_secs_f64()))
            })??;
        debug!("Page loaded, body_len={}", body.len());

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(parse_tables(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn source() -> HttpPageSource {
        // keep loopback requests away from any proxy set in the environment
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpPageSource::with_client(client, Duration::ZERO)
    }

    /// Serves one canned HTTP response, optionally after a delay.
    async fn serve_once(response: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/rates", addr)
    }

    #[tokio::test]
    async fn parses_tables_from_response_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 64\r\nConnection: close\r\n\r\n<table><tr><td>Gold 1g</td><td>250</td><td>255</td></tr></table>",
            Duration::ZERO,
        )
        .await;
        let tables = source().fetch(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["Gold 1g", "250", "255"]);
    }

    #[tokio::test]
    async fn slow_page_times_out() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n", Duration::from_secs(5)).await;
        let err = source().fetch(&url, Duration::from_millis(100)).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Timeout);
    }

    #[tokio::test]
    async fn error_status_is_a_navigation_failure() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            Duration::ZERO,
        )
        .await;
        let err = source().fetch(&url, Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::NavigationFailed);
    }
}
