//! HTTP client for the random joke endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use tracing::{debug, warn};

use crate::models::Joke;

use super::source::{fetch_batch_from, BatchOutcome, JokeSource};
use super::ApiError;

/// Default endpoint serving one random joke per GET.
pub const DEFAULT_API_URL: &str = "https://official-joke-api.appspot.com/random_joke";

/// API client for the joke endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    /// Create a client for `url`. No timeout is applied unless one is given.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host and port the endpoint lives on, for reachability probing.
    pub fn probe_target(&self) -> Option<(String, u16)> {
        let url = Url::parse(&self.url).ok()?;
        let host = url.host_str()?.to_string();
        let port = url.port_or_known_default()?;
        Some((host, port))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Fetch `count` jokes sequentially.
    pub async fn fetch_batch(&self, count: usize) -> BatchOutcome {
        fetch_batch_from(self, count).await
    }
}

#[async_trait]
impl JokeSource for ApiClient {
    async fn fetch_joke(&self) -> Result<Joke, ApiError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let joke: Joke = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Joke response did not match expected shape");
            ApiError::InvalidResponse(e.to_string())
        })?;

        debug!(setup = %joke.setup, "Joke fetched");
        Ok(joke)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `responses.len()` HTTP requests with canned status/body pairs.
    async fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                loop {
                    let n = socket.read(&mut buf[read..]).await.unwrap();
                    read += n;
                    if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        format!("http://{}/random_joke", addr)
    }

    #[tokio::test]
    async fn test_fetch_joke_parses_body() {
        let url = serve(vec![(
            200,
            r#"{"type":"general","setup":"Why did the chicken cross the road?","punchline":"To get to the other side.","id":1}"#,
        )])
        .await;

        let client = ApiClient::new(url, None).unwrap();
        let joke = client.fetch_joke().await.unwrap();
        assert_eq!(joke.setup, "Why did the chicken cross the road?");
        assert_eq!(joke.punchline, "To get to the other side.");
    }

    #[tokio::test]
    async fn test_fetch_joke_maps_server_error() {
        let url = serve(vec![(503, "down for maintenance")]).await;

        let client = ApiClient::new(url, None).unwrap();
        let err = client.fetch_joke().await.unwrap_err();
        assert!(matches!(err, ApiError::ServerError(body) if body == "down for maintenance"));
    }

    #[tokio::test]
    async fn test_fetch_joke_rejects_unexpected_shape() {
        let url = serve(vec![(200, r#"{"joke":"no setup here"}"#)]).await;

        let client = ApiClient::new(url, None).unwrap();
        let err = client.fetch_joke().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_joke_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(format!("http://{}/random_joke", addr), None).unwrap();
        let err = client.fetch_joke().await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_fetch_batch_stops_at_first_failure() {
        let url = serve(vec![
            (200, r#"{"setup":"a","punchline":"1"}"#),
            (200, r#"{"setup":"b","punchline":"2"}"#),
            (500, "boom"),
        ])
        .await;

        let client = ApiClient::new(url, None).unwrap();
        let outcome = client.fetch_batch(10).await;
        assert!(!outcome.is_complete());
        assert_eq!(outcome.jokes.len(), 2);
        assert_eq!(outcome.jokes[1].setup, "b");
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_probe_target_uses_default_port() {
        let client = ApiClient::new(DEFAULT_API_URL, None).unwrap();
        assert_eq!(
            client.probe_target(),
            Some(("official-joke-api.appspot.com".to_string(), 443))
        );

        let local = ApiClient::new("http://127.0.0.1:8080/joke", None).unwrap();
        assert_eq!(local.probe_target(), Some(("127.0.0.1".to_string(), 8080)));

        let bogus = ApiClient::new("not a url", None).unwrap();
        assert_eq!(bogus.probe_target(), None);
    }
}
