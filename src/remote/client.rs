//! HTTP client for the remote quote feed.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{QuoteSource, RemoteError, DEFAULT_ENDPOINT};
use crate::storage::{Quote, FETCHED_CATEGORY};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the quote feed endpoint.
#[derive(Clone)]
pub struct RemoteClient {
    /// HTTP client instance.
    client: Client,
    /// Endpoint used for GET and POST.
    endpoint: String,
}

impl RemoteClient {
    /// Creates a client for the default endpoint.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_ENDPOINT)
    }

    /// Creates a client for a custom endpoint.
    pub fn with_url(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the raw posts from the feed.
    pub async fn fetch_posts(&self) -> Result<Vec<RemotePost>, RemoteError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::ServerError { status, message });
        }

        let posts: Vec<RemotePost> = response.json().await?;
        tracing::debug!("Fetched {} post(s) from {}", posts.len(), self.endpoint);
        Ok(posts)
    }

    /// Sends a newly added quote to the feed.
    ///
    /// The feed's answer never affects local state; callers only log it.
    pub async fn post_quote(&self, quote: &Quote) -> Result<PostReceipt, RemoteError> {
        let payload = NewQuotePayload {
            text: &quote.text,
            author: quote.author_or_unknown(),
            category: &quote.category,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RemoteError::ServerError { status, message });
        }

        // The body is informational only; an unparsable one is not an error.
        let id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("id").and_then(|id| id.as_u64()));

        Ok(PostReceipt { status, id })
    }

    /// Posts `quote` and logs the outcome. Never fails.
    pub async fn notify_new_quote(&self, quote: &Quote) {
        match self.post_quote(quote).await {
            Ok(receipt) => tracing::info!(
                "Posted quote to {} (status {}, id {:?})",
                self.endpoint,
                receipt.status,
                receipt.id
            ),
            Err(e) => tracing::warn!("Failed to post quote to server: {e}"),
        }
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSource for RemoteClient {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, RemoteError> {
        let posts = self.fetch_posts().await?;
        Ok(posts.into_iter().map(RemotePost::into_quote).collect())
    }
}

// ==================== API Types ====================

/// A post as served by the feed. Other fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub title: String,
    pub user_id: u64,
}

impl RemotePost {
    /// Projects the post onto a quote.
    pub fn into_quote(self) -> Quote {
        Quote {
            text: self.title,
            author: Some(format!("User {}", self.user_id)),
            category: FETCHED_CATEGORY.to_string(),
        }
    }
}

/// Request body for posting a quote.
#[derive(Debug, Serialize)]
struct NewQuotePayload<'a> {
    text: &'a str,
    author: &'a str,
    category: &'a str,
}

/// What the feed said about a posted quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub status: u16,
    /// Identifier assigned by the server, when it returned one.
    pub id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one HTTP response on a local port and hands back the
    /// request it received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/posts", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_remote_client_with_url_trims_slash() {
        let client = RemoteClient::with_url("https://example.com/posts/");
        assert_eq!(client.endpoint(), "https://example.com/posts");
    }

    #[test]
    fn test_remote_client_default_endpoint() {
        assert_eq!(RemoteClient::new().endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_remote_post_into_quote() {
        let json = r#"[{"userId": 1, "id": 1, "title": "A", "body": "ignored"},
                       {"userId": 2, "id": 2, "title": "B", "body": "ignored"}]"#;
        let posts: Vec<RemotePost> = serde_json::from_str(json).unwrap();
        let quotes: Vec<Quote> = posts.into_iter().map(RemotePost::into_quote).collect();

        assert_eq!(
            quotes,
            vec![
                Quote::new("A", "User 1", "Fetched"),
                Quote::new("B", "User 2", "Fetched"),
            ]
        );
    }

    #[test]
    fn test_new_quote_payload_serialize() {
        let quote = Quote {
            text: "t".to_string(),
            author: None,
            category: "c".to_string(),
        };
        let payload = NewQuotePayload {
            text: &quote.text,
            author: quote.author_or_unknown(),
            category: &quote.category,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"text":"t","author":"Unknown","category":"c"}"#);
    }

    #[tokio::test]
    async fn test_fetch_quotes_from_local_server() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"userId":1,"id":1,"title":"A"},{"userId":2,"id":2,"title":"B"}]"#,
        )
        .await;

        let quotes = RemoteClient::with_url(&url).fetch_quotes().await.unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1], Quote::new("B", "User 2", "Fetched"));
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /posts"));
    }

    #[tokio::test]
    async fn test_fetch_quotes_server_error() {
        let (url, _server) = serve_once("500 Internal Server Error", "boom").await;

        let err = RemoteClient::with_url(&url).fetch_quotes().await.unwrap_err();

        match err {
            RemoteError::ServerError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected ServerError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_post_quote_sends_json_body() {
        let (url, server) = serve_once("201 Created", r#"{"id":101}"#).await;

        let receipt = RemoteClient::with_url(&url)
            .post_quote(&Quote::new("Hello", "Me", "Greeting"))
            .await
            .unwrap();

        assert_eq!(receipt, PostReceipt { status: 201, id: Some(101) });
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /posts"));
        assert!(request.contains(r#""text":"Hello""#));
        assert!(request.contains(r#""category":"Greeting""#));
    }

    #[tokio::test]
    async fn test_fetch_quotes_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/posts", listener.local_addr().unwrap());
        drop(listener);

        let err = RemoteClient::with_url(&url).fetch_quotes().await.unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
    }
}
