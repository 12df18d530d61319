use std::env;
use std::time::Duration;

use futures::Stream;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::ndjson::process_ndjson;
use crate::types::{ChatChunk, ChatRequest};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434/";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for an Ollama-compatible chat endpoint.
///
/// Only the connect phase carries a deadline; a streaming generation may
/// legitimately run for minutes, so there is no whole-request timeout.
#[derive(Debug, Clone)]
pub struct Ollama {
    client: ReqwestClient,
    base_url: String,
}

impl Ollama {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the CONFAB_URL
    /// environment variable, falling back to the local default.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let mut base_url = match base_url {
            Some(url) => url,
            None => env::var("CONFAB_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        // Validate up front so a typo fails at startup, not mid-conversation.
        Url::parse(&base_url)?;

        let client = ReqwestClient::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self { client, base_url })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_url(&self) -> String {
        format!("{}api/chat", self.base_url)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/x-ndjson"),
        );
        headers
    }

    /// Process API response errors and convert to our Error type.
    ///
    /// The endpoint reports errors as `{"error": "..."}`; anything else is
    /// surfaced as the raw body alongside the status code.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|parsed| parsed.error)
            .unwrap_or(error_body);

        Error::api(status_code, message)
    }

    /// Send a chat request and get a streaming response.
    ///
    /// Returns a stream of ChatChunk frames that can be processed
    /// incrementally. Dropping the stream closes the connection.
    pub async fn stream(
        &self,
        mut params: ChatRequest,
    ) -> Result<impl Stream<Item = Result<ChatChunk>> + use<>> {
        params.stream = true;

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.default_headers())
            .json(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(format!("Request timed out: {}", e))
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        Ok(process_ndjson(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = Ollama::new(Some("http://127.0.0.1:11434".to_string())).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:11434/");
        assert_eq!(client.chat_url(), "http://127.0.0.1:11434/api/chat");
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = Ollama::new(Some("not a url".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }
}
