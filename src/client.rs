use std::env;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::{StreamFrame, process_sse};
use crate::types::ChatRequest;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const BASE_URL_ENV: &str = "FINCHAT_BACKEND_URL";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the financial-assistant backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: ReqwestClient,
    base_url: String,
    connect_timeout: Duration,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// The base URL can be provided directly, read from the
    /// FINCHAT_BACKEND_URL environment variable, or defaulted to localhost.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// The timeout applies to connection establishment only; response bodies
    /// are open-ended streams and must not be subject to a total deadline.
    pub fn with_options(base_url: Option<String>, connect_timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| Error::url(format!("Invalid backend URL '{base_url}': {e}"), Some(e)))?;

        let connect_timeout = connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            connect_timeout,
        })
    }

    /// Returns the resolved backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create and return default headers for backend requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        headers
    }

    /// Process backend response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        // FastAPI-style error bodies carry the message under "detail".
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or(error_body);

        Error::api(status_code, message)
    }

    /// Send a chat message and get back the backend's event stream.
    ///
    /// Returns a stream of [`StreamFrame`] values decoded incrementally from
    /// the response body.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamFrame>> + Send>>> {
        let url = format!("{}/chat", self.base_url);
        let body = ChatRequest::new(session_id, message);

        CLIENT_REQUESTS.click();
        let response = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        Some(self.connect_timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let stream = response.bytes_stream();
        Ok(Box::pin(process_sse(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_with_explicit_url() {
        let client = BackendClient::new(Some("http://backend.example.com:9000/".to_string()))
            .unwrap();
        assert_eq!(client.base_url(), "http://backend.example.com:9000");
        assert_eq!(client.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn client_with_custom_timeout() {
        let client = BackendClient::with_options(
            Some("http://localhost:8000".to_string()),
            Some(Duration::from_secs(3)),
        )
        .unwrap();
        assert_eq!(client.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn client_rejects_invalid_url() {
        let result = BackendClient::new(Some("not a url".to_string()));
        assert!(result.is_err());
    }
}
