//! HTTP client abstraction and native implementation.
//!
//! The remote TTS fallback only ever issues JSON `POST`s and reads back
//! either audio bytes or a JSON error object, so the trait is narrow.

use std::collections::HashMap;

use async_trait::async_trait;

/// Boxed transport error, as returned by [`HttpClient`].
pub type HttpError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP response with the body fully buffered.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `content-type` header without parameters (`"audio/mpeg"`).
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get("content-type")
            .map(|v| v.split(';').next().unwrap_or(v).trim())
    }

    /// Lossy UTF-8 view of the body, for logging error responses.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Platform-agnostic HTTP client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a `POST` with the given headers and body.
    async fn post(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError>;

    /// Serialize `payload` as JSON and `POST` it.
    async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        payload: &serde_json::Value,
    ) -> Result<HttpResponse, HttpError> {
        let mut headers = headers.clone();
        headers
            .entry("content-type".into())
            .or_insert_with(|| "application/json".into());
        let body = serde_json::to_vec(payload)?;
        self.post(url, &headers, body).await
    }
}

/// Native HTTP client using [`reqwest`].
#[cfg(feature = "native")]
pub struct NativeHttpClient {
    client: reqwest::Client,
}

#[cfg(feature = "native")]
impl NativeHttpClient {
    /// Create a client with a 30-second transport timeout.
    ///
    /// The speech engine applies its own, shorter ceiling on top.
    pub fn new() -> Self {
        Self::with_timeout(std::time::Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build reqwest client"),
        }
    }
}

#[cfg(feature = "native")]
impl Default for NativeHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "native")]
#[async_trait]
impl HttpClient for NativeHttpClient {
    async fn post(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: Vec<u8>,
    ) -> Result<HttpResponse, HttpError> {
        let mut builder = self.client.post(url).body(body);
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
