//! JSON-over-HTTP access to the LCD.
//!
//! # Responsibilities
//! - Issue GET/POST requests relative to the configured API URL
//! - Unwrap the LCD `{"error": ...}` convention into `LcdError::Backend`
//! - Decode response bodies into wire schemas
//! - Record request metrics

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;
use url::Url;

use crate::lcd::error::{LcdError, LcdResult};
use crate::observability::metrics;

/// HTTP transport bound to one LCD backend.
#[derive(Clone)]
pub struct LcdTransport {
    http: Client,
    /// API URL without trailing slash.
    base: String,
}

impl LcdTransport {
    /// Create a transport for `api_url`. Performs no I/O.
    pub fn new(api_url: &str, http: Client) -> LcdResult<Self> {
        let url = Url::parse(api_url)
            .map_err(|e| LcdError::InvalidUrl(format!("{}: {}", api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LcdError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                api_url
            )));
        }
        Ok(Self {
            http,
            base: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.base
    }

    /// GET `path` (which may carry a query string) and decode the body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> LcdResult<T> {
        let request = self.http.get(self.url(path));
        self.send(Method::GET, path, request).await
    }

    /// POST `body` as JSON to `path` and decode the response body.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> LcdResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.send(Method::POST, path, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> LcdResult<T> {
        tracing::debug!(method = %method, path = %path, "LCD request");
        let started = Instant::now();

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                metrics::record_lcd_request(method.as_str(), "error", started.elapsed());
                tracing::warn!(method = %method, path = %path, error = %e, "LCD request failed");
                return Err(LcdError::Http(e));
            }
        };

        let status = response.status();
        metrics::record_lcd_request(method.as_str(), status.as_str(), started.elapsed());
        let text = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(&text).unwrap_or(text);
            tracing::debug!(path = %path, status = %status, error = %message, "LCD returned error");
            return Err(LcdError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        if let Some(message) = error_field(&value) {
            return Err(LcdError::Backend {
                status: status.as_u16(),
                message: message.to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| {
            LcdError::MalformedResponse(format!("unexpected response from {}: {}", path, e))
        })
    }
}

impl std::fmt::Debug for LcdTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LcdTransport")
            .field("api_url", &self.base)
            .finish()
    }
}

fn error_field(value: &serde_json::Value) -> Option<&str> {
    value.as_object()?.get("error")?.as_str()
}

/// Message of an `{"error": "..."}` body, if the body has that shape.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    error_field(&value).map(str::to_string)
}
