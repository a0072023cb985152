/*
[INPUT]:  HTTP configuration (base URL, timeouts, credentials)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use crate::error::{KucoinError, Result};
use crate::http::signature::RequestSigner;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Base URL for the KuCoin REST API
const API_BASE_URL: &str = "https://api.kucoin.com";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// API credentials for private endpoints and private streams.
///
/// Passed in explicitly at construction; the adapter never reads
/// credentials from the environment or from files.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub api_passphrase: String,
}

/// Main HTTP client for the KuCoin API
#[derive(Debug, Clone)]
pub struct KucoinClient {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
    credentials: Option<Credentials>,
}

impl KucoinClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, API_BASE_URL)
    }

    /// Create a new client against an explicit base URL (used by tests)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            timeout: config.timeout,
            credentials: None,
        })
    }

    /// Set credentials for private endpoints
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Build request builder for public endpoints
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder for signed (private) endpoints.
    ///
    /// `endpoint` must include the query string, since KC-API signatures
    /// cover the full request path. `body` is the exact JSON payload sent.
    pub(crate) fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&str>,
    ) -> Result<RequestBuilder> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| KucoinError::auth("private endpoint requires credentials"))?;

        let mut builder = self.request(method.clone(), endpoint)?;
        for (name, value) in
            RequestSigner::headers(credentials, method.as_str(), endpoint, body.unwrap_or(""))?
        {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body.to_string());
        }
        Ok(builder)
    }

    /// Send a request and decode the JSON response body.
    ///
    /// Maps transport and HTTP-status failures onto the crate error taxonomy
    /// before attempting to decode.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|err| map_transport_error(err, self.timeout))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(KucoinError::auth(format!("HTTP {status}: {body}")));
        }
        if status.is_server_error() {
            return Err(KucoinError::UpstreamUnavailable {
                message: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KucoinError::api_error(status, body));
        }

        Ok(response.json().await?)
    }
}

/// Classify reqwest transport failures into the crate error taxonomy
fn map_transport_error(err: reqwest::Error, timeout: Duration) -> KucoinError {
    if err.is_timeout() {
        KucoinError::Timeout { duration: timeout.as_secs() }
    } else if err.is_connect() {
        KucoinError::UpstreamUnavailable { message: err.to_string() }
    } else {
        KucoinError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_signed_request_requires_credentials() {
        let client = KucoinClient::new().expect("client init");
        let err = client
            .signed_request(Method::POST, "/api/v1/bullet-private", None)
            .expect_err("should fail without credentials");
        assert!(err.is_auth_error());
    }
}
