/*
[INPUT]:  Desired token scope (public/private) and API credentials
[OUTPUT]: Connectable WebSocket URL with an embedded single-use token
[POS]:    HTTP layer - session token provider for the streaming client
[UPDATE]: When bullet endpoints or the token envelope change
*/

use crate::error::{KucoinError, Result};
use crate::http::KucoinClient;
use reqwest::Method;
use serde::Deserialize;

const BULLET_PUBLIC: &str = "/api/v1/bullet-public";
const BULLET_PRIVATE: &str = "/api/v1/bullet-private";
const SUCCESS_CODE: &str = "200000";

/// Authorization scope of a stream token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Public,
    Private,
}

/// A connectable WebSocket endpoint with its single-use token applied.
///
/// Valid for exactly one connection attempt; a fresh endpoint must be
/// fetched for every reconnect.
#[derive(Debug, Clone)]
pub struct WsEndpoint {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct BulletResponse {
    code: String,
    msg: Option<String>,
    data: Option<BulletData>,
}

#[derive(Debug, Deserialize)]
struct BulletData {
    token: String,
    #[serde(rename = "instanceServers")]
    instance_servers: Vec<InstanceServer>,
}

#[derive(Debug, Deserialize)]
struct InstanceServer {
    endpoint: String,
}

impl KucoinClient {
    /// Exchange credentials for a short-lived WebSocket endpoint URL + token.
    ///
    /// POST /api/v1/bullet-public (no auth) or /api/v1/bullet-private
    /// (signed; requires credentials). The returned URL embeds the token
    /// as `{endpoint}?token={token}` and is single-use.
    pub async fn ws_endpoint(&self, scope: TokenScope) -> Result<WsEndpoint> {
        let builder = match scope {
            TokenScope::Public => self.request(Method::POST, BULLET_PUBLIC)?,
            TokenScope::Private => self.signed_request(Method::POST, BULLET_PRIVATE, None)?,
        };

        let response: BulletResponse = self.send_json(builder).await?;
        if response.code != SUCCESS_CODE {
            return Err(KucoinError::Api {
                code: response.code,
                message: response.msg.unwrap_or_else(|| "bullet request rejected".to_string()),
            });
        }

        let data = response
            .data
            .ok_or_else(|| KucoinError::Config("bullet response missing data".to_string()))?;
        let server = data
            .instance_servers
            .first()
            .ok_or_else(|| KucoinError::Config("bullet response has no instance servers".to_string()))?;

        Ok(WsEndpoint {
            url: format!("{}?token={}", server.endpoint, data.token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bullet_body(endpoint: &str, token: &str) -> serde_json::Value {
        serde_json::json!({
            "code": "200000",
            "data": {
                "token": token,
                "instanceServers": [
                    {
                        "endpoint": endpoint,
                        "encrypt": true,
                        "protocol": "websocket",
                        "pingInterval": 18000,
                        "pingTimeout": 10000
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_public_ws_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/bullet-public"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(bullet_body("wss://ws.example.com/endpoint", "abc123")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = KucoinClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init");
        let endpoint = client.ws_endpoint(TokenScope::Public).await.expect("bullet failed");
        assert_eq!(endpoint.url, "wss://ws.example.com/endpoint?token=abc123");
    }

    #[tokio::test]
    async fn test_private_without_credentials_is_auth_error() {
        let client = KucoinClient::new().expect("client init");
        let err = client
            .ws_endpoint(TokenScope::Private)
            .await
            .expect_err("should fail without credentials");
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_rejected_bullet_code_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/bullet-public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "400100",
                "msg": "parameter error"
            })))
            .mount(&server)
            .await;

        let client = KucoinClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init");
        let err = client
            .ws_endpoint(TokenScope::Public)
            .await
            .expect_err("should surface envelope error");
        match err {
            KucoinError::Api { code, message } => {
                assert_eq!(code, "400100");
                assert_eq!(message, "parameter error");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/bullet-public"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = KucoinClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init");
        let err = client
            .ws_endpoint(TokenScope::Public)
            .await
            .expect_err("should fail on 503");
        assert!(err.is_retryable());
    }
}
