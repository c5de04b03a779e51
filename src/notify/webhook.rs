use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{JoinAttempt, WakeNotifier};
use crate::{config::WebhookConfig, logging::DrowseLogger, utils::unix_millis};

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("could not build http client")]
    Client(#[source] reqwest::Error),
    #[error("request failed")]
    Request(#[source] reqwest::Error),
    #[error("endpoint answered {0}")]
    Status(StatusCode),
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    timestamp: u64,
    client: ClientInfo,
    server: ServerInfo<'a>,
    player: Option<PlayerPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct ClientInfo {
    host: String,
    port: u16,
}

#[derive(Debug, Serialize)]
struct ServerInfo<'a> {
    host: &'a str,
    port: u16,
    protocol: i32,
}

#[derive(Debug, Serialize)]
struct PlayerPayload<'a> {
    name: &'a str,
    uuid: String,
}

impl<'a> WebhookPayload<'a> {
    fn new(attempt: &'a JoinAttempt, timestamp: u64) -> Self {
        Self {
            event: "join-attempt",
            timestamp,
            client: ClientInfo {
                host: attempt.client.ip().to_string(),
                port: attempt.client.port(),
            },
            server: ServerInfo {
                host: &attempt.server_address,
                port: attempt.server_port,
                protocol: attempt.protocol_version,
            },
            player: attempt.player.as_ref().map(|player| PlayerPayload {
                name: &player.name,
                uuid: player.uuid.to_string(),
            }),
        }
    }
}

/// POSTs every join attempt as JSON to a fixed URL.
pub struct WebhookNotifier {
    url: String,
    require_user: bool,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(
        url: impl Into<String>,
        require_user: bool,
        timeout: Duration,
    ) -> Result<Self, WebhookError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("drowse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WebhookError::Client)?;
        Ok(Self::with_client(url, require_user, client))
    }

    pub fn with_client(url: impl Into<String>, require_user: bool, client: Client) -> Self {
        Self {
            url: url.into(),
            require_user,
            client,
        }
    }

    /// `None` when no URL is configured.
    pub fn from_config(config: &WebhookConfig) -> Result<Option<Self>, WebhookError> {
        match config.url() {
            Some(url) => Self::new(url, config.require_user, config.timeout()).map(Some),
            None => Ok(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn require_user(&self) -> bool {
        self.require_user
    }

    async fn post(&self, attempt: &JoinAttempt) -> Result<StatusCode, WebhookError> {
        let payload = WebhookPayload::new(attempt, unix_millis());
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(WebhookError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status));
        }
        Ok(status)
    }
}

#[async_trait]
impl WakeNotifier for WebhookNotifier {
    async fn notify(&self, attempt: &JoinAttempt) -> anyhow::Result<()> {
        if self.require_user && attempt.player.is_none() {
            DrowseLogger::webhook_skipped(&attempt.client);
            return Ok(());
        }

        let status = self.post(attempt).await?;
        DrowseLogger::webhook_delivered(&attempt.client, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::PlayerInfo;
    use net::Uuid;
    use serde_json::Value;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    fn attempt(player: Option<PlayerInfo>) -> JoinAttempt {
        JoinAttempt {
            client: "203.0.113.7:51234".parse().unwrap(),
            server_address: "play.example.com".to_string(),
            server_port: 25565,
            protocol_version: 767,
            player,
        }
    }

    fn alice() -> PlayerInfo {
        PlayerInfo {
            name: "Alice".to_string(),
            uuid: Uuid::from_u64s(0x0102_0304_0506_0708, 0x090a_0b0c_0d0e_0f10),
        }
    }

    fn direct_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Accepts one request, answers with `status_line` and hands back the raw head and body.
    async fn one_shot_server(status_line: &'static str) -> (String, JoinHandle<(String, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/wake", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            while buf.len() < head_end + length {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending the body");
                buf.extend_from_slice(&chunk[..n]);
            }
            let response =
                format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).await.unwrap();
            (head, buf[head_end..head_end + length].to_vec())
        });
        (url, handle)
    }

    #[test]
    fn payload_shape() {
        let attempt = attempt(Some(alice()));
        let value = serde_json::to_value(WebhookPayload::new(&attempt, 1_700_000_000_000)).unwrap();
        assert_eq!(value["event"], "join-attempt");
        assert_eq!(value["timestamp"], 1_700_000_000_000u64);
        assert_eq!(value["client"]["host"], "203.0.113.7");
        assert_eq!(value["client"]["port"], 51234);
        assert_eq!(value["server"]["host"], "play.example.com");
        assert_eq!(value["server"]["port"], 25565);
        assert_eq!(value["server"]["protocol"], 767);
        assert_eq!(value["player"]["name"], "Alice");
        assert_eq!(
            value["player"]["uuid"],
            "01020304-0506-0708-090a-0b0c0d0e0f10"
        );
    }

    #[test]
    fn payload_without_player_is_null() {
        let attempt = attempt(None);
        let value = serde_json::to_value(WebhookPayload::new(&attempt, 0)).unwrap();
        assert_eq!(value["player"], Value::Null);
    }

    #[test]
    fn blank_config_builds_nothing() {
        let config = WebhookConfig::default();
        assert!(WebhookNotifier::from_config(&config).unwrap().is_none());

        let config = WebhookConfig {
            url: Some("http://127.0.0.1:8080/wake".to_string()),
            require_user: true,
            timeout: 2,
        };
        let notifier = WebhookNotifier::from_config(&config).unwrap().unwrap();
        assert_eq!(notifier.url(), "http://127.0.0.1:8080/wake");
        assert!(notifier.require_user());
    }

    #[tokio::test]
    async fn posts_join_attempt_as_json() {
        let (url, server) = one_shot_server("HTTP/1.1 204 No Content").await;
        let notifier = WebhookNotifier::with_client(url, true, direct_client());

        notifier.notify(&attempt(Some(alice()))).await.unwrap();

        let (head, body) = server.await.unwrap();
        assert!(head.starts_with("POST /wake HTTP/1.1\r\n"), "{head}");
        assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["event"], "join-attempt");
        assert_eq!(value["player"]["name"], "Alice");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (url, server) = one_shot_server("HTTP/1.1 500 Internal Server Error").await;
        let notifier = WebhookNotifier::with_client(url, false, direct_client());

        let err = notifier.notify(&attempt(None)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WebhookError>(),
            Some(WebhookError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn require_user_skips_anonymous_attempts() {
        // Nothing listens here; a request would fail.
        let notifier =
            WebhookNotifier::with_client("http://127.0.0.1:9/wake", true, direct_client());
        notifier.notify(&attempt(None)).await.unwrap();
    }
}
