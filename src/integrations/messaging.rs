//! 消息机器人（Telegram Bot API）客户端

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::http::{build_agent, run_blocking, upstream_error};
use crate::errors::{DealError, Result};

#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// 发送一条 Markdown 消息
    async fn send_message(&self, bot_token: &str, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub fn send_message_url(api_base: &str, bot_token: &str) -> String {
    format!(
        "{}/bot{}/sendMessage",
        api_base.trim_end_matches('/'),
        bot_token
    )
}

pub struct TelegramClient {
    agent: ureq::Agent,
    api_base: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
            api_base: api_base.to_string(),
        }
    }
}

#[async_trait]
impl MessagingApi for TelegramClient {
    async fn send_message(&self, bot_token: &str, chat_id: &str, text: &str) -> Result<()> {
        if bot_token.is_empty() {
            return Err(DealError::validation("Bot token is empty"));
        }

        let url = send_message_url(&self.api_base, bot_token);
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        let agent = self.agent.clone();

        let resp: SendMessageResponse = run_blocking("telegram send", move || {
            // 不要把带 token 的 URL 写进错误信息
            let resp = agent
                .post(&url)
                .send_json(&body)
                .map_err(|e| upstream_error("Telegram", e))?;
            resp.into_body()
                .read_json::<SendMessageResponse>()
                .map_err(|e| DealError::upstream(format!("Telegram response parse failed: {}", e)))
        })
        .await?;

        if !resp.ok {
            return Err(DealError::upstream(format!(
                "Telegram API error: {}",
                resp.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        debug!("Telegram message delivered to chat {}", chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_response_parsing() {
        let r: SendMessageResponse =
            serde_json::from_str(r#"{"ok": false, "description": "chat not found"}"#).unwrap();
        assert!(!r.ok);
        assert_eq!(r.description.as_deref(), Some("chat not found"));
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let client = TelegramClient::new("https://api.telegram.org", Duration::from_secs(1));
        let err = client.send_message("", "1", "hi").await.unwrap_err();
        assert!(matches!(err, DealError::Validation(_)));
    }
}
