//! Click redirector tests
//!
//! 使用本地 TCP 假服务器驱动真实的 Cuelinks 客户端，验证追踪失败时回退到原始链接。

mod common;

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use common::temp_storage;
use dealtracker::config::AffiliateConfig;
use dealtracker::errors::DealError;
use dealtracker::integrations::{ClickRequest, CuelinksClient, ExternalId};
use dealtracker::services::{ClickRedirectService, ConnectionLogger};
use dealtracker::storage::{IntegrationType, LogStatus};

const REDIRECT_URL: &str = "https://shop.example.com/product/42?color=red";

/// 对每个请求回复同一个响应，返回 api_base
fn spawn_fake_api(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake api");
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    format!("http://{}", addr)
}

fn cuelinks_client(api_base: String) -> CuelinksClient {
    let config = AffiliateConfig {
        api_base,
        api_key: "test-api-key".to_string(),
        ..Default::default()
    };
    CuelinksClient::new(&config, Duration::from_secs(5))
}

fn click_request() -> ClickRequest {
    ClickRequest {
        campaign_id: "123".to_string(),
        redirect_url: REDIRECT_URL.to_string(),
        sub_id_1: Some("deal-1".to_string()),
        sub_id_2: Some("website".to_string()),
        sub_id_3: None,
    }
}

#[tokio::test]
async fn test_upstream_500_falls_back_to_redirect_url() {
    let (storage, _dir) = temp_storage().await;
    let api_base = spawn_fake_api("500 Internal Server Error", r#"{"error":"boom"}"#);
    let logger = ConnectionLogger::new(storage.clone());
    let service = ClickRedirectService::new(Arc::new(cuelinks_client(api_base)), logger.clone());

    let outcome = service.redirect(&click_request()).await.unwrap();
    assert_eq!(outcome.url, REDIRECT_URL);
    assert_eq!(outcome.status, "error");
    assert!(outcome.click_id.is_none());
    assert!(outcome.message.as_deref().unwrap_or_default().contains("500"));
    assert!(!outcome.is_tracked());

    let logs = logger.recent(Some("cuelinks"), 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].integration_type, IntegrationType::Affiliate);
    assert_eq!(logs[0].action, "CLICK");
    assert_eq!(logs[0].status, LogStatus::Failed);
}

#[tokio::test]
async fn test_unreachable_network_falls_back_to_redirect_url() {
    let (storage, _dir) = temp_storage().await;
    // 绑定后立即释放端口，连接会被拒绝
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let service = ClickRedirectService::new(
        Arc::new(cuelinks_client(format!("http://{}", addr))),
        ConnectionLogger::new(storage.clone()),
    );

    let outcome = service.redirect(&click_request()).await.unwrap();
    assert_eq!(outcome.url, REDIRECT_URL);
    assert_eq!(outcome.status, "error");
}

#[tokio::test]
async fn test_unconfigured_client_falls_back_to_redirect_url() {
    let (storage, _dir) = temp_storage().await;
    let client = CuelinksClient::new(&AffiliateConfig::default(), Duration::from_secs(1));
    let service = ClickRedirectService::new(Arc::new(client), ConnectionLogger::new(storage));

    let outcome = service.redirect(&click_request()).await.unwrap();
    assert_eq!(outcome.url, REDIRECT_URL);
    assert_eq!(outcome.status, "error");
}

#[tokio::test]
async fn test_tracked_click_uses_tracking_url() {
    let (storage, _dir) = temp_storage().await;
    let api_base = spawn_fake_api(
        "200 OK",
        r#"{"click_id": 98765, "url": "https://linksredirect.com/?cid=98765", "status": "success"}"#,
    );
    let logger = ConnectionLogger::new(storage.clone());
    let service = ClickRedirectService::new(Arc::new(cuelinks_client(api_base)), logger.clone());

    let outcome = service.redirect(&click_request()).await.unwrap();
    assert_eq!(outcome.url, "https://linksredirect.com/?cid=98765");
    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.click_id, Some(ExternalId::Number(98765)));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["click_id"], 98765);
    assert!(json.get("clickId").is_none());

    let logs = logger.recent(Some("cuelinks"), 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Success);
}

#[tokio::test]
async fn test_tracked_click_without_url_keeps_redirect_url() {
    let (storage, _dir) = temp_storage().await;
    let api_base = spawn_fake_api("200 OK", r#"{"click_id": "abc"}"#);
    let service = ClickRedirectService::new(
        Arc::new(cuelinks_client(api_base)),
        ConnectionLogger::new(storage),
    );

    let outcome = service.redirect(&click_request()).await.unwrap();
    assert_eq!(outcome.url, REDIRECT_URL);
    assert_eq!(outcome.status, "success");
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_tracking() {
    let (storage, _dir) = temp_storage().await;
    let logger = ConnectionLogger::new(storage.clone());
    let client = CuelinksClient::new(&AffiliateConfig::default(), Duration::from_secs(1));
    let service = ClickRedirectService::new(Arc::new(client), logger.clone());

    let mut missing_campaign = click_request();
    missing_campaign.campaign_id = " ".to_string();
    assert!(matches!(
        service.redirect(&missing_campaign).await,
        Err(DealError::Validation(_))
    ));

    let mut bad_url = click_request();
    bad_url.redirect_url = "javascript:alert(1)".to_string();
    assert!(matches!(
        service.redirect(&bad_url).await,
        Err(DealError::Validation(_))
    ));

    assert!(logger.recent(None, 10).await.unwrap().is_empty());
}
