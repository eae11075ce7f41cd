//! 跳转目标 URL 校验
//!
//! 只允许 http/https，拦截脚本类协议，防止开放跳转被利用

use url::Url;

use crate::errors::{DealError, Result};

/// 拦截的协议前缀
const BLOCKED_SCHEMES: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// 校验跳转目标并返回解析后的 URL
pub fn validate_redirect_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DealError::validation("redirect_url is required"));
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(scheme) = BLOCKED_SCHEMES.iter().find(|s| lower.starts_with(**s)) {
        return Err(DealError::validation(format!(
            "redirect_url scheme not allowed: {}",
            scheme
        )));
    }

    let parsed = Url::parse(trimmed)?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        "http" | "https" => Err(DealError::validation("redirect_url must include a host")),
        other => Err(DealError::validation(format!(
            "redirect_url must use http or https, got {}:",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_redirect_url("https://shop.example.com/p/1?ref=x").is_ok());
        assert!(validate_redirect_url("HTTP://example.com").is_ok());
    }

    #[test]
    fn test_rejects_script_schemes() {
        for url in ["javascript:alert(1)", "data:text/html,hi", "JAVASCRIPT:void(0)"] {
            assert!(matches!(
                validate_redirect_url(url),
                Err(DealError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_rejects_other_schemes_and_blank() {
        assert!(validate_redirect_url("ftp://example.com").is_err());
        assert!(validate_redirect_url("   ").is_err());
        assert!(validate_redirect_url("not a url").is_err());
    }
}
