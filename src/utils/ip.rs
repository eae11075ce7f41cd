//! 客户端地址提取
//!
//! 限流按客户端地址计数。只有当 TCP 对端属于可信代理（IP 或 CIDR）时
//! 才采信 X-Forwarded-For 的第一个地址，否则使用对端地址。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use tracing::debug;

/// 无法确定地址时的限流 key
pub const UNKNOWN_CLIENT: &str = "unknown";

fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| raw.parse::<IpAddr>())
        .ok()
}

/// 检查地址是否在可信代理列表中
pub fn is_trusted_proxy(ip: &IpAddr, trusted_proxies: &[String]) -> bool {
    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(ip, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == *ip)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix_len.parse::<u32>() else {
        return false;
    };
    let Ok(network) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 根据对端地址与 X-Forwarded-For 计算限流 key
pub fn resolve_client_key(
    peer: Option<&str>,
    forwarded_for: Option<&str>,
    trusted_proxies: &[String],
) -> String {
    let forwarded = forwarded_for
        .and_then(|h| h.split(',').next())
        .and_then(parse_ip);

    match peer.and_then(parse_ip) {
        Some(peer_ip) if is_trusted_proxy(&peer_ip, trusted_proxies) => {
            let key = forwarded.unwrap_or(peer_ip);
            debug!("Trusted proxy {} -> client {}", peer_ip, key);
            key.to_string()
        }
        Some(peer_ip) => peer_ip.to_string(),
        None => forwarded
            .filter(|_| trusted_proxies.is_empty())
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string()),
    }
}

/// 从请求提取限流 key
pub fn client_key(req: &HttpRequest, trusted_proxies: &[String]) -> String {
    let peer = req.peer_addr().map(|a| a.to_string());
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok());
    resolve_client_key(peer.as_deref(), forwarded, trusted_proxies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_in_cidr() {
        let ip: IpAddr = "10.1.2.3".parse().unwrap();
        assert!(ip_in_cidr(&ip, "10.0.0.0/8"));
        assert!(!ip_in_cidr(&ip, "192.168.0.0/16"));
        assert!(!ip_in_cidr(&ip, "10.0.0.0/40"));
        let v6: IpAddr = "fd00::1".parse().unwrap();
        assert!(ip_in_cidr(&v6, "fc00::/7"));
    }

    #[test]
    fn test_forwarded_ignored_for_untrusted_peer() {
        let key = resolve_client_key(Some("203.0.113.9:5000"), Some("1.2.3.4"), &[]);
        assert_eq!(key, "203.0.113.9");
    }

    #[test]
    fn test_forwarded_used_for_trusted_peer() {
        let trusted = vec!["10.0.0.0/8".to_string()];
        let key = resolve_client_key(
            Some("10.0.0.5:443"),
            Some("198.51.100.7, 10.0.0.5"),
            &trusted,
        );
        assert_eq!(key, "198.51.100.7");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        assert_eq!(resolve_client_key(None, None, &[]), UNKNOWN_CLIENT);
    }
}
