//! 固定窗口限流
//!
//! 进程内 DashMap，按客户端 key 计数；不持久化，重启即清空。
//! 同一个 key 的读改写在 DashMap entry 锁内完成。

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// 单次检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Rejected { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

pub struct FixedWindowRateLimiter {
    windows: DashMap<String, Window>,
    max_attempts: u32,
    window: Duration,
}

impl FixedWindowRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_attempts,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.window_secs))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// 窗口内第 max_attempts + 1 次起拒绝；窗口过期后的第一次请求重新计数为 1
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        let window = entry.value_mut();

        if now.saturating_duration_since(window.started) >= self.window {
            window.count = 0;
            window.started = now;
        }

        window.count = window.count.saturating_add(1);
        if window.count > self.max_attempts {
            let elapsed = now.saturating_duration_since(window.started);
            return RateDecision::Rejected {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        RateDecision::Allowed {
            remaining: self.max_attempts - window.count,
        }
    }

    /// 清理已过期的窗口，返回清理数量
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// 启动后台清理任务，每个窗口长度运行一次
    pub fn spawn_purge_task(self: Arc<Self>) {
        let interval = self.window.max(Duration::from_secs(1));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let purged = self.purge_expired();
                if purged > 0 {
                    debug!("Rate limiter purged {} expired windows", purged);
                }
            }
        });

        info!(
            "Rate limiter purge task started (interval: {} s)",
            interval.as_secs()
        );
    }
}
