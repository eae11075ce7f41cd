//! 写冲突重试
//!
//! 计数器自增和优惠更新都是单行写。SQLite WAL 下多个 worker 同时写会遇到
//! BUSY/LOCKED，MySQL 和 PostgreSQL 对应死锁或序列化失败，这类错误退避后重试即可。

use std::future::Future;
use std::time::Duration;

use rand::RngExt;
use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 表示“稍后再试”的数据库错误码
const TRANSIENT_CODES: &[&str] = &[
    // SQLite BUSY / LOCKED 及 BUSY_RECOVERY、LOCKED_SHAREDCACHE、BUSY_SNAPSHOT
    "5", "6", "261", "262", "517",
    // MySQL 锁等待超时 / 死锁
    "1205", "1213",
    // PostgreSQL 序列化失败 / 死锁 / 拿不到锁
    "40001", "40P01", "55P03",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub first_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            retries: config.retry_count,
            first_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// 第 n 次重试（从 1 开始）前的基础等待：每次翻倍，不超过 max_delay
    fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.first_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// 锁冲突、死锁与连接抖动视为瞬时错误，其余错误（约束、记录不存在）直接返回
pub fn is_transient(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => return true,
        DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(e) => match e.as_database_error().and_then(|db| db.code()) {
            Some(code) => TRANSIENT_CODES.contains(&code.as_ref()),
            None => mentions_lock(&e.to_string()),
        },
        RuntimeErr::Internal(msg) => mentions_lock(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn mentions_lock(message: &str) -> bool {
    let message = message.to_lowercase();
    ["database is locked", "deadlock", "lock wait timeout"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// 在基础等待上加 0-20% 抖动，错开同时重试的 worker
fn with_jitter(delay: Duration) -> Duration {
    let spread = delay.as_millis() as u64 / 5;
    delay + Duration::from_millis(rand::rng().random_range(0..=spread))
}

/// 执行一次写操作，遇到瞬时错误时按 policy 重试
pub async fn retry_write<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if retry < policy.retries && is_transient(&e) => {
                retry += 1;
                let wait = with_jitter(policy.delay(retry));
                warn!(
                    "{} hit a write conflict ({}), retry {}/{} in {:?}",
                    what, e, retry, policy.retries, wait
                );
                sleep(wait).await;
            }
            Err(e) => {
                debug!("{} failed after {} retries: {}", what, retry, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            first_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn locked() -> DbErr {
        DbErr::Exec(RuntimeErr::Internal("database is locked".into()))
    }

    #[test]
    fn test_delay_doubles_until_capped() {
        let policy = RetryPolicy {
            retries: 5,
            first_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(300),
        };
        let delays: Vec<u64> = (1..=5).map(|n| policy.delay(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![50, 100, 200, 300, 300]);
        assert_eq!(policy.delay(64), Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_stays_within_a_fifth() {
        let base = Duration::from_millis(100);
        for _ in 0..50 {
            let d = with_jitter(base);
            assert!(d >= base && d <= Duration::from_millis(120));
        }
    }

    #[test]
    fn test_lock_conflicts_are_transient() {
        assert!(is_transient(&locked()));
        assert!(is_transient(&DbErr::Query(RuntimeErr::Internal(
            "Deadlock found when trying to get lock".into()
        ))));
        assert!(is_transient(&DbErr::ConnectionAcquire(
            sea_orm::error::ConnAcquireErr::Timeout
        )));
    }

    #[test]
    fn test_constraint_and_missing_rows_are_not_transient() {
        assert!(!is_transient(&DbErr::RecordNotFound("deal".into())));
        assert!(!is_transient(&DbErr::RecordNotUpdated));
        assert!(!is_transient(&DbErr::Exec(RuntimeErr::Internal(
            "UNIQUE constraint failed: deals.slug".into()
        ))));
    }

    #[tokio::test]
    async fn test_counter_write_recovers_from_lock() {
        let mut calls = 0u32;
        let clicks = retry_write(fast_policy(3), "increment(Clicks)", || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt < 3 {
                    Err(locked())
                } else {
                    Ok(41u64 + 1)
                }
            }
        })
        .await;
        assert_eq!(clicks.unwrap(), 42);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_gives_up_when_retries_run_out() {
        let mut calls = 0u32;
        let result = retry_write(fast_policy(2), "increment(Views)", || {
            calls += 1;
            async { Err::<u64, _>(locked()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_missing_deal_is_not_retried() {
        let mut calls = 0u32;
        let result = retry_write(fast_policy(3), "update_deal", || {
            calls += 1;
            async { Err::<(), _>(DbErr::RecordNotUpdated) }
        })
        .await;
        assert!(matches!(result, Err(DbErr::RecordNotUpdated)));
        assert_eq!(calls, 1);
    }
}
