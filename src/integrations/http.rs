//! 共享 HTTP 客户端

use std::time::Duration;

use ureq::Agent;

use crate::errors::{DealError, Result};

/// 构建带全局超时的 Agent（克隆开销很小，内部共享连接池）
pub fn build_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// 在阻塞线程池中执行同步 HTTP 调用
pub async fn run_blocking<T, F>(label: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DealError::upstream(format!("{} task failed: {}", label, e)))?
}

/// 把 ureq 错误转换为上游错误，HTTP 状态码单独标出
pub fn upstream_error(service: &str, err: ureq::Error) -> DealError {
    match err {
        ureq::Error::StatusCode(code) => {
            DealError::upstream(format!("{} API error: {}", service, code))
        }
        other => DealError::upstream(format!("{} request failed: {}", service, other)),
    }
}
