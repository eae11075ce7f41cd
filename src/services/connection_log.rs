//! 连接日志写入
//!
//! 日志写入失败只记 warn，不影响调用方的主流程

use std::sync::Arc;

use tracing::{trace, warn};

use crate::errors::Result;
use crate::storage::{
    ConnectionLogEntry, IntegrationType, LogStatus, NewLogEntry, SeaOrmStorage,
};

#[derive(Clone)]
pub struct ConnectionLogger {
    storage: Arc<SeaOrmStorage>,
}

impl ConnectionLogger {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 追加一条日志，失败时返回错误
    pub async fn append(&self, entry: NewLogEntry) -> Result<ConnectionLogEntry> {
        self.storage.append_log(entry).await
    }

    /// 追加一条日志，失败只记录 warn
    pub async fn record(
        &self,
        network_id: &str,
        integration_type: IntegrationType,
        action: &str,
        status: LogStatus,
        message: impl Into<String>,
    ) {
        let entry = NewLogEntry::new(network_id, integration_type, action, status, message);
        match self.storage.append_log(entry).await {
            Ok(saved) => trace!(
                "Connection log #{} {}/{} {}",
                saved.id, saved.network_id, saved.action, saved.status
            ),
            Err(e) => warn!(
                "Failed to write connection log ({}/{}): {}",
                network_id, action, e
            ),
        }
    }

    pub async fn recent(
        &self,
        network_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<ConnectionLogEntry>> {
        self.storage.recent_logs(network_id, limit).await
    }
}
