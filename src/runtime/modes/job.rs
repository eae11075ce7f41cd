//! One-shot job mode
//!
//! Lets a system cron trigger the sync jobs without going through HTTP.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::get_config;
use crate::runtime::lifetime;
use crate::services::JobKind;

/// 运行一次任务并把汇总以 JSON 打印到 stdout
///
/// 任务整体中止（success=false）时返回错误，让调用方得到非零退出码
pub async fn run_job(kind: JobKind) -> Result<()> {
    let config = get_config();
    let services = lifetime::startup::prepare_services(&config).await?;

    let outcome = services.jobs.run(kind).await;
    let json =
        serde_json::to_string_pretty(&outcome).context("Failed to serialize job summary")?;
    println!("{}", json);

    if !outcome.success() {
        anyhow::bail!("Job {} did not complete successfully", kind);
    }
    info!("Job {} completed", kind);
    Ok(())
}
