//! 机器人通知推送
//!
//! 每个目标机器人收到一条汇总消息；单个机器人发送失败只计数，继续下一个。

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::templates::render_digest;
use super::{JobReport, summary_status};
use crate::integrations::MessagingApi;
use crate::services::ConnectionLogger;
use crate::storage::{IntegrationType, LogStatus, MessagingBot, NotificationKind, SeaOrmStorage};

pub const NOTIFICATIONS_ACTION: &str = "NOTIFICATIONS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub bots_notified: u32,
    pub failed: u32,
    pub skipped: u32,
    pub deals_included: u32,
}

pub struct NotificationJob {
    storage: Arc<SeaOrmStorage>,
    messaging: Arc<dyn MessagingApi>,
    logger: ConnectionLogger,
    lookback_hours: i64,
    max_deals: u64,
}

/// 活跃、有 chat_id 且开启了 NEW_DEAL 或 DIGEST 的机器人
pub fn is_digest_target(bot: &MessagingBot) -> bool {
    bot.is_active
        && bot.chat_id.as_deref().is_some_and(|c| !c.trim().is_empty())
        && (bot.enabled(NotificationKind::NewDeal).is_some()
            || bot.enabled(NotificationKind::Digest).is_some())
}

/// DIGEST 模板优先，其次 NEW_DEAL 模板
pub fn digest_template(bot: &MessagingBot) -> Option<&str> {
    bot.template_for(NotificationKind::Digest)
        .or_else(|| bot.template_for(NotificationKind::NewDeal))
}

impl NotificationJob {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        messaging: Arc<dyn MessagingApi>,
        logger: ConnectionLogger,
        lookback_hours: i64,
        max_deals: u64,
    ) -> Self {
        Self {
            storage,
            messaging,
            logger,
            lookback_hours,
            max_deals,
        }
    }

    pub async fn run(&self) -> JobReport<NotificationSummary> {
        let mut summary = NotificationSummary::default();
        let since = Utc::now() - Duration::hours(self.lookback_hours);

        let deals = match self
            .storage
            .recent_published_deals(since, self.max_deals)
            .await
        {
            Ok(deals) => deals,
            Err(e) => return self.abort(e.message(), summary).await,
        };

        if deals.is_empty() {
            let message = format!("No new deals in the last {} hours", self.lookback_hours);
            info!("Notifications: {}", message);
            self.log_summary(LogStatus::Success, &message).await;
            return JobReport::completed(message, summary);
        }
        summary.deals_included = deals.len() as u32;

        let bots = match self.storage.active_bots().await {
            Ok(bots) => bots,
            Err(e) => return self.abort(e.message(), summary).await,
        };

        for bot in &bots {
            if !is_digest_target(bot) {
                summary.skipped += 1;
                continue;
            }
            let Some(chat_id) = bot.chat_id.as_deref() else {
                summary.skipped += 1;
                continue;
            };

            let text = render_digest(digest_template(bot), &deals);
            match self
                .messaging
                .send_message(&bot.bot_token, chat_id, &text)
                .await
            {
                Ok(()) => {
                    debug!("Digest sent to bot {}", bot.name);
                    summary.bots_notified += 1;
                }
                Err(e) => {
                    warn!("Digest to bot {} failed: {}", bot.name, e);
                    summary.failed += 1;
                }
            }
        }

        let message = format!(
            "Notified {} bots with {} deals, {} failed, {} skipped",
            summary.bots_notified, summary.deals_included, summary.failed, summary.skipped
        );
        info!("{}", message);
        self.log_summary(summary_status(summary.failed), &message).await;
        JobReport::completed(message, summary)
    }

    async fn abort(
        &self,
        reason: &str,
        summary: NotificationSummary,
    ) -> JobReport<NotificationSummary> {
        let message = format!("Notifications aborted: {}", reason);
        warn!("{}", message);
        self.log_summary(LogStatus::Failed, &message).await;
        JobReport::failed(message, summary)
    }

    async fn log_summary(&self, status: LogStatus, message: &str) {
        self.logger
            .record(
                super::CRON_NETWORK_ID,
                IntegrationType::Cron,
                NOTIFICATIONS_ACTION,
                status,
                message,
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BotNotificationSetting;

    fn bot(chat_id: Option<&str>, settings: &[(NotificationKind, bool, Option<&str>)]) -> MessagingBot {
        MessagingBot {
            id: "b".into(),
            name: "bot".into(),
            bot_token: "t".into(),
            chat_id: chat_id.map(str::to_string),
            is_active: true,
            notifications: settings
                .iter()
                .map(|(kind, enabled, template)| BotNotificationSetting {
                    kind: *kind,
                    is_enabled: *enabled,
                    message_template: template.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn test_digest_target_rules() {
        assert!(is_digest_target(&bot(
            Some("1"),
            &[(NotificationKind::NewDeal, true, None)]
        )));
        assert!(!is_digest_target(&bot(
            None,
            &[(NotificationKind::Digest, true, None)]
        )));
        assert!(!is_digest_target(&bot(
            Some("1"),
            &[(NotificationKind::PriceDrop, true, None)]
        )));
        assert!(!is_digest_target(&bot(
            Some("1"),
            &[(NotificationKind::NewDeal, false, None)]
        )));
    }

    #[test]
    fn test_digest_template_precedence() {
        let b = bot(
            Some("1"),
            &[
                (NotificationKind::NewDeal, true, Some("new")),
                (NotificationKind::Digest, true, Some("digest")),
            ],
        );
        assert_eq!(digest_template(&b), Some("digest"));
        let b = bot(Some("1"), &[(NotificationKind::NewDeal, true, Some("new"))]);
        assert_eq!(digest_template(&b), Some("new"));
        let b = bot(Some("1"), &[(NotificationKind::Digest, true, None)]);
        assert_eq!(digest_template(&b), None);
    }
}
