//! Deal 读写与计数器

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::model_to_deal;
use super::retry;
use crate::errors::{DealError, Result};
use crate::storage::models::{Deal, DealPatch, DealStatus, NewDeal};
use crate::utils::slug::{slugify, unique_slug};

use migration::entities::deal;

impl SeaOrmStorage {
    pub async fn get_deal(&self, id: &str) -> Result<Option<Deal>> {
        let model = deal::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询优惠失败: {}", e)))?;
        Ok(model.map(model_to_deal))
    }

    /// clicks = clicks + 1，返回本次自增后的记录
    pub async fn increment_clicks(&self, id: &str) -> Result<Deal> {
        self.increment_counter(id, deal::Column::Clicks).await
    }

    /// views = views + 1
    pub async fn increment_views(&self, id: &str) -> Result<Deal> {
        self.increment_counter(id, deal::Column::Views).await
    }

    /// 单条 UPDATE 原子自增，并在同一事务内读回新值
    async fn increment_counter(&self, id: &str, column: deal::Column) -> Result<Deal> {
        let db = &self.db;

        let updated = retry::retry_write(
            self.retry_policy,
            &format!("increment({:?}, {})", column, id),
            || async move {
                let txn = db.begin().await?;
                let res = deal::Entity::update_many()
                    .col_expr(column, Expr::col(column).add(Expr::val(1i64)))
                    .filter(deal::Column::Id.eq(id))
                    .exec(&txn)
                    .await?;

                if res.rows_affected == 0 {
                    txn.rollback().await?;
                    return Ok::<_, DbErr>(None);
                }

                let model = deal::Entity::find_by_id(id.to_string()).one(&txn).await?;
                txn.commit().await?;
                Ok(model)
            },
        )
        .await
        .map_err(|e| DealError::database_operation(format!("更新计数失败: {}", e)))?;

        let model = updated.ok_or_else(|| DealError::not_found(format!("Deal not found: {}", id)))?;
        debug!("Deal {} {:?} incremented", id, column);
        Ok(model_to_deal(model))
    }

    /// 按标题或联盟链接查找已有优惠（导入去重的自然键）
    pub async fn find_duplicate_deal(
        &self,
        title: &str,
        affiliate_url: Option<&str>,
    ) -> Result<Option<Deal>> {
        let mut cond = Condition::any().add(deal::Column::Title.eq(title));
        if let Some(url) = affiliate_url.filter(|u| !u.is_empty()) {
            cond = cond.add(deal::Column::AffiliateUrl.eq(url));
        }

        let model = deal::Entity::find()
            .filter(cond)
            .one(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询重复优惠失败: {}", e)))?;
        Ok(model.map(model_to_deal))
    }

    /// 创建优惠，slug 冲突时追加 -2、-3 ...
    pub async fn create_deal(&self, new: NewDeal) -> Result<Deal> {
        if new.title.trim().is_empty() {
            return Err(DealError::validation("Deal title is required"));
        }

        let base = slugify(&new.title);
        let taken: HashSet<String> = deal::Entity::find()
            .select_only()
            .column(deal::Column::Slug)
            .filter(deal::Column::Slug.starts_with(base.as_str()))
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询 slug 失败: {}", e)))?
            .into_iter()
            .collect();
        let slug = unique_slug(&base, |s| taken.contains(s));

        let now = Utc::now();
        let model = deal::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            title: Set(new.title),
            slug: Set(slug),
            description: Set(new.description),
            short_desc: Set(new.short_desc),
            current_price: Set(new.current_price),
            original_price: Set(new.original_price),
            discount: Set(new.discount),
            product_url: Set(new.product_url),
            affiliate_url: Set(new.affiliate_url),
            coupon: Set(new.coupon),
            image_url: Set(new.image_url),
            status: Set(new.status.as_ref().to_string()),
            is_expired: Set(false),
            category_id: Set(new.category_id),
            clicks: Set(0),
            views: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| DealError::database_operation(format!("创建优惠失败: {}", e)))?;

        info!("Deal created: {} ({})", model.id, model.slug);
        Ok(model_to_deal(model))
    }

    /// 部分更新，只写入 patch 中存在的字段
    pub async fn update_deal(&self, id: &str, patch: DealPatch) -> Result<Deal> {
        if patch.is_empty() {
            return self
                .get_deal(id)
                .await?
                .ok_or_else(|| DealError::not_found(format!("Deal not found: {}", id)));
        }

        fn opt<T: Into<sea_orm::Value>>(v: Option<T>) -> sea_orm::ActiveValue<T> {
            match v {
                Some(v) => Set(v),
                None => NotSet,
            }
        }

        let active = deal::ActiveModel {
            id: Unchanged(id.to_string()),
            title: opt(patch.title),
            description: opt(patch.description),
            short_desc: opt(patch.short_desc),
            current_price: opt(patch.current_price.map(Some)),
            original_price: opt(patch.original_price.map(Some)),
            discount: opt(patch.discount.map(Some)),
            affiliate_url: opt(patch.affiliate_url.map(Some)),
            coupon: opt(patch.coupon.map(Some)),
            image_url: opt(patch.image_url.map(Some)),
            status: opt(patch.status.map(|s| s.as_ref().to_string())),
            is_expired: opt(patch.is_expired),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let db = &self.db;
        let result = retry::retry_write(self.retry_policy, &format!("update_deal({})", id), || {
            active.clone().update(db)
        })
        .await;

        match result {
            Ok(model) => Ok(model_to_deal(model)),
            Err(DbErr::RecordNotUpdated) | Err(DbErr::RecordNotFound(_)) => {
                Err(DealError::not_found(format!("Deal not found: {}", id)))
            }
            Err(e) => Err(DealError::database_operation(format!(
                "更新优惠失败: {}",
                e
            ))),
        }
    }

    /// 最近创建、已发布且未过期的优惠，按创建时间倒序
    pub async fn recent_published_deals(
        &self,
        since: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Deal>> {
        let models = deal::Entity::find()
            .filter(deal::Column::CreatedAt.gte(since))
            .filter(deal::Column::IsExpired.eq(false))
            .filter(deal::Column::Status.eq(DealStatus::Published.as_ref()))
            .order_by_desc(deal::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询最近优惠失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_deal).collect())
    }

    pub async fn count_active_deals(&self) -> Result<u64> {
        deal::Entity::find()
            .filter(deal::Column::IsExpired.eq(false))
            .filter(deal::Column::Status.eq(DealStatus::Published.as_ref()))
            .count(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("统计优惠失败: {}", e)))
    }

    pub async fn count_deals(&self) -> Result<u64> {
        deal::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("统计优惠失败: {}", e)))
    }
}
