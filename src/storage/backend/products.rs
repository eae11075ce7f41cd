//! 电商商品价格缓存

use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use super::SeaOrmStorage;
use super::converters::{model_to_deal, model_to_product, product_to_active_model};
use crate::errors::{DealError, Result};
use crate::storage::models::{CachedProduct, Deal, DealStatus};

use migration::entities::{deal, marketplace_product};

impl SeaOrmStorage {
    pub async fn get_product(&self, external_id: &str) -> Result<Option<CachedProduct>> {
        let model = marketplace_product::Entity::find_by_id(external_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询商品缓存失败: {}", e)))?;
        Ok(model.map(model_to_product))
    }

    /// 写入或覆盖商品缓存
    pub async fn upsert_product(&self, product: &CachedProduct) -> Result<()> {
        use marketplace_product::Column;

        marketplace_product::Entity::insert(product_to_active_model(product))
            .on_conflict(
                OnConflict::column(Column::ExternalId)
                    .update_columns([
                        Column::Title,
                        Column::Description,
                        Column::CurrentPrice,
                        Column::OriginalPrice,
                        Column::Currency,
                        Column::ImageUrl,
                        Column::ProductUrl,
                        Column::DealId,
                        Column::LastCheckedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("写入商品缓存失败: {}", e)))?;
        Ok(())
    }

    /// 关联到已发布优惠的缓存商品
    pub async fn linked_products(&self) -> Result<Vec<(CachedProduct, Deal)>> {
        let products = marketplace_product::Entity::find()
            .filter(marketplace_product::Column::DealId.is_not_null())
            .order_by_asc(marketplace_product::Column::LastCheckedAt)
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询商品缓存失败: {}", e)))?;

        let deal_ids: Vec<String> = products.iter().filter_map(|p| p.deal_id.clone()).collect();
        if deal_ids.is_empty() {
            return Ok(Vec::new());
        }

        let deals: HashMap<String, Deal> = deal::Entity::find()
            .filter(deal::Column::Id.is_in(deal_ids))
            .filter(deal::Column::Status.eq(DealStatus::Published.as_ref()))
            .all(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询关联优惠失败: {}", e)))?
            .into_iter()
            .map(|m| (m.id.clone(), model_to_deal(m)))
            .collect();

        Ok(products
            .into_iter()
            .filter_map(|p| {
                let deal = deals.get(p.deal_id.as_deref()?)?.clone();
                Some((model_to_product(p), deal))
            })
            .collect())
    }

    pub async fn count_linked_products(&self) -> Result<u64> {
        marketplace_product::Entity::find()
            .filter(marketplace_product::Column::DealId.is_not_null())
            .count(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("统计商品缓存失败: {}", e)))
    }
}
