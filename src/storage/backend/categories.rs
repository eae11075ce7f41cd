use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::SeaOrmStorage;
use crate::errors::{DealError, Result};

use migration::entities::category;

impl SeaOrmStorage {
    /// 按 slug 获取分类 id，不存在时创建
    pub async fn ensure_category(&self, slug: &str, name: &str, icon: Option<&str>) -> Result<String> {
        if let Some(existing) = self.find_category_id(slug).await? {
            return Ok(existing);
        }

        let model = category::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            icon: Set(icon.map(str::to_string)),
            created_at: Set(Utc::now()),
        };

        // 并发创建时由唯一索引兜底
        category::Entity::insert(model)
            .on_conflict(OnConflict::column(category::Column::Slug).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("创建分类失败: {}", e)))?;

        self.find_category_id(slug)
            .await?
            .ok_or_else(|| DealError::database_operation(format!("分类创建后未找到: {}", slug)))
    }

    async fn find_category_id(&self, slug: &str) -> Result<Option<String>> {
        let model = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(|e| DealError::database_operation(format!("查询分类失败: {}", e)))?;
        Ok(model.map(|m| m.id))
    }
}
