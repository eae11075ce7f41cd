use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub short_desc: String,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    /// 折扣百分比
    pub discount: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub product_url: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub affiliate_url: Option<String>,
    pub coupon: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    /// DRAFT / PUBLISHED / ARCHIVED
    pub status: String,
    pub is_expired: bool,
    pub category_id: Option<String>,
    pub clicks: i64,
    pub views: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
