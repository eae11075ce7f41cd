//! 商品优惠相关表
//!
//! - deals: 优惠信息与点击/浏览计数
//! - categories: 分类
//! - marketplace_products: 电商平台商品价格缓存

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deals::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deals::Title).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Deals::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Deals::Description).text().not_null())
                    .col(ColumnDef::new(Deals::ShortDesc).string_len(512).not_null())
                    .col(ColumnDef::new(Deals::CurrentPrice).double().null())
                    .col(ColumnDef::new(Deals::OriginalPrice).double().null())
                    .col(ColumnDef::new(Deals::Discount).integer().null())
                    .col(ColumnDef::new(Deals::ProductUrl).text().not_null())
                    .col(ColumnDef::new(Deals::AffiliateUrl).text().null())
                    .col(ColumnDef::new(Deals::Coupon).string_len(128).null())
                    .col(ColumnDef::new(Deals::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Deals::Status)
                            .string_len(16)
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(
                        ColumnDef::new(Deals::IsExpired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Deals::CategoryId).string_len(64).null())
                    .col(
                        ColumnDef::new(Deals::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Deals::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 导入去重按标题查找
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_title")
                    .table(Deals::Table)
                    .col(Deals::Title)
                    .to_owned(),
            )
            .await?;

        // 最近优惠查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deals_created_at")
                    .table(Deals::Table)
                    .col(Deals::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Categories::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Categories::Icon).string_len(32).null())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MarketplaceProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarketplaceProducts::ExternalId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MarketplaceProducts::Title)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MarketplaceProducts::Description).text().null())
                    .col(ColumnDef::new(MarketplaceProducts::CurrentPrice).double().null())
                    .col(ColumnDef::new(MarketplaceProducts::OriginalPrice).double().null())
                    .col(
                        ColumnDef::new(MarketplaceProducts::Currency)
                            .string_len(8)
                            .not_null()
                            .default("INR"),
                    )
                    .col(ColumnDef::new(MarketplaceProducts::ImageUrl).text().null())
                    .col(ColumnDef::new(MarketplaceProducts::ProductUrl).text().not_null())
                    .col(ColumnDef::new(MarketplaceProducts::DealId).string_len(64).null())
                    .col(
                        ColumnDef::new(MarketplaceProducts::LastCheckedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_marketplace_products_deal_id")
                    .table(MarketplaceProducts::Table)
                    .col(MarketplaceProducts::DealId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MarketplaceProducts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Deals {
    #[sea_orm(iden = "deals")]
    Table,
    Id,
    Title,
    Slug,
    Description,
    ShortDesc,
    CurrentPrice,
    OriginalPrice,
    Discount,
    ProductUrl,
    AffiliateUrl,
    Coupon,
    ImageUrl,
    Status,
    IsExpired,
    CategoryId,
    Clicks,
    Views,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    #[sea_orm(iden = "categories")]
    Table,
    Id,
    Name,
    Slug,
    Icon,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MarketplaceProducts {
    #[sea_orm(iden = "marketplace_products")]
    Table,
    ExternalId,
    Title,
    Description,
    CurrentPrice,
    OriginalPrice,
    Currency,
    ImageUrl,
    ProductUrl,
    DealId,
    LastCheckedAt,
}
