// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 创建爬虫标签表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlerTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlerTags::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlerTags::Crawler).string().not_null())
                    .col(ColumnDef::new(CrawlerTags::Key).string().not_null())
                    .col(ColumnDef::new(CrawlerTags::Value).json().not_null())
                    .col(
                        ColumnDef::new(CrawlerTags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CrawlerTags::ExpiresAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawler_tags_key")
                    .table(CrawlerTags::Table)
                    .col(CrawlerTags::Crawler)
                    .col(CrawlerTags::Key)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlerTags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlerTags {
    Table,
    Id,
    Crawler,
    Key,
    Value,
    CreatedAt,
    ExpiresAt,
}
