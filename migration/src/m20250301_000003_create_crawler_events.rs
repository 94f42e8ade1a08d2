// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 创建爬虫事件日志表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlerEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlerEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlerEvents::Crawler).string().not_null())
                    .col(ColumnDef::new(CrawlerEvents::Stage).string().not_null())
                    .col(ColumnDef::new(CrawlerEvents::RunId).uuid())
                    .col(
                        ColumnDef::new(CrawlerEvents::Level)
                            .string()
                            .not_null()
                            .default("warning"),
                    )
                    .col(ColumnDef::new(CrawlerEvents::Message).text().not_null())
                    .col(
                        ColumnDef::new(CrawlerEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawler_events_crawler")
                    .table(CrawlerEvents::Table)
                    .col(CrawlerEvents::Crawler)
                    .col(CrawlerEvents::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlerEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlerEvents {
    Table,
    Id,
    Crawler,
    Stage,
    RunId,
    Level,
    Message,
    CreatedAt,
}
