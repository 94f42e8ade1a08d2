// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 创建阶段输出结果表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlerResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlerResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlerResults::Crawler).string().not_null())
                    .col(ColumnDef::new(CrawlerResults::Stage).string().not_null())
                    .col(ColumnDef::new(CrawlerResults::NextStage).string().not_null())
                    .col(ColumnDef::new(CrawlerResults::RunId).uuid().not_null())
                    .col(ColumnDef::new(CrawlerResults::Data).json().not_null())
                    .col(
                        ColumnDef::new(CrawlerResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Replay looks results up by the stage they were sent to
        manager
            .create_index(
                Index::create()
                    .name("idx_crawler_results_next_stage")
                    .table(CrawlerResults::Table)
                    .col(CrawlerResults::Crawler)
                    .col(CrawlerResults::NextStage)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlerResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlerResults {
    Table,
    Id,
    Crawler,
    Stage,
    NextStage,
    RunId,
    Data,
    CreatedAt,
}
