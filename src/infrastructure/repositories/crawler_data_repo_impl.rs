// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::crawler_data_repository::{CrawlerDataRepository, FlushSummary};
use crate::infrastructure::database::entities::{crawler_event, crawler_result, crawler_tag};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;

/// 爬虫数据仓库实现
#[derive(Clone)]
pub struct CrawlerDataRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CrawlerDataRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CrawlerDataRepository for CrawlerDataRepositoryImpl {
    async fn flush(&self, crawler: &str) -> Result<FlushSummary, RepositoryError> {
        let txn = self.db.begin().await?;

        let tags = crawler_tag::Entity::delete_many()
            .filter(crawler_tag::Column::Crawler.eq(crawler))
            .exec(&txn)
            .await?;
        let events = crawler_event::Entity::delete_many()
            .filter(crawler_event::Column::Crawler.eq(crawler))
            .exec(&txn)
            .await?;
        let results = crawler_result::Entity::delete_many()
            .filter(crawler_result::Column::Crawler.eq(crawler))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(FlushSummary {
            tags: tags.rows_affected,
            events: events.rows_affected,
            results: results.rows_affected,
        })
    }
}
