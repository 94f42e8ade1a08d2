// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::{Event, EventLevel};
use crate::domain::repositories::event_repository::EventRepository;
use crate::infrastructure::database::entities::crawler_event::{self, SeaEventLevel};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;

/// 爬虫事件仓库实现
#[derive(Clone)]
pub struct EventRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl EventRepositoryImpl {
    /// 创建新的事件仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<EventLevel> for SeaEventLevel {
    fn from(level: EventLevel) -> Self {
        match level {
            EventLevel::Warning => SeaEventLevel::Warning,
            EventLevel::Error => SeaEventLevel::Error,
        }
    }
}

impl From<SeaEventLevel> for EventLevel {
    fn from(level: SeaEventLevel) -> Self {
        match level {
            SeaEventLevel::Warning => EventLevel::Warning,
            SeaEventLevel::Error => EventLevel::Error,
        }
    }
}

#[async_trait]
impl EventRepository for EventRepositoryImpl {
    async fn create(&self, event: &Event) -> Result<Event, RepositoryError> {
        let active_model = crawler_event::ActiveModel {
            id: Set(event.id),
            crawler: Set(event.crawler.clone()),
            stage: Set(event.stage.clone()),
            run_id: Set(event.run_id),
            level: Set(event.level.into()),
            message: Set(event.message.clone()),
            created_at: Set(event.created_at.into()),
        };

        crawler_event::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(event.clone())
    }

    async fn find_by_crawler(
        &self,
        crawler: &str,
        limit: u64,
    ) -> Result<Vec<Event>, RepositoryError> {
        let models = crawler_event::Entity::find()
            .filter(crawler_event::Column::Crawler.eq(crawler))
            .order_by_desc(crawler_event::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

impl From<crawler_event::Model> for Event {
    fn from(model: crawler_event::Model) -> Self {
        Self {
            id: model.id,
            crawler: model.crawler,
            stage: model.stage,
            run_id: model.run_id,
            level: model.level.into(),
            message: model.message,
            created_at: model.created_at.into(),
        }
    }
}
