// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tag::Tag;
use crate::domain::repositories::tag_repository::TagRepository;
use crate::infrastructure::database::entities::crawler_tag;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use std::sync::Arc;

/// 爬虫标签仓库实现
#[derive(Clone)]
pub struct TagRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl TagRepositoryImpl {
    /// 创建新的标签仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for TagRepositoryImpl {
    async fn set(&self, tag: &Tag) -> Result<Tag, RepositoryError> {
        let txn = self.db.begin().await?;

        crawler_tag::Entity::delete_many()
            .filter(crawler_tag::Column::Crawler.eq(tag.crawler.as_str()))
            .filter(crawler_tag::Column::Key.eq(tag.key.as_str()))
            .exec(&txn)
            .await?;

        let active_model = crawler_tag::ActiveModel {
            id: Set(tag.id),
            crawler: Set(tag.crawler.clone()),
            key: Set(tag.key.clone()),
            value: Set(tag.value.clone()),
            created_at: Set(tag.created_at.into()),
            expires_at: Set(tag.expires_at.map(Into::into)),
        };
        crawler_tag::Entity::insert(active_model).exec(&txn).await?;

        txn.commit().await?;
        Ok(tag.clone())
    }

    async fn find(&self, crawler: &str, key: &str) -> Result<Option<Tag>, RepositoryError> {
        let models = crawler_tag::Entity::find()
            .filter(crawler_tag::Column::Crawler.eq(crawler))
            .filter(crawler_tag::Column::Key.eq(key))
            .all(self.db.as_ref())
            .await?;

        // 过期判断在内存中进行，不依赖各数据库的时间比较语义
        let now = Utc::now();
        let tag = models
            .into_iter()
            .map(Tag::from)
            .filter(|tag| !tag.is_expired(now))
            .max_by_key(|tag| tag.created_at);

        Ok(tag)
    }
}

impl From<crawler_tag::Model> for Tag {
    fn from(model: crawler_tag::Model) -> Self {
        Self {
            id: model.id,
            crawler: model.crawler,
            key: model.key,
            value: model.value,
            created_at: model.created_at.into(),
            expires_at: model.expires_at.map(Into::into),
        }
    }
}
