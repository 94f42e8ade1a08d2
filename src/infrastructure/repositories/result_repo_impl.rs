// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler_result::StageResult;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::infrastructure::database::entities::crawler_result;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;

/// 阶段输出结果仓库实现
#[derive(Clone)]
pub struct ResultRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ResultRepositoryImpl {
    /// 创建新的结果仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultRepository for ResultRepositoryImpl {
    async fn create(&self, result: &StageResult) -> Result<StageResult, RepositoryError> {
        let active_model = crawler_result::ActiveModel {
            id: Set(result.id),
            crawler: Set(result.crawler.clone()),
            stage: Set(result.stage.clone()),
            next_stage: Set(result.next_stage.clone()),
            run_id: Set(result.run_id),
            data: Set(result.data.clone()),
            created_at: Set(result.created_at.into()),
        };

        crawler_result::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(result.clone())
    }

    async fn find_by_next_stage(
        &self,
        crawler: &str,
        next_stage: &str,
    ) -> Result<Vec<StageResult>, RepositoryError> {
        let models = crawler_result::Entity::find()
            .filter(crawler_result::Column::Crawler.eq(crawler))
            .filter(crawler_result::Column::NextStage.eq(next_stage))
            .order_by_asc(crawler_result::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_by_crawler(&self, crawler: &str) -> Result<u64, RepositoryError> {
        let count = crawler_result::Entity::find()
            .filter(crawler_result::Column::Crawler.eq(crawler))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}

impl From<crawler_result::Model> for StageResult {
    fn from(model: crawler_result::Model) -> Self {
        Self {
            id: model.id,
            crawler: model.crawler,
            stage: model.stage,
            next_stage: model.next_stage,
            run_id: model.run_id,
            data: model.data,
            created_at: model.created_at.into(),
        }
    }
}
