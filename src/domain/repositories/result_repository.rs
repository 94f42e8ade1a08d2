// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler_result::StageResult;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use std::sync::Arc;

/// 阶段输出结果仓库特质
///
/// 结果只追加，由 `flush` 整体删除
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// 保存一条阶段输出结果
    async fn create(&self, result: &StageResult) -> Result<StageResult, RepositoryError>;

    /// 查找发往指定阶段的所有结果，按创建时间升序
    ///
    /// # 参数
    ///
    /// * `crawler` - 爬虫名称
    /// * `next_stage` - 接收输出的阶段
    async fn find_by_next_stage(
        &self,
        crawler: &str,
        next_stage: &str,
    ) -> Result<Vec<StageResult>, RepositoryError>;

    /// 统计爬虫的结果数量
    async fn count_by_crawler(&self, crawler: &str) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl<T: ResultRepository + ?Sized> ResultRepository for Arc<T> {
    async fn create(&self, result: &StageResult) -> Result<StageResult, RepositoryError> {
        (**self).create(result).await
    }

    async fn find_by_next_stage(
        &self,
        crawler: &str,
        next_stage: &str,
    ) -> Result<Vec<StageResult>, RepositoryError> {
        (**self).find_by_next_stage(crawler, next_stage).await
    }

    async fn count_by_crawler(&self, crawler: &str) -> Result<u64, RepositoryError> {
        (**self).count_by_crawler(crawler).await
    }
}
