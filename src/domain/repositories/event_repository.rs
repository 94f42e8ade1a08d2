// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::event::Event;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 爬虫事件仓库特质
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// 记录事件
    async fn create(&self, event: &Event) -> Result<Event, RepositoryError>;

    /// 查询爬虫最近的事件，按时间倒序
    async fn find_by_crawler(&self, crawler: &str, limit: u64)
        -> Result<Vec<Event>, RepositoryError>;
}
