// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use serde::Serialize;

/// 清空操作删除的记录数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushSummary {
    pub tags: u64,
    pub events: u64,
    pub results: u64,
}

/// 爬虫数据仓库特质
///
/// 覆盖一个爬虫的全部持久记录（标签、事件、结果）
#[async_trait]
pub trait CrawlerDataRepository: Send + Sync {
    /// 在单个事务中删除爬虫的所有标签、事件和结果
    ///
    /// 其他读者不会观察到只删除了一部分的中间状态；
    /// 其他爬虫的记录不受影响。
    async fn flush(&self, crawler: &str) -> Result<FlushSummary, RepositoryError>;
}
