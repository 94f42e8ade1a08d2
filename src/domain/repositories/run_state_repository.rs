// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::RunStateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// 运行状态键
///
/// 每个爬虫一个命名空间：`<name>:last_run`、`<name>`（活跃操作数）、
/// `<name>:total_ops`（累计操作数）
pub mod keys {
    pub fn last_run(crawler: &str) -> String {
        format!("{}:last_run", crawler)
    }

    pub fn active_ops(crawler: &str) -> String {
        crawler.to_string()
    }

    pub fn total_ops(crawler: &str) -> String {
        format!("{}:total_ops", crawler)
    }
}

/// 运行状态仓库特质
///
/// 快速键值存储上的调度与监控计数器。计数器的增减必须是原子的，
/// 多个工作器会同时更新同一个爬虫的计数。
#[async_trait]
pub trait RunStateRepository: Send + Sync {
    /// 最近一次运行时间，从未运行时为空
    async fn last_run(&self, crawler: &str) -> Result<Option<DateTime<Utc>>, RunStateError>;

    /// 记录运行时间
    ///
    /// # 参数
    ///
    /// * `crawler` - 爬虫名称
    /// * `at` - 运行时间
    /// * `ttl` - 键的过期时间
    async fn set_last_run(
        &self,
        crawler: &str,
        at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), RunStateError>;

    /// 活跃操作数，键不存在时为空
    async fn active_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError>;

    /// 累计操作数，键不存在时为空
    async fn total_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError>;

    /// 操作开始：活跃数加一，返回加一后的值
    async fn begin_op(&self, crawler: &str, ttl: Duration) -> Result<i64, RunStateError>;

    /// 操作结束：活跃数减一并且累计数加一，两者一起原子生效
    async fn finish_op(&self, crawler: &str, ttl: Duration) -> Result<(), RunStateError>;

    /// 删除爬虫的全部运行状态键
    async fn reset(&self, crawler: &str) -> Result<(), RunStateError>;
}

#[async_trait]
impl<T: RunStateRepository + ?Sized> RunStateRepository for Arc<T> {
    async fn last_run(&self, crawler: &str) -> Result<Option<DateTime<Utc>>, RunStateError> {
        (**self).last_run(crawler).await
    }

    async fn set_last_run(
        &self,
        crawler: &str,
        at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), RunStateError> {
        (**self).set_last_run(crawler, at, ttl).await
    }

    async fn active_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError> {
        (**self).active_ops(crawler).await
    }

    async fn total_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError> {
        (**self).total_ops(crawler).await
    }

    async fn begin_op(&self, crawler: &str, ttl: Duration) -> Result<i64, RunStateError> {
        (**self).begin_op(crawler, ttl).await
    }

    async fn finish_op(&self, crawler: &str, ttl: Duration) -> Result<(), RunStateError> {
        (**self).finish_op(crawler, ttl).await
    }

    async fn reset(&self, crawler: &str) -> Result<(), RunStateError> {
        (**self).reset(crawler).await
    }
}
