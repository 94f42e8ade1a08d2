// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::run_state_repository::RunStateRepository;
use crate::utils::errors::RunStateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy)]
struct RunCounters {
    last_run: Option<DateTime<Utc>>,
    active: Option<i64>,
    total: Option<i64>,
}

/// 进程内运行状态存储
///
/// 单进程部署和测试使用。每个爬虫的计数器放在同一个条目里，
/// 条目锁保证 `finish_op` 的两次更新一起生效。不实现键过期。
#[derive(Debug, Default)]
pub struct InMemoryRunStateRepository {
    crawlers: DashMap<String, RunCounters>,
}

impl InMemoryRunStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接设置活跃操作数，用于修正漂移的计数
    pub fn set_active_ops(&self, crawler: &str, value: i64) {
        self.crawlers.entry(crawler.to_string()).or_default().active = Some(value);
    }
}

#[async_trait]
impl RunStateRepository for InMemoryRunStateRepository {
    async fn last_run(&self, crawler: &str) -> Result<Option<DateTime<Utc>>, RunStateError> {
        Ok(self.crawlers.get(crawler).and_then(|c| c.last_run))
    }

    async fn set_last_run(
        &self,
        crawler: &str,
        at: DateTime<Utc>,
        _ttl: Duration,
    ) -> Result<(), RunStateError> {
        self.crawlers.entry(crawler.to_string()).or_default().last_run = Some(at);
        Ok(())
    }

    async fn active_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError> {
        Ok(self.crawlers.get(crawler).and_then(|c| c.active))
    }

    async fn total_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError> {
        Ok(self.crawlers.get(crawler).and_then(|c| c.total))
    }

    async fn begin_op(&self, crawler: &str, _ttl: Duration) -> Result<i64, RunStateError> {
        let mut entry = self.crawlers.entry(crawler.to_string()).or_default();
        let active = entry.active.unwrap_or(0) + 1;
        entry.active = Some(active);
        Ok(active)
    }

    async fn finish_op(&self, crawler: &str, _ttl: Duration) -> Result<(), RunStateError> {
        let mut entry = self.crawlers.entry(crawler.to_string()).or_default();
        entry.active = Some(entry.active.unwrap_or(0) - 1);
        entry.total = Some(entry.total.unwrap_or(0) + 1);
        Ok(())
    }

    async fn reset(&self, crawler: &str) -> Result<(), RunStateError> {
        self.crawlers.remove(crawler);
        Ok(())
    }
}
