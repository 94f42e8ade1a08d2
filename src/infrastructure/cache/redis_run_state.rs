// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::run_state_repository::{keys, RunStateRepository};
use crate::infrastructure::cache::redis_client::RedisClient;
use crate::utils::errors::RunStateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// 基于Redis的运行状态存储
///
/// 时间戳以 RFC 3339 字符串保存，计数器使用 `INCR`/`DECR`，
/// 所有键的过期时间等于爬虫的 `expire`
#[derive(Clone)]
pub struct RedisRunStateRepository {
    client: RedisClient,
}

impl RedisRunStateRepository {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    async fn counter(&self, key: String) -> Result<Option<i64>, RunStateError> {
        let value = self.client.get(&key).await.map_err(unavailable)?;
        value
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| RunStateError::Corrupt { key, value: v })
            })
            .transpose()
    }
}

fn unavailable(e: anyhow::Error) -> RunStateError {
    RunStateError::Unavailable(e.to_string())
}

fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl RunStateRepository for RedisRunStateRepository {
    async fn last_run(&self, crawler: &str) -> Result<Option<DateTime<Utc>>, RunStateError> {
        let key = keys::last_run(crawler);
        let value = self.client.get(&key).await.map_err(unavailable)?;
        value
            .map(|v| {
                DateTime::parse_from_rfc3339(v.trim())
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| RunStateError::Corrupt { key, value: v })
            })
            .transpose()
    }

    async fn set_last_run(
        &self,
        crawler: &str,
        at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), RunStateError> {
        self.client
            .set(&keys::last_run(crawler), &at.to_rfc3339(), ttl_seconds(ttl))
            .await
            .map_err(unavailable)
    }

    async fn active_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError> {
        self.counter(keys::active_ops(crawler)).await
    }

    async fn total_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError> {
        self.counter(keys::total_ops(crawler)).await
    }

    async fn begin_op(&self, crawler: &str, ttl: Duration) -> Result<i64, RunStateError> {
        self.client
            .incr_with_ttl(&keys::active_ops(crawler), ttl_seconds(ttl))
            .await
            .map_err(unavailable)
    }

    async fn finish_op(&self, crawler: &str, ttl: Duration) -> Result<(), RunStateError> {
        self.client
            .transfer_counter(
                &keys::active_ops(crawler),
                &keys::total_ops(crawler),
                ttl_seconds(ttl),
            )
            .await
            .map_err(unavailable)
    }

    async fn reset(&self, crawler: &str) -> Result<(), RunStateError> {
        self.client
            .del(&[
                keys::last_run(crawler),
                keys::active_ops(crawler),
                keys::total_ops(crawler),
            ])
            .await
            .map_err(unavailable)
    }
}
