// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::models::crawler::MAX_DURATION_SECONDS;

/// 存活时间超过上限时按上限计算
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    let ttl = ttl.min(Duration::from_secs(MAX_DURATION_SECONDS));
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
}

/// 爬虫标签
///
/// 爬虫级别的键值记录，通常用于增量模式下标记已处理过的内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// 标签唯一标识符
    pub id: Uuid,
    /// 爬虫名称
    pub crawler: String,
    /// 键
    pub key: String,
    /// 值
    pub value: Value,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 过期时间，过期后视为不存在
    pub expires_at: Option<DateTime<Utc>>,
}

impl Tag {
    /// 创建新标签
    ///
    /// # 参数
    ///
    /// * `crawler` - 爬虫名称
    /// * `key` - 键
    /// * `value` - 值
    /// * `ttl` - 存活时间，为空表示永不过期；超过上限的值按上限处理
    pub fn new(
        crawler: impl Into<String>,
        key: impl Into<String>,
        value: Value,
        ttl: Option<Duration>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            crawler: crawler.into(),
            key: key.into(),
            value,
            created_at: now,
            expires_at: ttl.and_then(|ttl| expiry_after(now, ttl)),
        }
    }

    /// 在给定时间是否已过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}
