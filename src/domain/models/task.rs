// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 运行状态
///
/// 随每次分发传递的状态。`run()` 会确定增量标志；`replay()` 只携带
/// 爬虫名称，增量标志被有意丢弃，重放总是完整的重新处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// 爬虫名称
    pub crawler: String,
    /// 增量标志，重放时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental: Option<bool>,
    /// 运行标识，同一次运行产生的所有任务共享
    pub run_id: Uuid,
}

impl CrawlState {
    /// 为一次运行创建状态
    pub fn for_run(crawler: impl Into<String>, incremental: bool) -> Self {
        Self {
            crawler: crawler.into(),
            incremental: Some(incremental),
            run_id: Uuid::new_v4(),
        }
    }

    /// 为重放创建只携带爬虫名称的新状态
    pub fn fresh(crawler: impl Into<String>) -> Self {
        Self {
            crawler: crawler.into(),
            incremental: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// 是否处于增量模式
    pub fn is_incremental(&self) -> bool {
        self.incremental.unwrap_or(false)
    }
}

/// 分发任务
///
/// 队列中的一个工作单元：对某个爬虫的某个阶段的一次调用。
/// 投递语义为至少一次。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 爬虫名称
    pub crawler: String,
    /// 目标阶段名称
    pub stage: String,
    /// 运行状态
    pub state: CrawlState,
    /// 阶段输入数据
    pub data: Value,
    /// 已尝试次数
    pub attempt: u32,
    /// 最早可执行时间，用于任务间延迟
    pub not_before: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// 创建一个新的分发任务
    ///
    /// # 参数
    ///
    /// * `state` - 运行状态
    /// * `stage` - 目标阶段名称
    /// * `data` - 阶段输入数据
    pub fn new(state: CrawlState, stage: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            crawler: state.crawler.clone(),
            stage: stage.into(),
            state,
            data,
            attempt: 0,
            not_before: None,
            created_at: Utc::now(),
        }
    }

    /// 任务在给定时间是否可以执行
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |t| t <= now)
    }
}
