// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler::{CrawlerDefinition, MAX_DURATION_SECONDS};
use crate::domain::models::task::{CrawlState, Task};
use crate::infrastructure::metrics;
use crate::queue::task_queue::{QueueError, TaskQueue};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 延迟任务的最早执行时间
///
/// 延迟为零时返回空；超过上限的延迟按上限计算
fn not_before(delay: std::time::Duration) -> Option<DateTime<Utc>> {
    if delay.is_zero() {
        return None;
    }
    let delay = delay.min(std::time::Duration::from_secs(MAX_DURATION_SECONDS));
    let now = Utc::now();
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay))
}

/// 分发器
///
/// `dispatch(state, stage, data)` 的实现：构建任务并入队后立即返回
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn TaskQueue>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }

    /// 底层任务队列
    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        &self.queue
    }

    /// 分发一次阶段调用
    ///
    /// 爬虫配置了 `delay` 时，任务在 `now + delay` 之前不会被执行
    ///
    /// # 参数
    ///
    /// * `crawler` - 爬虫定义
    /// * `state` - 运行状态
    /// * `stage` - 目标阶段
    /// * `data` - 阶段输入数据
    pub async fn dispatch(
        &self,
        crawler: &CrawlerDefinition,
        state: CrawlState,
        stage: &str,
        data: Value,
    ) -> Result<Task, QueueError> {
        let mut task = Task::new(state, stage, data);
        task.not_before = not_before(crawler.delay);

        let task = self.queue.enqueue(task).await?;
        metrics::record_dispatch(&crawler.name, stage);
        debug!(
            crawler = %crawler.name,
            stage = %stage,
            task_id = %task.id,
            "Dispatched task"
        );
        Ok(task)
    }
}
