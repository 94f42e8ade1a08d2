// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use crate::queue::task_queue::{QueueError, TaskQueue};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

/// 进程内任务队列
///
/// 先进先出，跳过尚未到 `not_before` 的任务。每个爬虫的待处理计数
/// 归零时通过 `Notify` 唤醒 `wait_idle`，不需要轮询。
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    tasks: Mutex<VecDeque<Task>>,
    pending: DashMap<String, u64>,
    idle: Notify,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前排队（未出队）的任务数
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    fn settle(&self, crawler: &str) {
        let drained = match self.pending.get_mut(crawler) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };
        if drained {
            self.idle.notify_waiters();
        }
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: Task) -> Result<Task, QueueError> {
        *self.pending.entry(task.crawler.clone()).or_insert(0) += 1;
        self.tasks.lock().push_back(task.clone());
        Ok(task)
    }

    async fn dequeue(&self, _worker_id: Uuid) -> Result<Option<Task>, QueueError> {
        let now = Utc::now();
        let mut tasks = self.tasks.lock();
        let position = tasks.iter().position(|task| task.is_ready(now));
        Ok(position.and_then(|index| tasks.remove(index)).map(|mut task| {
            task.attempt += 1;
            task
        }))
    }

    async fn complete(&self, task: &Task) -> Result<(), QueueError> {
        self.settle(&task.crawler);
        Ok(())
    }

    async fn fail(&self, task: &Task) -> Result<(), QueueError> {
        self.settle(&task.crawler);
        Ok(())
    }

    async fn pending(&self, crawler: &str) -> Result<u64, QueueError> {
        Ok(self.pending.get(crawler).map(|count| *count).unwrap_or(0))
    }

    async fn wait_idle(&self, crawler: &str, timeout: Duration) -> Result<(), QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // 先注册再检查，避免错过检查与等待之间的通知
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let pending = self.pending(crawler).await?;
            if pending == 0 {
                return Ok(());
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(QueueError::Timeout {
                    crawler: crawler.to_string(),
                    pending: self.pending(crawler).await?,
                });
            }
        }
    }
}
