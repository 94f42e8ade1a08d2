// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 传输层错误
    #[error("Queue transport error: {0}")]
    Transport(String),

    /// 任务序列化失败
    #[error("Task serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 等待队列清空超时
    #[error("Timed out waiting for crawler '{crawler}' to drain ({pending} pending)")]
    Timeout { crawler: String, pending: u64 },
}

/// 任务队列特质
///
/// 分发传输的契约：任务从入队起处于待处理状态，直到 `complete` 或 `fail`。
/// 投递语义为至少一次。
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 入队任务
    async fn enqueue(&self, task: Task) -> Result<Task, QueueError>;

    /// 出队一个已到执行时间的任务
    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Task>, QueueError>;

    /// 完成任务
    async fn complete(&self, task: &Task) -> Result<(), QueueError>;

    /// 失败任务
    async fn fail(&self, task: &Task) -> Result<(), QueueError>;

    /// 爬虫待处理（排队中或执行中）的任务数
    async fn pending(&self, crawler: &str) -> Result<u64, QueueError>;

    /// 等待爬虫的待处理任务清空
    ///
    /// 默认实现以有上限的指数退避轮询 `pending`，不会忙等
    ///
    /// # 参数
    ///
    /// * `crawler` - 爬虫名称
    /// * `timeout` - 最长等待时间
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 已清空
    /// * `Err(QueueError::Timeout)` - 超时仍未清空
    async fn wait_idle(&self, crawler: &str, timeout: Duration) -> Result<(), QueueError> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(20))
            .with_multiplier(2.0)
            .with_max_interval(Duration::from_secs(1))
            .with_max_elapsed_time(Some(timeout))
            .build();

        backoff::future::retry(policy, || async {
            match self.pending(crawler).await {
                Ok(0) => Ok(()),
                Ok(pending) => Err(backoff::Error::transient(QueueError::Timeout {
                    crawler: crawler.to_string(),
                    pending,
                })),
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }
}

#[async_trait]
impl<T: TaskQueue + ?Sized> TaskQueue for Arc<T> {
    async fn enqueue(&self, task: Task) -> Result<Task, QueueError> {
        (**self).enqueue(task).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Task>, QueueError> {
        (**self).dequeue(worker_id).await
    }

    async fn complete(&self, task: &Task) -> Result<(), QueueError> {
        (**self).complete(task).await
    }

    async fn fail(&self, task: &Task) -> Result<(), QueueError> {
        (**self).fail(task).await
    }

    async fn pending(&self, crawler: &str) -> Result<u64, QueueError> {
        (**self).pending(crawler).await
    }

    async fn wait_idle(&self, crawler: &str, timeout: Duration) -> Result<(), QueueError> {
        (**self).wait_idle(crawler, timeout).await
    }
}
