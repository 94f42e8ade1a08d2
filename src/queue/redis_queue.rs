// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use crate::infrastructure::cache::redis_client::RedisClient;
use crate::queue::task_queue::{QueueError, TaskQueue};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use redis::Direction;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

const QUEUE_KEY: &str = "pipecrawl:queue";
const PROCESSING_KEY: &str = "pipecrawl:processing";
const DEAD_LETTER_KEY: &str = "pipecrawl:dead";

fn pending_key(crawler: &str) -> String {
    format!("pipecrawl:pending:{}", crawler)
}

fn transport(e: anyhow::Error) -> QueueError {
    QueueError::Transport(e.to_string())
}

/// 基于Redis列表的任务队列
///
/// 多进程部署时共享。任务以 JSON 保存在列表中，`LPUSH` 入队；出队时
/// 用 `LMOVE` 原子地移入处理中列表，完成或失败后才从处理中列表删除。
/// 每个爬虫的待处理数保存在单独的计数器中。
/// 尚未到执行时间的任务会被放回队尾，无法解析的任务移入死信列表。
#[derive(Clone)]
pub struct RedisTaskQueue {
    client: RedisClient,
    /// 本进程已取出任务的原始负载，按任务 ID 索引
    in_flight: Arc<DashMap<Uuid, String>>,
}

impl RedisTaskQueue {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// 把处理中列表里的任务放回队列
    ///
    /// 进程在任务完成前退出时，任务会留在处理中列表。启动时调用一次，
    /// 被放回的任务会再次投递，待处理计数不变。
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 放回的任务数
    pub async fn recover_in_flight(&self) -> Result<usize, QueueError> {
        let mut recovered = 0;
        while self
            .client
            .lmove(PROCESSING_KEY, QUEUE_KEY, Direction::Right, Direction::Right)
            .await
            .map_err(transport)?
            .is_some()
        {
            recovered += 1;
        }
        if recovered > 0 {
            info!(recovered, "Re-queued tasks left in processing");
        }
        Ok(recovered)
    }

    async fn settle(&self, crawler: &str) -> Result<(), QueueError> {
        let remaining = self
            .client
            .decr(&pending_key(crawler))
            .await
            .map_err(transport)?;
        if remaining < 0 {
            // 重复投递导致计数为负，修正为零
            self.client
                .del(&[pending_key(crawler)])
                .await
                .map_err(transport)?;
        }
        Ok(())
    }

    async fn acknowledge(&self, task: &Task) -> Result<(), QueueError> {
        if let Some((_, payload)) = self.in_flight.remove(&task.id) {
            self.client
                .lrem(PROCESSING_KEY, &payload)
                .await
                .map_err(transport)?;
        }
        self.settle(&task.crawler).await
    }

    /// 无法解析的负载移入死信列表，能识别出爬虫名称时同时扣减其待处理数
    async fn reject(&self, payload: &str, cause: serde_json::Error) -> QueueError {
        error!("Moving undecodable task to dead letters: {}", cause);
        if let Err(e) = self
            .client
            .relocate(PROCESSING_KEY, DEAD_LETTER_KEY, payload)
            .await
        {
            return transport(e);
        }

        let crawler = serde_json::from_str::<Value>(payload)
            .ok()
            .and_then(|v| v.get("crawler").and_then(Value::as_str).map(str::to_string));
        if let Some(crawler) = crawler {
            if let Err(e) = self.settle(&crawler).await {
                return e;
            }
        }
        QueueError::Serialization(cause)
    }
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    async fn enqueue(&self, task: Task) -> Result<Task, QueueError> {
        let payload = serde_json::to_string(&task)?;
        self.client
            .incr(&pending_key(&task.crawler))
            .await
            .map_err(transport)?;
        self.client
            .lpush(QUEUE_KEY, &payload)
            .await
            .map_err(transport)?;
        Ok(task)
    }

    async fn dequeue(&self, _worker_id: Uuid) -> Result<Option<Task>, QueueError> {
        let payload = match self
            .client
            .lmove(QUEUE_KEY, PROCESSING_KEY, Direction::Right, Direction::Left)
            .await
            .map_err(transport)?
        {
            Some(payload) => payload,
            None => return Ok(None),
        };

        let mut task: Task = match serde_json::from_str(&payload) {
            Ok(task) => task,
            Err(e) => return Err(self.reject(&payload, e).await),
        };
        if !task.is_ready(Utc::now()) {
            self.client
                .relocate(PROCESSING_KEY, QUEUE_KEY, &payload)
                .await
                .map_err(transport)?;
            return Ok(None);
        }

        self.in_flight.insert(task.id, payload);
        task.attempt += 1;
        Ok(Some(task))
    }

    async fn complete(&self, task: &Task) -> Result<(), QueueError> {
        self.acknowledge(task).await
    }

    async fn fail(&self, task: &Task) -> Result<(), QueueError> {
        self.acknowledge(task).await
    }

    async fn pending(&self, crawler: &str) -> Result<u64, QueueError> {
        let value = self
            .client
            .get(&pending_key(crawler))
            .await
            .map_err(transport)?;
        Ok(value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|v| v.max(0) as u64)
            .unwrap_or(0))
    }
}
