// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::event::{Event, EventLevel};
use crate::domain::models::task::Task;
use crate::domain::services::context::StageContext;
use crate::domain::services::crawler_manager::CrawlerManager;
use crate::infrastructure::metrics::{self, OperationStatus};
use crate::queue::task_queue::TaskQueue;
use crate::utils::errors::{OperationError, WorkerError};
use crate::workers::worker::Worker;

/// 阶段工作器
///
/// 从共享队列拉取任务并执行对应阶段的操作。多个工作器并行运行，
/// 编排器不持有任何进程内锁。
pub struct StageWorker {
    manager: Arc<CrawlerManager>,
    queue: Arc<dyn TaskQueue>,
    poll_interval: Duration,
    worker_id: Uuid,
    name: String,
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl StageWorker {
    /// 创建新的阶段工作器实例
    ///
    /// # 参数
    ///
    /// * `manager` - 爬虫管理器，用于按名称查找爬虫
    /// * `poll_interval` - 队列为空时的等待间隔
    pub fn new(manager: Arc<CrawlerManager>, poll_interval: Duration) -> Self {
        let queue = manager.runtime().queue().clone();
        let worker_id = Uuid::new_v4();
        Self {
            manager,
            queue,
            poll_interval,
            worker_id,
            name: format!("stage-worker-{}", worker_id),
        }
    }

    /// 处理下一个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 处理了一个任务
    /// * `Ok(false)` - 队列中没有可执行的任务
    pub async fn process_next_task(&self) -> Result<bool, WorkerError> {
        let task = self
            .queue
            .dequeue(self.worker_id)
            .await
            .map_err(|e| WorkerError::QueueError(e.to_string()))?;

        match task {
            Some(task) => {
                self.process_task(task).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(
        skip(self, task),
        fields(task_id = %task.id, crawler = %task.crawler, stage = %task.stage, attempt = task.attempt)
    )]
    async fn process_task(&self, task: Task) -> Result<(), WorkerError> {
        let crawler = match self.manager.get(&task.crawler) {
            Some(crawler) => crawler,
            None => {
                warn!("Unknown crawler, dropping task");
                return self.fail(&task).await;
            }
        };
        let stage = match crawler.get(&task.stage) {
            Some(stage) => stage.clone(),
            None => {
                warn!("Unknown stage, dropping task");
                return self.fail(&task).await;
            }
        };

        let runtime = crawler.runtime().clone();
        let definition = crawler.definition().clone();
        let operation = match runtime.registry.operation(&stage.method) {
            Some(operation) => operation,
            None => {
                error!(method = %stage.method, "Operation is not registered");
                return self.fail(&task).await;
            }
        };

        let began = match &runtime.run_state {
            Some(store) => {
                if let Err(e) = store.set_last_run(&task.crawler, Utc::now(), definition.expire).await {
                    warn!("Failed to record last run: {}", e);
                }
                match store.begin_op(&task.crawler, definition.expire).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Failed to record operation start: {}", e);
                        false
                    }
                }
            }
            None => false,
        };

        let ctx = StageContext::new(
            definition.clone(),
            stage,
            task.state.clone(),
            runtime.clone(),
        );
        let started = Instant::now();
        let outcome = AssertUnwindSafe(operation.execute(ctx, task.data.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(OperationError::Panicked(panic_message(&*panic))));
        let elapsed = started.elapsed();

        if began {
            if let Some(store) = &runtime.run_state {
                if let Err(e) = store.finish_op(&task.crawler, definition.expire).await {
                    warn!("Failed to record operation completion: {}", e);
                }
            }
        }

        match outcome {
            Ok(()) => {
                metrics::record_operation(&task.crawler, OperationStatus::Success, elapsed);
                debug!(elapsed_ms = elapsed.as_millis() as u64, "Stage completed");
                self.queue
                    .complete(&task)
                    .await
                    .map_err(|e| WorkerError::QueueError(e.to_string()))
            }
            Err(e) => {
                metrics::record_operation(&task.crawler, OperationStatus::Failure, elapsed);
                error!("Stage operation failed: {}", e);

                let event = Event::new(
                    task.crawler.as_str(),
                    task.stage.as_str(),
                    Some(task.state.run_id),
                    EventLevel::Error,
                    e.to_string(),
                );
                if let Err(e) = runtime.stores.events.create(&event).await {
                    error!("Failed to record failure event: {}", e);
                }
                self.fail(&task).await
            }
        }
    }

    async fn fail(&self, task: &Task) -> Result<(), WorkerError> {
        self.queue
            .fail(task)
            .await
            .map_err(|e| WorkerError::QueueError(e.to_string()))
    }
}

#[async_trait]
impl Worker for StageWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Stage worker {} started", self.worker_id);

        loop {
            match self.process_next_task().await {
                Ok(true) => {}
                Ok(false) => sleep(self.poll_interval).await,
                Err(e) => {
                    error!("Error processing task: {}", e);
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
