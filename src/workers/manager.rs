// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::crawler_manager::CrawlerManager;
use crate::workers::stage_worker::StageWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager {
    manager: Arc<CrawlerManager>,
    poll_interval: Duration,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(manager: Arc<CrawlerManager>, poll_interval: Duration) -> Self {
        Self {
            manager,
            poll_interval,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub async fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = StageWorker::new(self.manager.clone(), self.poll_interval);
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("Worker {} exited: {}", worker.name(), e);
                }
            });
            self.handles.push(handle);
        }
        info!("Started {} stage worker(s)", count);
    }

    /// 正在运行的工作进程数量
    pub fn worker_count(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// 立即停止所有工作进程
    ///
    /// 没有中途取消的语义：正在执行的操作被中止，其任务不会被确认
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        self.shutdown();
        info!("Workers shut down successfully");
    }
}
