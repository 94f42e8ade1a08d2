// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::crawler::{CleanupOutcome, Crawler};
use crate::domain::services::crawler_manager::CrawlerManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// 爬虫调度器
///
/// 定期运行到期的爬虫，并在它们空闲后调用一次清理回调
pub struct CrawlerScheduler {
    manager: Arc<CrawlerManager>,
    period: Duration,
    awaiting_cleanup: Vec<Arc<Crawler>>,
}

impl CrawlerScheduler {
    /// 创建新的爬虫调度器实例
    ///
    /// # 参数
    ///
    /// * `manager` - 爬虫管理器
    /// * `period` - 检查间隔
    pub fn new(manager: Arc<CrawlerManager>, period: Duration) -> Self {
        Self {
            manager,
            period,
            awaiting_cleanup: Vec::new(),
        }
    }

    /// 启动调度器后台任务
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Crawler scheduler started, tick every {:?}", self.period);

            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }

    /// 执行一次调度检查
    ///
    /// # 返回值
    ///
    /// 本次启动的爬虫数
    pub async fn tick(&mut self) -> usize {
        let started = self.manager.run_scheduled().await;
        let count = started.len();
        for crawler in started {
            if !self
                .awaiting_cleanup
                .iter()
                .any(|c| c.name() == crawler.name())
            {
                self.awaiting_cleanup.push(crawler);
            }
        }

        let mut still_waiting = Vec::new();
        for crawler in self.awaiting_cleanup.drain(..) {
            match crawler.cleanup().await {
                CleanupOutcome::Running | CleanupOutcome::Indeterminate => {
                    still_waiting.push(crawler)
                }
                outcome => {
                    debug!(crawler = %crawler.name(), ?outcome, "Cleanup settled");
                }
            }
        }
        self.awaiting_cleanup = still_waiting;

        if count > 0 {
            info!("Scheduler started {} crawler(s)", count);
        }
        count
    }

    /// 等待清理的爬虫数
    pub fn awaiting_cleanup(&self) -> usize {
        self.awaiting_cleanup.len()
    }
}
