// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler::{CrawlerDefinition, Schedule};
use crate::domain::models::stage::StageDefinition;
use crate::domain::models::task::CrawlState;
use crate::domain::repositories::crawler_data_repository::FlushSummary;
use crate::domain::services::notifications::CrawlerNotification;
use crate::domain::services::runtime::CrawlerRuntime;
use crate::queue::task_queue::QueueError;
use crate::utils::errors::{ConfigurationError, RepositoryError, RunStateError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 爬虫错误类型
#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Run-state error: {0}")]
    RunState(#[from] RunStateError),

    #[error("Crawler '{crawler}' has no stage '{stage}'")]
    UnknownStage { crawler: String, stage: String },

    #[error("Unknown crawler '{0}'")]
    UnknownCrawler(String),

    #[error("Crawler '{0}' is still running")]
    Running(String),
}

/// 清理调用的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// 没有配置清理回调
    NotConfigured,
    /// 自上次清理以来没有新的运行
    NotRun,
    /// 仍有任务在执行或排队
    Running,
    /// 运行状态无法确定
    Indeterminate,
    /// 清理回调未注册
    Unresolved,
    /// 清理回调执行成功
    Completed,
    /// 清理回调返回错误
    Failed,
}

/// 爬虫状态快照，供监控接口使用
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerStatus {
    pub name: String,
    pub description: String,
    pub category: String,
    pub schedule: Schedule,
    pub disabled: bool,
    pub is_running: bool,
    /// 累计操作数，为空表示无法确定
    pub op_count: Option<i64>,
    pub due: bool,
}

enum Activity {
    Idle,
    Busy,
    Unknown,
}

/// 爬虫编排器
///
/// 持有不可变的爬虫定义和共享的运行时。运行状态、结果、标签和事件
/// 归外部存储所有，爬虫只按名称引用它们。
pub struct Crawler {
    definition: Arc<CrawlerDefinition>,
    runtime: Arc<CrawlerRuntime>,
    cleanup_pending: AtomicBool,
}

impl Crawler {
    pub fn new(definition: CrawlerDefinition, runtime: Arc<CrawlerRuntime>) -> Self {
        Self {
            definition: Arc::new(definition),
            runtime,
            cleanup_pending: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &Arc<CrawlerDefinition> {
        &self.definition
    }

    pub fn runtime(&self) -> &Arc<CrawlerRuntime> {
        &self.runtime
    }

    /// 按名称查找阶段定义
    pub fn get(&self, stage: &str) -> Option<&StageDefinition> {
        self.definition.get(stage)
    }

    /// 当前是否到了调度时间
    pub async fn check_due(&self) -> bool {
        self.check_due_at(Utc::now()).await
    }

    /// 在给定时间是否到了调度时间
    ///
    /// 禁用或未调度时为假；从未运行过视为立即到期。
    /// 运行状态存储缺失或不可用时为假。只读，没有副作用。
    pub async fn check_due_at(&self, now: DateTime<Utc>) -> bool {
        if self.definition.disabled {
            return false;
        }
        let interval = match self.definition.schedule.interval() {
            Some(interval) => interval,
            None => return false,
        };
        let store = match &self.runtime.run_state {
            Some(store) => store,
            None => return false,
        };

        match store.last_run(self.name()).await {
            Ok(None) => true,
            Ok(Some(last_run)) => now >= last_run + interval,
            Err(e) => {
                warn!(crawler = %self.name(), "Cannot determine last run: {}", e);
                false
            }
        }
    }

    /// 活跃操作数是否大于零
    ///
    /// 分布式环境下只是估计值，调用方在采取行动前应重新检查
    pub async fn is_running(&self) -> bool {
        let store = match &self.runtime.run_state {
            Some(store) => store,
            None => return false,
        };

        match store.active_ops(self.name()).await {
            Ok(Some(active)) => active > 0,
            Ok(None) => false,
            Err(e) => {
                warn!(crawler = %self.name(), "Cannot determine active operations: {}", e);
                false
            }
        }
    }

    /// 累计操作数
    ///
    /// # 返回值
    ///
    /// * `Some(0)` - 从未运行
    /// * `Some(n)` - 累计操作数
    /// * `None` - 运行状态存储缺失或不可用
    pub async fn get_op_count(&self) -> Option<i64> {
        let store = self.runtime.run_state.as_ref()?;
        match store.total_ops(self.name()).await {
            Ok(total) => Some(total.unwrap_or(0)),
            Err(e) => {
                warn!(crawler = %self.name(), "Cannot determine operation count: {}", e);
                None
            }
        }
    }

    /// 启动一次运行
    ///
    /// 以空数据分发初始阶段，入队后立即返回；同步模式下等待
    /// 该爬虫的队列清空后才返回
    ///
    /// # 参数
    ///
    /// * `incremental` - 增量模式，为空时使用全局默认值
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlState)` - 本次运行的状态
    /// * `Err(CrawlerError)` - 分发失败或同步等待超时
    pub async fn run(&self, incremental: Option<bool>) -> Result<CrawlState, CrawlerError> {
        let init = self.definition.init_stage.as_str();
        if self.definition.get(init).is_none() {
            return Err(CrawlerError::UnknownStage {
                crawler: self.name().to_string(),
                stage: init.to_string(),
            });
        }

        let incremental = incremental.unwrap_or(self.runtime.options.incremental);
        let state = CrawlState::for_run(self.name(), incremental);

        info!(
            crawler = %self.name(),
            run_id = %state.run_id,
            incremental,
            "Starting crawler run"
        );
        let started_at = Utc::now();
        self.runtime
            .dispatcher
            .dispatch(&self.definition, state.clone(), init, json!({}))
            .await?;

        // 只有初始阶段入队成功才算一次运行
        if let Some(store) = &self.runtime.run_state {
            if let Err(e) = store
                .set_last_run(self.name(), started_at, self.definition.expire)
                .await
            {
                warn!(crawler = %self.name(), "Failed to record last run: {}", e);
            }
        }
        self.cleanup_pending.store(true, Ordering::SeqCst);

        if self.runtime.options.eager {
            self.runtime
                .queue()
                .wait_idle(self.name(), self.runtime.options.eager_timeout)
                .await?;
            debug!(crawler = %self.name(), "Eager run drained");
        }

        Ok(state)
    }

    /// 重放发往指定阶段的历史结果
    ///
    /// 每条结果分发一次，使用只携带爬虫名称的新状态。
    /// 目标操作必须是幂等的，这里不做去重。
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 分发的任务数
    pub async fn replay(&self, stage: &str) -> Result<usize, CrawlerError> {
        if self.definition.get(stage).is_none() {
            return Err(CrawlerError::UnknownStage {
                crawler: self.name().to_string(),
                stage: stage.to_string(),
            });
        }

        let results = self
            .runtime
            .stores
            .results
            .find_by_next_stage(self.name(), stage)
            .await?;

        let state = CrawlState::fresh(self.name());
        for result in &results {
            self.runtime
                .dispatcher
                .dispatch(&self.definition, state.clone(), stage, result.data.clone())
                .await?;
        }

        info!(
            crawler = %self.name(),
            stage = %stage,
            count = results.len(),
            "Replayed stage results"
        );
        Ok(results.len())
    }

    /// 清空爬虫的标签、事件和结果，然后通知订阅者
    ///
    /// 不修改运行状态计数器。失败时记录日志并返回空。
    pub async fn flush(&self) -> Option<FlushSummary> {
        let summary = match self.runtime.stores.crawler_data.flush(self.name()).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(crawler = %self.name(), "Failed to flush crawler data: {}", e);
                return None;
            }
        };

        info!(
            crawler = %self.name(),
            tags = summary.tags,
            events = summary.events,
            results = summary.results,
            "Flushed crawler data"
        );
        self.runtime
            .notifications
            .publish(CrawlerNotification::Flushed {
                crawler: self.definition.clone(),
            });
        Some(summary)
    }

    /// 删除爬虫的运行状态键
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已删除
    /// * `Ok(false)` - 没有运行状态存储
    /// * `Err(CrawlerError::Running)` - 爬虫仍在运行
    pub async fn reset_run_state(&self) -> Result<bool, CrawlerError> {
        let store = match &self.runtime.run_state {
            Some(store) => store,
            None => return Ok(false),
        };
        if self.is_running().await {
            return Err(CrawlerError::Running(self.name().to_string()));
        }
        store.reset(self.name()).await?;
        info!(crawler = %self.name(), "Reset run state");
        Ok(true)
    }

    /// 运行结束后最多执行一次清理回调
    ///
    /// 仍在运行或状态无法确定时拒绝执行，只记录日志
    pub async fn cleanup(&self) -> CleanupOutcome {
        let method = match &self.definition.cleanup_method {
            Some(method) => method,
            None => return CleanupOutcome::NotConfigured,
        };
        if !self.cleanup_pending.load(Ordering::SeqCst) {
            return CleanupOutcome::NotRun;
        }

        match self.activity().await {
            Activity::Idle => {}
            Activity::Busy => {
                debug!(crawler = %self.name(), "Crawler still running, cleanup deferred");
                return CleanupOutcome::Running;
            }
            Activity::Unknown => {
                warn!(crawler = %self.name(), "Run state indeterminate, cleanup skipped");
                return CleanupOutcome::Indeterminate;
            }
        }

        let callback = match self.runtime.registry.cleanup(method) {
            Some(callback) => callback,
            None => {
                let err = ConfigurationError::UnknownCleanup(method.clone());
                error!(crawler = %self.name(), "{}", err);
                self.cleanup_pending.store(false, Ordering::SeqCst);
                return CleanupOutcome::Unresolved;
            }
        };

        if self
            .cleanup_pending
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return CleanupOutcome::NotRun;
        }

        info!(crawler = %self.name(), method = %method, "Running cleanup");
        match callback.cleanup(self.definition.clone()).await {
            Ok(()) => CleanupOutcome::Completed,
            Err(e) => {
                error!(crawler = %self.name(), "Cleanup failed: {}", e);
                CleanupOutcome::Failed
            }
        }
    }

    /// 综合队列待处理数和活跃计数判断爬虫是否空闲
    async fn activity(&self) -> Activity {
        match self.runtime.queue().pending(self.name()).await {
            Ok(0) => {}
            Ok(_) => return Activity::Busy,
            Err(e) => {
                warn!(crawler = %self.name(), "Cannot read queue state: {}", e);
                return Activity::Unknown;
            }
        }

        let store = match &self.runtime.run_state {
            Some(store) => store,
            None => return Activity::Idle,
        };
        match store.active_ops(self.name()).await {
            Ok(Some(active)) if active > 0 => Activity::Busy,
            Ok(_) => Activity::Idle,
            Err(_) => Activity::Unknown,
        }
    }

    /// 当前状态快照
    pub async fn status(&self) -> CrawlerStatus {
        CrawlerStatus {
            name: self.definition.name.clone(),
            description: self.definition.description.clone(),
            category: self.definition.category.clone(),
            schedule: self.definition.schedule,
            disabled: self.definition.disabled,
            is_running: self.is_running().await,
            op_count: self.get_op_count().await,
            due: self.check_due().await,
        }
    }
}

#[cfg(test)]
#[path = "crawler_test.rs"]
mod tests;
