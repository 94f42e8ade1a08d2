// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CrawlerSettings;
use crate::domain::repositories::run_state_repository::RunStateRepository;
use crate::domain::repositories::DurableStores;
use crate::domain::services::notifications::CrawlerEvents;
use crate::operations::registry::OperationRegistry;
use crate::queue::dispatcher::Dispatcher;
use crate::queue::task_queue::TaskQueue;
use std::sync::Arc;
use std::time::Duration;

/// 运行选项
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// `run()` 未指定时的增量模式
    pub incremental: bool,
    /// 同步模式：`run()` 等待队列清空后才返回
    pub eager: bool,
    /// 同步模式的最长等待时间
    pub eager_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            incremental: true,
            eager: false,
            eager_timeout: Duration::from_secs(3600),
        }
    }
}

impl From<&CrawlerSettings> for RuntimeOptions {
    fn from(settings: &CrawlerSettings) -> Self {
        Self {
            incremental: settings.incremental,
            eager: settings.eager,
            eager_timeout: Duration::from_secs(settings.eager_timeout),
        }
    }
}

/// 爬虫运行时
///
/// 进程级共享资源：在启动时创建一次，显式传给每个爬虫，
/// 不使用全局变量。未配置运行状态存储时 `run_state` 为空，
/// 调度与监控查询进入降级模式。
pub struct CrawlerRuntime {
    pub dispatcher: Dispatcher,
    pub run_state: Option<Arc<dyn RunStateRepository>>,
    pub stores: DurableStores,
    pub notifications: Arc<CrawlerEvents>,
    pub registry: Arc<OperationRegistry>,
    pub options: RuntimeOptions,
}

impl CrawlerRuntime {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        run_state: Option<Arc<dyn RunStateRepository>>,
        stores: DurableStores,
        registry: Arc<OperationRegistry>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(queue),
            run_state,
            stores,
            notifications: Arc::new(CrawlerEvents::new()),
            registry,
            options,
        }
    }

    /// 使用外部创建的通知中心
    pub fn with_notifications(mut self, notifications: Arc<CrawlerEvents>) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        self.dispatcher.queue()
    }
}
