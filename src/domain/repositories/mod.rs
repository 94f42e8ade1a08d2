// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 结果仓库（result_repository）：阶段输出结果，供重放使用
/// - 标签仓库（tag_repository）：爬虫级别的键值记录
/// - 事件仓库（event_repository）：阶段执行期间的警告和错误
/// - 爬虫数据仓库（crawler_data_repository）：原子清空一个爬虫的持久记录
/// - 运行状态仓库（run_state_repository）：调度和监控计数器
pub mod crawler_data_repository;
pub mod event_repository;
pub mod result_repository;
pub mod run_state_repository;
pub mod tag_repository;

use std::sync::Arc;

/// 持久存储句柄集合
#[derive(Clone)]
pub struct DurableStores {
    pub results: Arc<dyn result_repository::ResultRepository>,
    pub tags: Arc<dyn tag_repository::TagRepository>,
    pub events: Arc<dyn event_repository::EventRepository>,
    pub crawler_data: Arc<dyn crawler_data_repository::CrawlerDataRepository>,
}
