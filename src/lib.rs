// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 爬虫定义、编排器、阶段上下文以及仓库接口
pub mod domain;

/// 基础设施模块
///
/// 数据库、Redis运行状态存储和指标
pub mod infrastructure;

/// 操作模块
///
/// 可插拔的阶段操作注册表与内置操作
pub mod operations;

/// 表示层模块
///
/// 监控与控制接口
pub mod presentation;

/// 队列模块
///
/// 任务队列、分发器和调度器
pub mod queue;

/// 工具模块
///
/// 错误类型与日志初始化
pub mod utils;

/// 工作器模块
///
/// 从队列取出阶段任务并执行
pub mod workers;
