// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：爬虫定义、阶段、任务及持久记录
/// - 仓库接口（repositories）：持久存储和运行状态存储的抽象接口
/// - 服务（services）：爬虫编排与管理
pub mod models;
pub mod repositories;
pub mod services;
