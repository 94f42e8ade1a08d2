// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，提供对具体技术的抽象和封装。
/// 基础设施层负责与外部系统的交互，包括数据库、缓存、存储、运行状态存储等。
///
/// 包含的子模块：
/// - 缓存（cache）：Redis客户端与运行状态存储
/// - 数据库（database）：数据库连接和实体映射
/// - 指标（metrics）：Prometheus 指标收集
/// - 仓库实现（repositories）：结果、标签和事件的持久化
///
/// 基础设施层依赖于领域层的抽象接口，领域层不感知具体实现。
pub mod cache;
pub mod database;
pub mod metrics;
pub mod repositories;
