// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理服务配置，包括数据库、Redis、爬虫目录、工作器和调度器等配置
pub mod settings;
