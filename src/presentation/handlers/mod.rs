// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 处理器模块
///
/// 爬虫监控与控制接口的请求处理函数
pub mod crawler_handler;
