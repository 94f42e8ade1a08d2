// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// Redis客户端以及基于Redis和进程内存的运行状态存储
pub mod memory_run_state;
pub mod redis_client;
pub mod redis_run_state;
