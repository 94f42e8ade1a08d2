// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 分发传输（任务队列）、分发器和定时调度器
pub mod dispatcher;
pub mod memory_queue;
pub mod redis_queue;
pub mod scheduler;
pub mod task_queue;
