// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 爬虫定义、阶段定义、分发任务以及结果、标签和事件记录
pub mod crawler;
pub mod crawler_result;
pub mod event;
pub mod stage;
pub mod tag;
pub mod task;
