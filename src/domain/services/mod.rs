// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 爬虫编排（crawler）：调度判断、运行、重放、清空和清理
/// - 爬虫管理（crawler_manager）：加载定义并按名称查找
/// - 阶段上下文（context）：操作执行时的输出、标签和事件接口
/// - 运行时（runtime）：进程级共享资源
/// - 通知（notifications）：清空通知的发布/订阅
pub mod context;
pub mod crawler;
pub mod crawler_manager;
pub mod notifications;
pub mod runtime;
