// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 操作模块
///
/// 阶段操作与清理回调的显式注册表，以及内置操作
pub mod builtin;
pub mod registry;

pub use registry::{CleanupCallback, Operation, OperationRegistry};
