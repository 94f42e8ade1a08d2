// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 爬虫定义配置错误
///
/// 在加载爬虫定义或首次解析清理回调时产生。
/// 出现此错误的爬虫不会被注册，但不影响其他爬虫加载。
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to read crawler definition {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed crawler definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid schedule '{0}', expected one of none, daily, weekly, monthly")]
    InvalidSchedule(String),

    #[error("Stage '{0}' is defined more than once")]
    DuplicateStage(String),

    #[error("'{field}' of {value}s exceeds the maximum of {max}s")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Stage '{stage}' references unregistered operation '{method}'")]
    UnknownOperation { stage: String, method: String },

    #[error("Stage '{stage}' lists unknown successor '{next}'")]
    UnknownSuccessor { stage: String, next: String },

    #[error("Init stage '{0}' is not part of the pipeline")]
    UnknownInitStage(String),

    #[error("Cleanup method '{0}' is not registered")]
    UnknownCleanup(String),

    #[error("Invalid crawler definition: {0}")]
    Invalid(String),
}

/// 运行状态存储错误
///
/// 查询类操作会把它降级为“未知”，而不是向上抛出。
#[derive(Error, Debug)]
pub enum RunStateError {
    #[error("Run-state store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt run-state value for '{key}': {value}")]
    Corrupt { key: String, value: String },
}

/// 阶段操作错误
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Operation failed: {0}")]
    Failed(String),

    #[error("Invalid operation input: {0}")]
    InvalidInput(String),

    #[error("Failed to emit stage output: {0}")]
    Emit(String),

    #[error("Operation panicked: {0}")]
    Panicked(String),
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("队列错误: {0}")]
    QueueError(String),

    #[error("仓库错误: {0}")]
    RepositoryError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}
