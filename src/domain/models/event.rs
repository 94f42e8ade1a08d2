// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 事件级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// 警告
    #[default]
    Warning,
    /// 错误
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventLevel::Warning => write!(f, "warning"),
            EventLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for EventLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(EventLevel::Warning),
            "error" => Ok(EventLevel::Error),
            _ => Err(()),
        }
    }
}

/// 爬虫事件
///
/// 阶段执行期间记录的警告或错误日志
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// 事件唯一标识符
    pub id: Uuid,
    /// 爬虫名称
    pub crawler: String,
    /// 产生事件的阶段
    pub stage: String,
    /// 运行标识
    pub run_id: Option<Uuid>,
    /// 级别
    pub level: EventLevel,
    /// 消息
    pub message: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// 创建新事件
    pub fn new(
        crawler: impl Into<String>,
        stage: impl Into<String>,
        run_id: Option<Uuid>,
        level: EventLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            crawler: crawler.into(),
            stage: stage.into(),
            run_id,
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
