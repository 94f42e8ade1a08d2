// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 阶段输出结果
///
/// 阶段每次输出时为每个后继阶段写入一条，记录输出来源阶段与目标阶段，
/// 供重放使用。只追加和整体删除，不做原地更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// 结果唯一标识符
    pub id: Uuid,
    /// 爬虫名称
    pub crawler: String,
    /// 产生输出的阶段
    pub stage: String,
    /// 接收输出的后继阶段
    pub next_stage: String,
    /// 运行标识
    pub run_id: Uuid,
    /// 输出数据
    pub data: Value,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl StageResult {
    /// 创建新的阶段输出结果
    pub fn new(
        crawler: impl Into<String>,
        stage: impl Into<String>,
        next_stage: impl Into<String>,
        run_id: Uuid,
        data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            crawler: crawler.into(),
            stage: stage.into(),
            next_stage: next_stage.into(),
            run_id,
            data,
            created_at: Utc::now(),
        }
    }
}
