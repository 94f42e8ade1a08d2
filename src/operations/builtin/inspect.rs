// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::context::StageContext;
use crate::operations::registry::Operation;
use crate::utils::errors::OperationError;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

/// 检查操作：记录输入数据并原样输出
pub struct Inspect;

#[async_trait]
impl Operation for Inspect {
    async fn execute(&self, ctx: StageContext, data: Value) -> Result<(), OperationError> {
        info!(
            crawler = %ctx.crawler().name,
            stage = %ctx.stage().name,
            "Inspect: {}",
            data
        );
        ctx.emit(data).await
    }
}
