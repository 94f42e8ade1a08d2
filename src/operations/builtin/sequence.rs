// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::context::StageContext;
use crate::operations::registry::Operation;
use crate::utils::errors::OperationError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// 数列操作
///
/// 按 `params.step`（默认1）从 `params.start` 到 `params.stop`（含）输出 `{number}`
pub struct Sequence;

#[derive(Debug, Deserialize)]
struct SequenceParams {
    #[serde(default)]
    start: i64,
    stop: i64,
    #[serde(default = "default_step")]
    step: i64,
}

fn default_step() -> i64 {
    1
}

impl SequenceParams {
    fn numbers(&self) -> Result<Vec<i64>, OperationError> {
        if self.step == 0 {
            return Err(OperationError::InvalidInput(
                "sequence step must not be zero".to_string(),
            ));
        }

        let mut numbers = Vec::new();
        let mut current = self.start;
        while (self.step > 0 && current <= self.stop) || (self.step < 0 && current >= self.stop) {
            numbers.push(current);
            current = match current.checked_add(self.step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(numbers)
    }
}

#[async_trait]
impl Operation for Sequence {
    async fn execute(&self, ctx: StageContext, _data: Value) -> Result<(), OperationError> {
        let params: SequenceParams = serde_json::from_value(ctx.params().clone())
            .map_err(|e| OperationError::InvalidInput(e.to_string()))?;

        for number in params.numbers()? {
            ctx.emit(json!({ "number": number })).await?;
        }
        Ok(())
    }
}
