// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::context::StageContext;
use crate::operations::registry::Operation;
use crate::utils::errors::OperationError;
use async_trait::async_trait;
use serde_json::{json, Value};

/// 种子操作
///
/// 为 `params.urls` 中的每个地址（或单个 `params.url`）输出一条 `{url}`
pub struct Seed;

fn seed_urls(params: &Value) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    if let Some(url) = params.get("url").and_then(Value::as_str) {
        urls.push(url.to_string());
    }
    if let Some(list) = params.get("urls").and_then(Value::as_array) {
        urls.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
    }
    urls
}

#[async_trait]
impl Operation for Seed {
    async fn execute(&self, ctx: StageContext, _data: Value) -> Result<(), OperationError> {
        let urls = seed_urls(ctx.params());
        if urls.is_empty() {
            return Err(OperationError::InvalidInput(
                "seed requires params.url or params.urls".to_string(),
            ));
        }

        for url in urls {
            ctx.emit(json!({ "url": url })).await?;
        }
        Ok(())
    }
}
