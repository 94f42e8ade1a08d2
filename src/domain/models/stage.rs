// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 阶段定义
///
/// 爬虫处理图中的一个节点：包装一个可插拔的操作，并通过
/// 后继阶段名称把输出传递给下游阶段。加载后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// 阶段名称，在同一爬虫内唯一
    pub name: String,
    /// 操作标识，必须能在操作注册表中解析
    pub method: String,
    /// 传给操作的参数，对编排器不透明
    pub params: Value,
    /// 后继阶段名称，有序且不重复
    pub next: Vec<String>,
}

impl StageDefinition {
    /// 创建新的阶段定义
    ///
    /// 后继列表会去重并保留首次出现的顺序；空参数归一为空对象
    pub fn new(name: impl Into<String>, method: impl Into<String>, params: Value, next: Vec<String>) -> Self {
        let mut ordered: Vec<String> = Vec::with_capacity(next.len());
        for stage in next {
            if !ordered.contains(&stage) {
                ordered.push(stage);
            }
        }

        let params = match params {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        Self {
            name: name.into(),
            method: method.into(),
            params,
            next: ordered,
        }
    }

    /// 是否为终止阶段（没有后继）
    pub fn is_terminal(&self) -> bool {
        self.next.is_empty()
    }
}
