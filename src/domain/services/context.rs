// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler::CrawlerDefinition;
use crate::domain::models::crawler_result::StageResult;
use crate::domain::models::event::{Event, EventLevel};
use crate::domain::models::stage::StageDefinition;
use crate::domain::models::tag::Tag;
use crate::domain::models::task::CrawlState;
use crate::domain::services::runtime::CrawlerRuntime;
use crate::utils::errors::OperationError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// 阶段上下文
///
/// 操作执行时可用的全部信息：爬虫定义、当前阶段、运行状态，
/// 以及输出、标签和事件接口
#[derive(Clone)]
pub struct StageContext {
    crawler: Arc<CrawlerDefinition>,
    stage: StageDefinition,
    state: CrawlState,
    runtime: Arc<CrawlerRuntime>,
}

impl StageContext {
    pub fn new(
        crawler: Arc<CrawlerDefinition>,
        stage: StageDefinition,
        state: CrawlState,
        runtime: Arc<CrawlerRuntime>,
    ) -> Self {
        Self {
            crawler,
            stage,
            state,
            runtime,
        }
    }

    pub fn crawler(&self) -> &CrawlerDefinition {
        &self.crawler
    }

    pub fn stage(&self) -> &StageDefinition {
        &self.stage
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// 阶段参数
    pub fn params(&self) -> &Value {
        &self.stage.params
    }

    pub fn run_id(&self) -> Uuid {
        self.state.run_id
    }

    pub fn is_incremental(&self) -> bool {
        self.state.is_incremental()
    }

    pub fn is_stealthy(&self) -> bool {
        self.crawler.stealthy
    }

    /// 输出数据
    ///
    /// 为每个后继阶段保存一条结果并分发该后继阶段。
    /// 没有后继的阶段不记录也不分发。
    pub async fn emit(&self, data: Value) -> Result<(), OperationError> {
        for next in &self.stage.next {
            let result = StageResult::new(
                self.crawler.name.as_str(),
                self.stage.name.as_str(),
                next.as_str(),
                self.state.run_id,
                data.clone(),
            );
            self.runtime
                .stores
                .results
                .create(&result)
                .await
                .map_err(|e| OperationError::Emit(e.to_string()))?;

            self.runtime
                .dispatcher
                .dispatch(&self.crawler, self.state.clone(), next, data.clone())
                .await
                .map_err(|e| OperationError::Emit(e.to_string()))?;
        }
        Ok(())
    }

    /// 写入标签，过期时间为爬虫的 `expire`
    pub async fn set_tag(&self, key: &str, value: Value) -> Result<(), OperationError> {
        let tag = Tag::new(
            self.crawler.name.as_str(),
            key,
            value,
            Some(self.crawler.expire),
        );
        self.runtime
            .stores
            .tags
            .set(&tag)
            .await
            .map_err(|e| OperationError::Failed(e.to_string()))?;
        Ok(())
    }

    /// 读取未过期的标签值
    pub async fn get_tag(&self, key: &str) -> Result<Option<Value>, OperationError> {
        let tag = self
            .runtime
            .stores
            .tags
            .find(&self.crawler.name, key)
            .await
            .map_err(|e| OperationError::Failed(e.to_string()))?;
        Ok(tag.map(|t| t.value))
    }

    /// 标签是否存在且未过期
    pub async fn check_tag(&self, key: &str) -> Result<bool, OperationError> {
        Ok(self.get_tag(key).await?.is_some())
    }

    /// 记录警告事件
    pub async fn emit_warning(&self, message: &str) -> Result<(), OperationError> {
        warn!(crawler = %self.crawler.name, stage = %self.stage.name, "{}", message);
        self.record_event(EventLevel::Warning, message).await
    }

    /// 记录错误事件
    pub async fn emit_error(&self, message: &str) -> Result<(), OperationError> {
        error!(crawler = %self.crawler.name, stage = %self.stage.name, "{}", message);
        self.record_event(EventLevel::Error, message).await
    }

    async fn record_event(&self, level: EventLevel, message: &str) -> Result<(), OperationError> {
        let event = Event::new(
            self.crawler.name.as_str(),
            self.stage.name.as_str(),
            Some(self.state.run_id),
            level,
            message,
        );
        self.runtime
            .stores
            .events
            .create(&event)
            .await
            .map_err(|e| OperationError::Failed(e.to_string()))?;
        Ok(())
    }
}
