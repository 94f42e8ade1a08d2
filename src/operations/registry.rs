// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler::CrawlerDefinition;
use crate::domain::services::context::StageContext;
use crate::utils::errors::OperationError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 阶段操作特质
///
/// 每个阶段包装一个操作。操作通过 `StageContext::emit` 把输出交给
/// 后继阶段；投递语义为至少一次，因此操作应当是幂等的。
#[async_trait]
pub trait Operation: Send + Sync {
    /// 执行操作
    ///
    /// # 参数
    ///
    /// * `ctx` - 阶段上下文
    /// * `data` - 上游输出的数据，初始阶段为空对象
    async fn execute(&self, ctx: StageContext, data: Value) -> Result<(), OperationError>;
}

/// 清理回调特质
///
/// 一次运行结束、爬虫空闲后最多调用一次
#[async_trait]
pub trait CleanupCallback: Send + Sync {
    async fn cleanup(&self, crawler: Arc<CrawlerDefinition>) -> Result<(), OperationError>;
}

#[async_trait]
impl<T: Operation + ?Sized> Operation for Arc<T> {
    async fn execute(&self, ctx: StageContext, data: Value) -> Result<(), OperationError> {
        (**self).execute(ctx, data).await
    }
}

struct FnOperation<F>(F);

#[async_trait]
impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn(StageContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
{
    async fn execute(&self, ctx: StageContext, data: Value) -> Result<(), OperationError> {
        (self.0)(ctx, data).await
    }
}

struct FnCleanup<F>(F);

#[async_trait]
impl<F, Fut> CleanupCallback for FnCleanup<F>
where
    F: Fn(Arc<CrawlerDefinition>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
{
    async fn cleanup(&self, crawler: Arc<CrawlerDefinition>) -> Result<(), OperationError> {
        (self.0)(crawler).await
    }
}

/// 操作注册表
///
/// 在启动时构建的标识符到可调用对象的映射。标识符是自由格式的字符串，
/// 通常写作 `module:function`。爬虫定义加载时用它校验阶段操作，
/// 清理回调则在首次需要时才解析。
#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: HashMap<String, Arc<dyn Operation>>,
    cleanups: HashMap<String, Arc<dyn CleanupCallback>>,
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<&String> = self.operations.keys().collect();
        operations.sort();
        let mut cleanups: Vec<&String> = self.cleanups.keys().collect();
        cleanups.sort();
        f.debug_struct("OperationRegistry")
            .field("operations", &operations)
            .field("cleanups", &cleanups)
            .finish()
    }
}

impl OperationRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建包含内置操作的注册表
    ///
    /// 内置操作：`seed`、`sequence`、`inspect`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("seed", super::builtin::seed::Seed);
        registry.register("sequence", super::builtin::sequence::Sequence);
        registry.register("inspect", super::builtin::inspect::Inspect);
        registry
    }

    /// 注册阶段操作，同名操作会被替换
    pub fn register<O>(&mut self, id: impl Into<String>, operation: O) -> &mut Self
    where
        O: Operation + 'static,
    {
        self.operations.insert(id.into(), Arc::new(operation));
        self
    }

    /// 以异步闭包注册阶段操作
    pub fn register_fn<F, Fut>(&mut self, id: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(StageContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
    {
        self.register(id, FnOperation(f))
    }

    /// 注册清理回调
    pub fn register_cleanup<C>(&mut self, id: impl Into<String>, callback: C) -> &mut Self
    where
        C: CleanupCallback + 'static,
    {
        self.cleanups.insert(id.into(), Arc::new(callback));
        self
    }

    /// 以异步闭包注册清理回调
    pub fn register_cleanup_fn<F, Fut>(&mut self, id: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Arc<CrawlerDefinition>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
    {
        self.register_cleanup(id, FnCleanup(f))
    }

    /// 是否注册了指定操作
    pub fn contains_operation(&self, id: &str) -> bool {
        self.operations.contains_key(id)
    }

    /// 按标识符解析阶段操作
    pub fn operation(&self, id: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(id).cloned()
    }

    /// 按标识符解析清理回调
    pub fn cleanup(&self, id: &str) -> Option<Arc<dyn CleanupCallback>> {
        self.cleanups.get(id).cloned()
    }
}
