// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler::{CrawlerDefinition, DefinitionDefaults};
use crate::domain::services::crawler::Crawler;
use crate::domain::services::runtime::CrawlerRuntime;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 爬虫管理器
///
/// 按名称持有所有已加载的爬虫
pub struct CrawlerManager {
    crawlers: BTreeMap<String, Arc<Crawler>>,
    runtime: Arc<CrawlerRuntime>,
}

impl CrawlerManager {
    pub fn new(runtime: Arc<CrawlerRuntime>) -> Self {
        Self {
            crawlers: BTreeMap::new(),
            runtime,
        }
    }

    /// 加载目录中的所有爬虫定义（`*.yml`、`*.yaml`）
    ///
    /// 文件按名称排序后依次加载；格式错误的定义记录日志后跳过，
    /// 不影响其他爬虫；重名时保留先加载的定义
    ///
    /// # 参数
    ///
    /// * `dir` - 定义文件所在目录
    /// * `defaults` - 定义默认值
    /// * `runtime` - 共享运行时
    pub fn load_directory(
        dir: &Path,
        defaults: &DefinitionDefaults,
        runtime: Arc<CrawlerRuntime>,
    ) -> Self {
        let mut manager = Self::new(runtime);

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read crawler directory {}: {}", dir.display(), e);
                return manager;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension().and_then(|ext| ext.to_str()),
                        Some("yml") | Some("yaml")
                    )
            })
            .collect();
        paths.sort();

        for path in paths {
            match CrawlerDefinition::from_file(&path, defaults, &manager.runtime.registry) {
                Ok(definition) => {
                    manager.register(definition);
                }
                Err(e) => {
                    error!("Skipping crawler definition {}: {}", path.display(), e);
                }
            }
        }

        info!(
            "Loaded {} crawler(s) from {}",
            manager.len(),
            dir.display()
        );
        manager
    }

    /// 注册爬虫定义
    ///
    /// # 返回值
    ///
    /// * `true` - 注册成功
    /// * `false` - 已存在同名爬虫，忽略本定义
    pub fn register(&mut self, definition: CrawlerDefinition) -> bool {
        if self.crawlers.contains_key(&definition.name) {
            warn!(
                "Duplicate crawler '{}' in {:?} ignored",
                definition.name, definition.source
            );
            return false;
        }

        let name = definition.name.clone();
        let crawler = Arc::new(Crawler::new(definition, self.runtime.clone()));
        self.crawlers.insert(name, crawler);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<Crawler>> {
        self.crawlers.get(name).cloned()
    }

    /// 按名称顺序遍历爬虫
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Crawler>> {
        self.crawlers.values()
    }

    pub fn len(&self) -> usize {
        self.crawlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crawlers.is_empty()
    }

    pub fn runtime(&self) -> &Arc<CrawlerRuntime> {
        &self.runtime
    }

    /// 运行所有到期且未在运行的爬虫
    ///
    /// # 返回值
    ///
    /// 本次启动的爬虫
    pub async fn run_scheduled(&self) -> Vec<Arc<Crawler>> {
        let mut started = Vec::new();
        for crawler in self.crawlers.values() {
            if !crawler.check_due().await || crawler.is_running().await {
                continue;
            }
            match crawler.run(None).await {
                Ok(state) => {
                    info!(crawler = %crawler.name(), run_id = %state.run_id, "Scheduled run started");
                    started.push(crawler.clone());
                }
                Err(e) => {
                    error!(crawler = %crawler.name(), "Scheduled run failed: {}", e);
                }
            }
        }
        started
    }
}
