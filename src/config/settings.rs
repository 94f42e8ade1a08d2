// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 默认的结果过期时间：60天
pub const DEFAULT_EXPIRE_SECONDS: u64 = 60 * 24 * 60 * 60;

/// 应用程序配置设置
///
/// 包含数据库、Redis、服务器、爬虫、工作器、调度器和指标等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    #[serde(default)]
    pub redis: RedisSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 爬虫配置
    pub crawlers: CrawlerSettings,
    /// 工作器配置
    pub workers: WorkerSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
///
/// 未配置 `url` 时运行状态存储不可用，调度与监控查询降级为“未知”
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: Option<String>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 爬虫配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 爬虫定义文件所在目录
    pub config_path: String,
    /// 未显式指定时的增量模式
    pub incremental: bool,
    /// 爬虫定义未指定 `expire` 时使用的过期时间（秒）
    pub expire: u64,
    /// 是否以同步方式执行 `run()`，直到队列清空才返回
    pub eager: bool,
    /// 同步模式下等待队列清空的最长时间（秒）
    pub eager_timeout: u64,
}

/// 工作器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 工作器数量
    pub count: usize,
    /// 队列为空时的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 是否启用定时调度
    pub enabled: bool,
    /// 调度检查间隔（秒）
    pub tick_seconds: u64,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen: String,
}

impl WorkerSettings {
    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SchedulerSettings {
    /// 调度检查间隔
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_seconds.max(1))
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `PIPECRAWL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PIPECRAWL").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含默认值的配置构建器
    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite://pipecrawl.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("crawlers.config_path", "crawlers")?
            .set_default("crawlers.incremental", true)?
            .set_default("crawlers.expire", DEFAULT_EXPIRE_SECONDS)?
            .set_default("crawlers.eager", false)?
            .set_default("crawlers.eager_timeout", 3600)?
            .set_default("workers.count", 4)?
            .set_default("workers.poll_interval_ms", 500)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.tick_seconds", 60)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
