// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::settings::DEFAULT_EXPIRE_SECONDS;
use crate::domain::models::stage::StageDefinition;
use crate::operations::registry::OperationRegistry;
use crate::utils::errors::ConfigurationError;

/// 调度周期
///
/// 每个关键字对应一个固定的重复间隔，`None` 表示不参与定时调度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// 不调度，只能手动运行
    #[default]
    None,
    /// 每天
    Daily,
    /// 每周
    Weekly,
    /// 每月（按4周计算）
    Monthly,
}

impl Schedule {
    /// 获取调度间隔
    ///
    /// # 返回值
    ///
    /// * `Some(Duration)` - 调度间隔
    /// * `None` - 不参与定时调度
    pub fn interval(&self) -> Option<chrono::Duration> {
        match self {
            Schedule::None => None,
            Schedule::Daily => Some(chrono::Duration::days(1)),
            Schedule::Weekly => Some(chrono::Duration::weeks(1)),
            Schedule::Monthly => Some(chrono::Duration::weeks(4)),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Schedule::None => write!(f, "none"),
            Schedule::Daily => write!(f, "daily"),
            Schedule::Weekly => write!(f, "weekly"),
            Schedule::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Schedule {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Schedule::None),
            "daily" => Ok(Schedule::Daily),
            "weekly" => Ok(Schedule::Weekly),
            "monthly" => Ok(Schedule::Monthly),
            other => Err(ConfigurationError::InvalidSchedule(other.to_string())),
        }
    }
}

/// 爬虫定义中未显式给出时使用的默认值
#[derive(Debug, Clone)]
pub struct DefinitionDefaults {
    /// 结果过期时间
    pub expire: Duration,
}

impl Default for DefinitionDefaults {
    fn default() -> Self {
        Self {
            expire: Duration::from_secs(DEFAULT_EXPIRE_SECONDS),
        }
    }
}

/// 爬虫定义
///
/// 从定义文档解析出的命名处理图，以及调度和生命周期元数据。
/// 阶段定义在加载时构建一次，此后不可变。
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerDefinition {
    /// 爬虫名称
    pub name: String,
    /// 描述
    pub description: String,
    /// 分类
    pub category: String,
    /// 调度周期
    pub schedule: Schedule,
    /// 是否禁用
    pub disabled: bool,
    /// 初始阶段名称
    pub init_stage: String,
    /// 任务之间的延迟
    pub delay: Duration,
    /// 结果与运行状态的过期时间
    pub expire: Duration,
    /// 隐身模式，由操作自行解释
    pub stealthy: bool,
    /// 清理回调标识（`module:function`）
    pub cleanup_method: Option<String>,
    /// 阶段名称到阶段定义的映射
    pub stages: BTreeMap<String, StageDefinition>,
    /// 定义文件路径
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CrawlerDocument {
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    schedule: Option<String>,
    #[serde(default)]
    disabled: bool,
    init: Option<String>,
    delay: Option<u64>,
    expire: Option<u64>,
    #[serde(default)]
    stealthy: bool,
    cleanup_method: Option<String>,
    #[serde(default)]
    pipeline: PipelineDocument,
}

/// 按文档顺序保留的阶段条目，重复的阶段名称留给校验阶段处理
#[derive(Debug, Default)]
struct PipelineDocument(Vec<(String, StageDocument)>);

impl<'de> Deserialize<'de> for PipelineDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PipelineVisitor;

        impl<'de> Visitor<'de> for PipelineVisitor {
            type Value = PipelineDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of stage names to stage definitions")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(PipelineDocument::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, StageDocument>()? {
                    entries.push(entry);
                }
                Ok(PipelineDocument(entries))
            }
        }

        deserializer.deserialize_any(PipelineVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct StageDocument {
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    next: Option<NextStages>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NextStages {
    One(String),
    Many(Vec<String>),
}

impl NextStages {
    fn into_names(next: Option<NextStages>) -> Vec<String> {
        match next {
            None => Vec::new(),
            Some(NextStages::One(stage)) => vec![stage],
            Some(NextStages::Many(stages)) => stages,
        }
    }
}

/// `delay` 与 `expire` 允许的最大秒数（约100年）
pub const MAX_DURATION_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

fn bounded_seconds(field: &'static str, seconds: u64) -> Result<Duration, ConfigurationError> {
    if seconds > MAX_DURATION_SECONDS {
        return Err(ConfigurationError::OutOfRange {
            field,
            value: seconds,
            max: MAX_DURATION_SECONDS,
        });
    }
    Ok(Duration::from_secs(seconds))
}

impl CrawlerDefinition {
    /// 从 YAML 文档解析爬虫定义
    ///
    /// # 参数
    ///
    /// * `source` - YAML 文本
    /// * `fallback_name` - 文档未指定 `name` 时使用的名称
    /// * `defaults` - 默认值
    /// * `registry` - 用于校验阶段操作的注册表
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlerDefinition)` - 通过校验的定义
    /// * `Err(ConfigurationError)` - 文档格式错误、调度关键字无效、
    ///   阶段名称重复、时间超出范围、操作未注册或阶段引用错误
    pub fn from_yaml(
        source: &str,
        fallback_name: &str,
        defaults: &DefinitionDefaults,
        registry: &OperationRegistry,
    ) -> Result<Self, ConfigurationError> {
        let document: CrawlerDocument = serde_yaml::from_str(source)?;

        let name = document
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| fallback_name.to_string());
        if name.trim().is_empty() {
            return Err(ConfigurationError::Invalid(
                "crawler name must not be empty".to_string(),
            ));
        }

        let schedule = match document.schedule.as_deref() {
            None => Schedule::None,
            Some(keyword) => keyword.parse()?,
        };

        let mut stages: BTreeMap<String, StageDefinition> = BTreeMap::new();
        for (stage_name, stage) in document.pipeline.0 {
            if stages.contains_key(&stage_name) {
                return Err(ConfigurationError::DuplicateStage(stage_name));
            }
            let next = NextStages::into_names(stage.next);
            let definition =
                StageDefinition::new(stage_name.clone(), stage.method, stage.params, next);
            stages.insert(stage_name, definition);
        }

        let delay = bounded_seconds("delay", document.delay.unwrap_or(0))?;
        let expire = match document.expire {
            Some(seconds) => bounded_seconds("expire", seconds)?,
            None => bounded_seconds("expire", defaults.expire.as_secs())?,
        };

        let definition = Self {
            description: document.description.unwrap_or_else(|| name.clone()),
            category: document.category.unwrap_or_else(|| "scrape".to_string()),
            schedule,
            disabled: document.disabled,
            init_stage: document.init.unwrap_or_else(|| "init".to_string()),
            delay,
            expire,
            stealthy: document.stealthy,
            cleanup_method: document.cleanup_method.filter(|m| !m.trim().is_empty()),
            stages,
            source: None,
            name,
        };

        definition.validate(registry)?;
        Ok(definition)
    }

    /// 从文件加载爬虫定义
    ///
    /// 文档未指定名称时使用文件名（不含扩展名）
    pub fn from_file(
        path: &Path,
        defaults: &DefinitionDefaults,
        registry: &OperationRegistry,
    ) -> Result<Self, ConfigurationError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let fallback_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let mut definition = Self::from_yaml(&source, fallback_name, defaults, registry)?;
        definition.source = Some(path.to_path_buf());
        Ok(definition)
    }

    fn validate(&self, registry: &OperationRegistry) -> Result<(), ConfigurationError> {
        for stage in self.stages.values() {
            if !registry.contains_operation(&stage.method) {
                return Err(ConfigurationError::UnknownOperation {
                    stage: stage.name.clone(),
                    method: stage.method.clone(),
                });
            }
            if let Some(missing) = stage.next.iter().find(|n| !self.stages.contains_key(*n)) {
                return Err(ConfigurationError::UnknownSuccessor {
                    stage: stage.name.clone(),
                    next: missing.clone(),
                });
            }
        }

        if !self.stages.contains_key(&self.init_stage) {
            return Err(ConfigurationError::UnknownInitStage(self.init_stage.clone()));
        }

        Ok(())
    }

    /// 按名称查找阶段定义
    pub fn get(&self, name: &str) -> Option<&StageDefinition> {
        self.stages.get(name)
    }

    /// 遍历所有阶段定义
    pub fn stages(&self) -> impl Iterator<Item = &StageDefinition> {
        self.stages.values()
    }

    /// 运行状态键的过期时间（秒）
    pub fn expire_seconds(&self) -> u64 {
        self.expire.as_secs()
    }
}

#[cfg(test)]
#[path = "crawler_test.rs"]
mod tests;
