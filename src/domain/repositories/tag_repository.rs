// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tag::Tag;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 爬虫标签仓库特质
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// 写入标签，替换同一爬虫下同键的旧标签
    async fn set(&self, tag: &Tag) -> Result<Tag, RepositoryError>;

    /// 查找未过期的标签
    async fn find(&self, crawler: &str, key: &str) -> Result<Option<Tag>, RepositoryError>;
}
