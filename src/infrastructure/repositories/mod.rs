// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于SeaORM的领域仓库接口实现
pub mod crawler_data_repo_impl;
pub mod event_repo_impl;
pub mod result_repo_impl;
pub mod tag_repo_impl;

use crate::domain::repositories::DurableStores;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// 基于同一个数据库连接构建全部持久存储
pub fn database_stores(db: Arc<DatabaseConnection>) -> DurableStores {
    DurableStores {
        results: Arc::new(result_repo_impl::ResultRepositoryImpl::new(db.clone())),
        tags: Arc::new(tag_repo_impl::TagRepositoryImpl::new(db.clone())),
        events: Arc::new(event_repo_impl::EventRepositoryImpl::new(db.clone())),
        crawler_data: Arc::new(crawler_data_repo_impl::CrawlerDataRepositoryImpl::new(db)),
    }
}

#[cfg(test)]
#[path = "repositories_test.rs"]
mod tests;
