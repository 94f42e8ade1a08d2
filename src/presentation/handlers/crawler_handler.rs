// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::domain::services::crawler::{Crawler, CrawlerError, CrawlerStatus};
use crate::domain::services::crawler_manager::CrawlerManager;
use crate::presentation::errors::AppError;

/// 运行请求体
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    pub incremental: Option<bool>,
}

/// 清空请求参数
#[derive(Debug, Default, Deserialize)]
pub struct FlushParams {
    /// 同时删除运行状态键
    #[serde(default)]
    pub reset: bool,
}

/// 事件查询参数
#[derive(Debug, Default, Deserialize)]
pub struct EventParams {
    pub limit: Option<u64>,
}

fn find(manager: &CrawlerManager, name: &str) -> Result<Arc<Crawler>, AppError> {
    manager
        .get(name)
        .ok_or_else(|| CrawlerError::UnknownCrawler(name.to_string()).into())
}

/// 列出所有爬虫及其状态
pub async fn list_crawlers(
    Extension(manager): Extension<Arc<CrawlerManager>>,
) -> Json<Vec<CrawlerStatus>> {
    let mut statuses = Vec::with_capacity(manager.len());
    for crawler in manager.iter() {
        statuses.push(crawler.status().await);
    }
    Json(statuses)
}

/// 获取单个爬虫的状态
pub async fn get_crawler(
    Extension(manager): Extension<Arc<CrawlerManager>>,
    Path(name): Path<String>,
) -> Result<Json<CrawlerStatus>, AppError> {
    let crawler = find(&manager, &name)?;
    Ok(Json(crawler.status().await))
}

/// 启动一次运行
///
/// 请求体可省略；`{"incremental": false}` 强制完整运行
pub async fn run_crawler(
    Extension(manager): Extension<Arc<CrawlerManager>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let crawler = find(&manager, &name)?;
    let request: RunRequest = if body.is_empty() {
        RunRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("invalid run request: {}", e)))?
    };

    let state = crawler.run(request.incremental).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "crawler": state.crawler,
            "run_id": state.run_id,
            "incremental": state.incremental,
        })),
    ))
}

/// 清空爬虫的持久记录
///
/// 带 `reset=true` 且爬虫仍在运行时直接返回 409，不清空任何数据
pub async fn flush_crawler(
    Extension(manager): Extension<Arc<CrawlerManager>>,
    Path(name): Path<String>,
    Query(params): Query<FlushParams>,
) -> Result<impl IntoResponse, AppError> {
    let crawler = find(&manager, &name)?;
    if params.reset && crawler.is_running().await {
        return Err(CrawlerError::Running(crawler.name().to_string()).into());
    }

    let summary = crawler
        .flush()
        .await
        .ok_or_else(|| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "flush failed"))?;

    let reset = if params.reset {
        crawler.reset_run_state().await?
    } else {
        false
    };

    Ok(Json(json!({ "flushed": summary, "reset": reset })))
}

/// 重放发往指定阶段的历史结果
pub async fn replay_stage(
    Extension(manager): Extension<Arc<CrawlerManager>>,
    Path((name, stage)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let crawler = find(&manager, &name)?;
    let dispatched = crawler.replay(&stage).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "dispatched": dispatched })),
    ))
}

/// 尝试执行清理回调
pub async fn cleanup_crawler(
    Extension(manager): Extension<Arc<CrawlerManager>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let crawler = find(&manager, &name)?;
    let outcome = crawler.cleanup().await;
    Ok(Json(json!({ "outcome": outcome })))
}

/// 最近的爬虫事件
pub async fn list_events(
    Extension(manager): Extension<Arc<CrawlerManager>>,
    Path(name): Path<String>,
    Query(params): Query<EventParams>,
) -> Result<impl IntoResponse, AppError> {
    let crawler = find(&manager, &name)?;
    let limit = params.limit.unwrap_or(50).min(500);
    let events = crawler
        .runtime()
        .stores
        .events
        .find_by_crawler(crawler.name(), limit)
        .await
        .map_err(CrawlerError::from)?;
    Ok(Json(events))
}
