// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::crawler_manager::CrawlerManager;
use crate::presentation::handlers::crawler_handler;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let crawler_routes = Router::new()
        .route("/v1/crawlers", get(crawler_handler::list_crawlers))
        .route("/v1/crawlers/{name}", get(crawler_handler::get_crawler))
        .route("/v1/crawlers/{name}/run", post(crawler_handler::run_crawler))
        .route(
            "/v1/crawlers/{name}/flush",
            post(crawler_handler::flush_crawler),
        )
        .route(
            "/v1/crawlers/{name}/replay/{stage}",
            post(crawler_handler::replay_stage),
        )
        .route(
            "/v1/crawlers/{name}/cleanup",
            post(crawler_handler::cleanup_crawler),
        )
        .route(
            "/v1/crawlers/{name}/events",
            get(crawler_handler::list_events),
        );

    Router::new().merge(public_routes).merge(crawler_routes)
}

/// 创建带共享状态和请求追踪的应用
pub fn app(manager: Arc<CrawlerManager>) -> Router {
    routes()
        .layer(Extension(manager))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}


#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
