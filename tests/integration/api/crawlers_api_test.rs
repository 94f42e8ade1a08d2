// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{create_pipeline, TestPipeline};
use axum::http::StatusCode;
use axum_test::TestServer;
use pipecrawl::domain::models::crawler_result::StageResult;
use pipecrawl::domain::models::event::{Event, EventLevel};
use pipecrawl::domain::repositories::event_repository::EventRepository;
use pipecrawl::domain::repositories::result_repository::ResultRepository;
use pipecrawl::domain::repositories::run_state_repository::RunStateRepository;
use pipecrawl::domain::services::runtime::RuntimeOptions;
use pipecrawl::operations::OperationRegistry;
use pipecrawl::presentation::routes;
use pipecrawl::queue::task_queue::TaskQueue;
use serde_json::{json, Value};
use uuid::Uuid;

const NEWS: &str = r#"
name: news
description: Daily headlines
category: media
schedule: daily
pipeline:
  init:
    method: seed
    params: { url: "https://example.com" }
    next: store
  store:
    method: inspect
"#;

const ARCHIVE: &str = r#"
name: archive
pipeline:
  init:
    method: inspect
"#;

async fn create_test_app() -> (TestServer, TestPipeline) {
    let pipeline = create_pipeline(
        &[NEWS, ARCHIVE],
        OperationRegistry::with_builtins(),
        RuntimeOptions::default(),
    )
    .await;
    let server = TestServer::new(routes::app(pipeline.manager.clone())).unwrap();
    (server, pipeline)
}

#[tokio::test]
async fn test_health_check() {
    let (server, _pipeline) = create_test_app().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_list_crawlers() {
    let (server, _pipeline) = create_test_app().await;

    let response = server.get("/v1/crawlers").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let crawlers = body.as_array().unwrap();
    assert_eq!(crawlers.len(), 2);

    // 按名称排序
    assert_eq!(crawlers[0]["name"], "archive");
    assert_eq!(crawlers[0]["schedule"], "none");
    assert_eq!(crawlers[0]["due"], false);

    let news = &crawlers[1];
    assert_eq!(news["name"], "news");
    assert_eq!(news["description"], "Daily headlines");
    assert_eq!(news["category"], "media");
    assert_eq!(news["schedule"], "daily");
    assert_eq!(news["disabled"], false);
    assert_eq!(news["is_running"], false);
    assert_eq!(news["op_count"], 0);
    assert_eq!(news["due"], true);
}

#[tokio::test]
async fn test_run_crawler() {
    let (server, pipeline) = create_test_app().await;

    let response = server
        .post("/v1/crawlers/news/run")
        .json(&json!({ "incremental": false }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["crawler"], "news");
    assert_eq!(body["incremental"], false);
    assert!(body["run_id"].as_str().unwrap().parse::<Uuid>().is_ok());

    assert_eq!(pipeline.queue.pending("news").await.unwrap(), 1);
    assert!(pipeline.run_state.last_run("news").await.unwrap().is_some());

    let status: Value = server.get("/v1/crawlers/news").await.json();
    assert_eq!(status["due"], false);
}

#[tokio::test]
async fn test_run_without_body_uses_default_mode() {
    let (server, _pipeline) = create_test_app().await;

    let response = server.post("/v1/crawlers/archive/run").await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["incremental"], true);
}

#[tokio::test]
async fn test_run_rejects_malformed_body() {
    let (server, pipeline) = create_test_app().await;

    let response = server.post("/v1/crawlers/news/run").text("not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(pipeline.queue.pending("news").await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_crawler_is_not_found() {
    let (server, _pipeline) = create_test_app().await;

    let response = server.post("/v1/crawlers/missing/run").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unknown crawler 'missing'");

    server
        .get("/v1/crawlers/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/v1/crawlers/missing/flush")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_flush_crawler() {
    let (server, pipeline) = create_test_app().await;
    let results = &pipeline.runtime.stores.results;
    results
        .create(&StageResult::new("news", "init", "store", Uuid::new_v4(), json!({ "a": 1 })))
        .await
        .unwrap();
    results
        .create(&StageResult::new("archive", "init", "store", Uuid::new_v4(), json!({ "b": 2 })))
        .await
        .unwrap();

    let response = server.post("/v1/crawlers/news/flush").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["flushed"]["results"], 1);
    assert_eq!(body["flushed"]["tags"], 0);
    assert_eq!(body["reset"], false);

    assert_eq!(results.count_by_crawler("news").await.unwrap(), 0);
    assert_eq!(results.count_by_crawler("archive").await.unwrap(), 1);
}

#[tokio::test]
async fn test_flush_with_reset() {
    let (server, pipeline) = create_test_app().await;
    let results = &pipeline.runtime.stores.results;
    results
        .create(&StageResult::new("news", "init", "store", Uuid::new_v4(), json!({ "a": 1 })))
        .await
        .unwrap();
    pipeline.run_state.begin_op("news", std::time::Duration::from_secs(60)).await.unwrap();

    // 仍有活动操作时拒绝，且不清空数据
    let response = server
        .post("/v1/crawlers/news/flush")
        .add_query_param("reset", "true")
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(results.count_by_crawler("news").await.unwrap(), 1);

    pipeline.run_state.finish_op("news", std::time::Duration::from_secs(60)).await.unwrap();
    let response = server
        .post("/v1/crawlers/news/flush")
        .add_query_param("reset", "true")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["reset"], true);
    assert_eq!(body["flushed"]["results"], 1);
    assert_eq!(results.count_by_crawler("news").await.unwrap(), 0);
    assert_eq!(pipeline.run_state.total_ops("news").await.unwrap(), None);
}

#[tokio::test]
async fn test_replay_stage() {
    let (server, pipeline) = create_test_app().await;
    for url in ["https://example.com/1", "https://example.com/2"] {
        pipeline
            .runtime
            .stores
            .results
            .create(&StageResult::new("news", "init", "store", Uuid::new_v4(), json!({ "url": url })))
            .await
            .unwrap();
    }

    let response = server.post("/v1/crawlers/news/replay/store").await;
    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["dispatched"], 2);
    assert_eq!(pipeline.queue.pending("news").await.unwrap(), 2);

    server
        .post("/v1/crawlers/news/replay/nowhere")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_not_configured() {
    let (server, _pipeline) = create_test_app().await;

    let response = server.post("/v1/crawlers/news/cleanup").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "not_configured");
}

#[tokio::test]
async fn test_list_events() {
    let (server, pipeline) = create_test_app().await;
    let events = &pipeline.runtime.stores.events;
    events
        .create(&Event::new("news", "init", None, EventLevel::Warning, "slow source"))
        .await
        .unwrap();
    events
        .create(&Event::new("archive", "init", None, EventLevel::Error, "other"))
        .await
        .unwrap();

    let response = server
        .get("/v1/crawlers/news/events")
        .add_query_param("limit", "10")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["message"], "slow source");
    assert_eq!(list[0]["level"], "warning");
}
