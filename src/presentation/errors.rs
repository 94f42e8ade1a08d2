// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::services::crawler::CrawlerError;
use crate::queue::task_queue::QueueError;

/// 应用错误类型
///
/// 封装接口层的错误，统一输出 `{"error": ...}`
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<CrawlerError> for AppError {
    fn from(err: CrawlerError) -> Self {
        let status = match &err {
            CrawlerError::UnknownCrawler(_) | CrawlerError::UnknownStage { .. } => {
                StatusCode::NOT_FOUND
            }
            CrawlerError::Running(_) => StatusCode::CONFLICT,
            CrawlerError::Queue(QueueError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            CrawlerError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}
