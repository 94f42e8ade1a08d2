// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

pub const TASKS_DISPATCHED: &str = "pipecrawl_tasks_dispatched_total";
pub const OPERATIONS: &str = "pipecrawl_operations_total";
pub const OPERATION_DURATION: &str = "pipecrawl_operation_duration_seconds";

/// 操作执行结果标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Failure,
}

impl OperationStatus {
    fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Success => "success",
            OperationStatus::Failure => "failure",
        }
    }
}

/// 初始化指标系统
///
/// 未启用时什么也不做，指标宏在没有记录器时为空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics listen address {}: {}", settings.listen, e);
            return;
        }
    };

    // 端口被占用时只记录警告
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!(TASKS_DISPATCHED, "Total number of stage tasks dispatched");
    describe_counter!(OPERATIONS, "Total number of stage operations executed");
    describe_histogram!(OPERATION_DURATION, "Duration of stage operations in seconds");

    info!("Metrics exporter listening on {}", addr);
}

/// 记录一次分发
pub fn record_dispatch(crawler: &str, stage: &str) {
    counter!(
        TASKS_DISPATCHED,
        "crawler" => crawler.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// 记录一次操作执行
pub fn record_operation(crawler: &str, status: OperationStatus, duration: Duration) {
    counter!(
        OPERATIONS,
        "crawler" => crawler.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
    histogram!(OPERATION_DURATION, "crawler" => crawler.to_string()).record(duration.as_secs_f64());
}
