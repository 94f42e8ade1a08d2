// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化日志订阅器
///
/// 过滤规则优先读取 `RUST_LOG`，否则使用 `info,pipecrawl=debug`。
/// `PIPECRAWL_LOG_FORMAT=json` 时输出 JSON 行。
/// 重复调用时返回错误而不是 panic，方便测试中多次初始化。
pub fn init_telemetry() -> Result<(), tracing_subscriber::util::TryInitError> {
    let json = std::env::var("PIPECRAWL_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pipecrawl=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .try_init()
}
