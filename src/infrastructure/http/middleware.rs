//! HTTP Middleware
//!
//! 请求耗时与错误状态码日志

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// 记录每个请求的耗时；4xx 记 warn，5xx 记 error
///
/// 合成请求会阻塞到播放结束，耗时可达数十秒
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else {
        tracing::debug!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP request served"
        );
    }

    response
}
