//! HTTP Routes
//!
//! API Endpoints:
//! - /   GET/HEAD  存活探测
//! - /   POST      合成（JSON 请求体），download=true 时返回 audio/wav

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 请求体上限（纯文本 JSON）
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::probe).post(handlers::synthesize))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
