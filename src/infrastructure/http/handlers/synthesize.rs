//! Synthesize Handlers
//!
//! - GET/HEAD /  存活探测，空响应
//! - POST /      合成请求；请求体按 JSON 解析，不看 Content-Type

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::application::{ApplicationError, SynthesizeCommand};
use crate::domain::speech::SynthesisRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

fn empty_html() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], "").into_response()
}

/// 存活探测
pub async fn probe() -> Response {
    empty_html()
}

/// 合成
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    // 超出长度上限等读取失败同样按 400 返回
    let body = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let request = SynthesisRequest::from_json(&body, &state.request_defaults)?;
    let result = state
        .synthesize_handler
        .handle(SynthesizeCommand { request })
        .await?;

    if !result.download {
        return Ok(empty_html());
    }

    let path = result
        .audio_path
        .ok_or_else(|| ApplicationError::internal("no audio was produced"))?;
    let audio = tokio::fs::read(&path)
        .await
        .map_err(|e| ApplicationError::Storage(format!("{}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "speech.wav".to_string());

    tracing::info!(
        session_id = %result.session_id,
        bytes = audio.len(),
        file = %file_name,
        "Sending assembled audio"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        audio,
    )
        .into_response())
}
