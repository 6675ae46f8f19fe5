//! HTTP Error Handling
//!
//! 所有错误都映射为 400，响应体是去掉标签并转义后的 HTML 文本

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::ApplicationError;
use crate::domain::speech::RequestError;

/// 形如 `<...>` 的标签，内部不含 `<`
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^<]+?>").expect("tag pattern is valid"));

/// 去标签后转义残留的 `& < >`
pub fn sanitize_message(message: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(message, "");
    let mut out = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// API 错误
#[derive(Debug)]
pub struct ApiError {
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = format!("Bad Request: {}", sanitize_message(&self.message));
        tracing::warn!(error = %self.message, "Request failed");

        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        ApplicationError::from(e).into()
    }
}
