//! Speech Context - Errors

use thiserror::Error;

/// 请求解析 / 校验错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("No text field in request")]
    MissingText,

    #[error("Expected '{expected}' type for argument {argument}")]
    InvalidArgumentType {
        argument: String,
        expected: &'static str,
    },

    #[error("Invalid value for argument {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Unrecognized field '{0}' in request")]
    UnknownField(String),
}

impl RequestError {
    pub fn wrong_type(argument: &str, expected: &'static str) -> Self {
        Self::InvalidArgumentType {
            argument: argument.to_string(),
            expected,
        }
    }

    pub fn invalid(argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }
}
