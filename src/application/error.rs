//! 应用层错误定义
//!
//! 统一的命令错误类型，HTTP 层把所有变体映射为 400

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ports::{AssembleError, FaceError, PlaybackError, StorageError, TtsError};
use crate::domain::speech::RequestError;
use crate::domain::AudioFormat;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 参数类型错误
    #[error("WrongTypeError: Expected '{expected}' type for argument {argument}")]
    InvalidArgumentType {
        argument: String,
        expected: &'static str,
    },

    /// 参数值不合法（越界、未知枚举值）
    #[error("Invalid value for argument {argument}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("'{0}' is not a supported language.")]
    UnsupportedLanguage(String),

    #[error("Speaker name '{0}' is invalid.")]
    SpeakerNotFound(String),

    #[error("No text field in request")]
    MissingText,

    #[error("Unrecognized field '{0}' in request")]
    UnknownField(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// 推理引擎报错（不透明）
    #[error("Synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Audio format mismatch in {path}: expected {expected}, found {found}")]
    FormatMismatch {
        path: PathBuf,
        expected: AudioFormat,
        found: AudioFormat,
    },

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    pub fn invalid_argument(argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::SynthesisFailure(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<RequestError> for ApplicationError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::MalformedBody(msg) => Self::MalformedBody(msg),
            RequestError::MissingText => Self::MissingText,
            RequestError::InvalidArgumentType { argument, expected } => {
                Self::InvalidArgumentType { argument, expected }
            }
            RequestError::InvalidArgument { argument, reason } => {
                Self::InvalidArgument { argument, reason }
            }
            RequestError::UnknownField(field) => Self::UnknownField(field),
        }
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::VoiceNotFound(name) => Self::SpeakerNotFound(name),
            other => Self::SynthesisFailure(other.to_string()),
        }
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        Self::Playback(err.to_string())
    }
}

impl From<StorageError> for ApplicationError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<FaceError> for ApplicationError {
    fn from(err: FaceError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AssembleError> for ApplicationError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::FormatMismatch {
                path,
                expected,
                found,
            } => Self::FormatMismatch {
                path,
                expected,
                found,
            },
            AssembleError::InvalidInput(msg) => Self::Internal(msg),
            AssembleError::Io(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_not_found_maps_to_speaker_error() {
        let err: ApplicationError = TtsError::VoiceNotFound("Nobody".into()).into();
        assert_eq!(err.to_string(), "Speaker name 'Nobody' is invalid.");
    }

    #[test]
    fn test_engine_failure_is_opaque() {
        let err: ApplicationError = TtsError::Timeout.into();
        assert!(matches!(err, ApplicationError::SynthesisFailure(_)));
    }

    #[test]
    fn test_request_error_kinds_preserved() {
        let err: ApplicationError = RequestError::wrong_type("speed", "float").into();
        assert_eq!(
            err.to_string(),
            "WrongTypeError: Expected 'float' type for argument speed"
        );
    }
}
