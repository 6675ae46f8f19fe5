//! Audio Assembler Port - 多个 bundle 音频拼接

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::AudioFormat;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Audio format mismatch in {path}: expected {expected}, found {found}")]
    FormatMismatch {
        path: PathBuf,
        expected: AudioFormat,
        found: AudioFormat,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(String),
}

#[async_trait]
pub trait AudioAssemblerPort: Send + Sync {
    /// 0 个输入返回 None；1 个输入原样返回；多个输入之间插入 `silence / speed` 静音
    async fn assemble(&self, inputs: &[PathBuf], speed: f64)
        -> Result<Option<PathBuf>, AssembleError>;
}
