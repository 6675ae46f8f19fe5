//! Audio Storage Port - 出站端口
//!
//! 块文件、bundle 文件都放在同一个工作目录下，不做自动清理

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::speech::SessionId;
use crate::domain::AudioFormat;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unsupported sample width: {0} bytes")]
    UnsupportedWidth(u16),

    #[error("WAV encode error: {0}")]
    Encode(String),
}

#[async_trait]
pub trait AudioStoragePort: Send + Sync {
    /// bundle 完整音频：`tts_{session}_{bundle}.wav`
    fn bundle_path(&self, session: &SessionId, bundle: usize) -> PathBuf;

    /// 块音频：`tts_{session}_{bundle}_chunk{n}.wav`
    fn chunk_path(&self, session: &SessionId, bundle: usize, chunk: usize) -> PathBuf;

    /// 把小端 PCM 帧写成 WAV
    async fn write_wav(
        &self,
        path: &Path,
        format: AudioFormat,
        frames: &[u8],
    ) -> Result<(), StorageError>;
}
