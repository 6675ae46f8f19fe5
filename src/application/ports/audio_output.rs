//! Audio Output Port - 实时播放设备
//!
//! open(format) → write* → close；每个 bundle 打开一次

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::AudioFormat;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open playback device: {0}")]
    OpenFailed(String),

    #[error("Playback write failed: {0}")]
    WriteFailed(String),

    #[error("Playback stream already closed")]
    Closed,
}

/// 已打开的播放流；只在 open 与 close 之间有效
#[async_trait]
pub trait PlaybackStream: Send {
    /// 写入 PCM 帧，大致按实时速率阻塞
    async fn write(&mut self, frames: &[u8]) -> Result<(), PlaybackError>;

    /// 刷新并关闭
    async fn close(&mut self) -> Result<(), PlaybackError>;
}

#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    async fn open(&self, format: AudioFormat) -> Result<Box<dyn PlaybackStream>, PlaybackError>;
}
