//! Face Ports - 口型生成与人脸动画
//!
//! 两者都是尽力而为：失败只记录日志，不影响合成

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::speech::Expression;

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("Face device unavailable: {0}")]
    Unavailable(String),

    #[error("Recognizer error: {0}")]
    Recognizer(String),

    #[error("Viseme store error: {0}")]
    Store(String),
}

/// 带时间戳的口型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisemeCue {
    /// 相对块开头的秒数
    pub time: f64,
    pub viseme: String,
}

/// 口型生成器：音频块 + 语言 → 口型序列，最后一项为 IDLE
#[async_trait]
pub trait VisemeGeneratorPort: Send + Sync {
    async fn generate(&self, chunk_path: &Path, language: &str)
        -> Result<Vec<VisemeCue>, FaceError>;
}

/// 按块标识持久化口型序列
#[async_trait]
pub trait VisemeStorePort: Send + Sync {
    async fn save(&self, key: &str, cues: &[VisemeCue]) -> Result<(), FaceError>;
}

/// 人脸动画设备；不可用时应为 no-op
#[async_trait]
pub trait FaceAnimatorPort: Send + Sync {
    async fn animate(&self, key: &str, expression: Expression) -> Result<(), FaceError>;
}
