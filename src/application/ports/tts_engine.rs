//! TTS Engine Port - 流式推理引擎抽象
//!
//! 引擎按生成顺序惰性产出音频帧，帧序列只能被消费一次

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
}

/// 固定的解码超参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodingOptions {
    #[serde(default = "default_stream_chunk_size")]
    pub stream_chunk_size: u32,
    #[serde(default = "default_overlap_wav_len")]
    pub overlap_wav_len: u32,
    #[serde(default = "default_length_penalty")]
    pub length_penalty: f64,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
}

fn default_stream_chunk_size() -> u32 {
    50
}

fn default_overlap_wav_len() -> u32 {
    2048
}

fn default_length_penalty() -> f64 {
    1.0
}

fn default_repetition_penalty() -> f64 {
    10.0
}

fn default_top_k() -> u32 {
    50
}

fn default_top_p() -> f64 {
    0.85
}

fn default_do_sample() -> bool {
    true
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            stream_chunk_size: default_stream_chunk_size(),
            overlap_wav_len: default_overlap_wav_len(),
            length_penalty: default_length_penalty(),
            repetition_penalty: default_repetition_penalty(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            do_sample: default_do_sample(),
        }
    }
}

/// 音色嵌入句柄（对编排器不透明）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceEmbedding {
    name: Arc<str>,
}

impl VoiceEmbedding {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 一次流式推理请求
#[derive(Debug, Clone)]
pub struct InferRequest {
    pub text: String,
    /// ISO 639-1 语言代码
    pub language: String,
    pub voice: VoiceEmbedding,
    pub speed: f64,
    pub temperature: f64,
    pub decoding: DecodingOptions,
}

/// 引擎产出的一帧：单声道浮点采样
#[derive(Debug, Clone)]
pub struct EngineFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

pub type FrameStream = BoxStream<'static, Result<EngineFrame, TtsError>>;

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 开始流式推理，返回有限、不可重启的帧序列
    async fn infer_stream(&self, request: InferRequest) -> Result<FrameStream, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}

/// 音色注册表
#[async_trait]
pub trait VoiceRegistryPort: Send + Sync {
    /// 按说话人名称查找；未找到返回 None
    async fn lookup(&self, speaker: &str) -> Result<Option<VoiceEmbedding>, TtsError>;
}
