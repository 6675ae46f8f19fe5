//! Fake TTS Client - 不依赖模型服务的 TTS 客户端
//!
//! 按文本长度产出若干段正弦音，用于本地运行和测试

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::application::ports::{
    EngineFrame, FrameStream, InferRequest, TtsEnginePort, TtsError, VoiceEmbedding,
    VoiceRegistryPort,
};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 采样率
    pub sample_rate: u32,
    /// 每块时长（毫秒）
    pub chunk_ms: u64,
    /// 每多少个字符产出一块
    pub chars_per_chunk: usize,
    /// 模拟推理延迟（毫秒）
    pub chunk_delay_ms: u64,
    /// 正弦频率
    pub tone_hz: f32,
    /// 可用的说话人
    pub speakers: Vec<String>,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            chunk_ms: 250,
            chars_per_chunk: 20,
            chunk_delay_ms: 50,
            tone_hz: 220.0,
            speakers: vec![
                "Nova Hogarth".to_string(),
                "Claribel Dervla".to_string(),
                "Daisy Studious".to_string(),
            ],
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            chunk_ms = config.chunk_ms,
            speakers = config.speakers.len(),
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    fn tone(&self, chunk: usize, speed: f64) -> Vec<f32> {
        let rate = self.config.sample_rate as f64;
        let len = ((self.config.chunk_ms as f64 / 1000.0) * rate / speed.max(0.1)).round() as usize;
        let offset = chunk * len;
        (0..len)
            .map(|i| {
                let t = (offset + i) as f64 / rate;
                0.3 * (2.0 * std::f64::consts::PI * self.config.tone_hz as f64 * t).sin() as f32
            })
            .collect()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn infer_stream(&self, request: InferRequest) -> Result<FrameStream, TtsError> {
        let chunks = request
            .text
            .chars()
            .count()
            .div_ceil(self.config.chars_per_chunk.max(1))
            .max(1);

        tracing::debug!(
            text_len = request.text.chars().count(),
            speaker = %request.voice.name(),
            chunks,
            "FakeTtsClient: generating tone"
        );

        let frames: Vec<EngineFrame> = (0..chunks)
            .map(|i| EngineFrame {
                samples: self.tone(i, request.speed),
                sample_rate: self.config.sample_rate,
            })
            .collect();
        let delay = Duration::from_millis(self.config.chunk_delay_ms);

        let stream = futures_util::stream::iter(frames).then(move |frame| async move {
            tokio::time::sleep(delay).await;
            Ok::<_, TtsError>(frame)
        });
        Ok(stream.boxed())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl VoiceRegistryPort for FakeTtsClient {
    async fn lookup(&self, speaker: &str) -> Result<Option<VoiceEmbedding>, TtsError> {
        Ok(self
            .config
            .speakers
            .iter()
            .find(|s| s.as_str() == speaker)
            .map(|s| VoiceEmbedding::new(s.as_str())))
    }
}
