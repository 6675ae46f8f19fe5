//! HTTP TTS Client - 调用外部流式 TTS HTTP 服务
//!
//! 实现 TtsEnginePort / VoiceRegistryPort
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/stream
//! Request: {"text", "language", "speaker", "speed", "temperature", 解码超参数...} (JSON)
//! Response: 分块传输的长度前缀帧：u32 LE 字节数 + f32 LE 单声道采样
//!           采样率在 X-TTS-Sample-Rate header 中
//!
//! GET {base_url}/api/tts/speakers
//! Response: ["Nova Hogarth", ...]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{future, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};
use tokio_util::io::StreamReader;

use crate::application::ports::{
    DecodingOptions, EngineFrame, FrameStream, InferRequest, TtsEnginePort, TtsError,
    VoiceEmbedding, VoiceRegistryPort,
};

/// 单帧最大字节数
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsStreamRequest<'a> {
    text: &'a str,
    language: &'a str,
    speaker: &'a str,
    speed: f64,
    temperature: f64,
    #[serde(flatten)]
    decoding: &'a DecodingOptions,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒），包括读取整个流
    pub timeout_secs: u64,
    /// 服务端未返回采样率时使用
    pub sample_rate: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            sample_rate: 24000,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
    speakers: DashMap<String, VoiceEmbedding>,
    speakers_loaded: AtomicBool,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            speakers: DashMap::new(),
            speakers_loaded: AtomicBool::new(false),
        })
    }

    fn stream_url(&self) -> String {
        format!("{}/api/tts/stream", self.config.base_url.trim_end_matches('/'))
    }

    fn speakers_url(&self) -> String {
        format!("{}/api/tts/speakers", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch_speakers(&self) -> Result<(), TtsError> {
        let response = self
            .client
            .get(self.speakers_url())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!("HTTP {}: {}", status, error_text)));
        }

        let names: Vec<String> = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Invalid speaker list: {}", e)))?;

        tracing::info!(count = names.len(), "Loaded TTS speaker list");
        for name in names {
            let embedding = VoiceEmbedding::new(name.as_str());
            self.speakers.insert(name, embedding);
        }
        self.speakers_loaded.store(true, Ordering::Release);
        Ok(())
    }
}

fn map_send_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

/// u32 LE 长度前缀，长度不含前缀本身
fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .little_endian()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_BYTES)
        .new_codec()
}

/// 帧负载 → 采样；空帧返回 None
fn decode_samples(payload: &[u8], sample_rate: u32) -> Result<Option<EngineFrame>, TtsError> {
    if payload.len() % 4 != 0 {
        return Err(TtsError::InvalidResponse(format!(
            "invalid frame length {}",
            payload.len()
        )));
    }
    if payload.is_empty() {
        return Ok(None);
    }
    let samples = payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(Some(EngineFrame {
        samples,
        sample_rate,
    }))
}

fn map_read_error(e: std::io::Error) -> TtsError {
    match e.kind() {
        std::io::ErrorKind::ConnectionAborted => TtsError::NetworkError(e.to_string()),
        _ => TtsError::InvalidResponse(format!("malformed frame stream: {}", e)),
    }
}

/// 字节流 → 帧流；流在帧边界结束即正常结束
fn frame_stream<R>(reader: R, sample_rate: u32) -> FrameStream
where
    R: AsyncRead + Send + 'static,
{
    FramedRead::new(reader, frame_codec())
        .map_err(map_read_error)
        .try_filter_map(move |payload| future::ready(decode_samples(&payload, sample_rate)))
        .boxed()
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn infer_stream(&self, request: InferRequest) -> Result<FrameStream, TtsError> {
        let body = TtsStreamRequest {
            text: &request.text,
            language: &request.language,
            speaker: request.voice.name(),
            speed: request.speed,
            temperature: request.temperature,
            decoding: &request.decoding,
        };

        tracing::debug!(
            url = %self.stream_url(),
            text_len = request.text.chars().count(),
            speaker = %request.voice.name(),
            "Sending TTS stream request"
        );

        let response = self
            .client
            .post(self.stream_url())
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // 引擎不认识该说话人，下次查询重新拉取列表
            self.speakers.remove(request.voice.name());
            self.speakers_loaded.store(false, Ordering::Release);
            return Err(TtsError::VoiceNotFound(request.voice.name().to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!("HTTP {}: {}", status, error_text)));
        }

        let sample_rate = response
            .headers()
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.config.sample_rate);

        let bytes = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::ConnectionAborted, e));

        Ok(frame_stream(StreamReader::new(Box::pin(bytes)), sample_rate))
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.speakers_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl VoiceRegistryPort for HttpTtsClient {
    async fn lookup(&self, speaker: &str) -> Result<Option<VoiceEmbedding>, TtsError> {
        if let Some(voice) = self.speakers.get(speaker) {
            return Ok(Some(voice.clone()));
        }
        if !self.speakers_loaded.load(Ordering::Acquire) {
            self.fetch_speakers().await?;
        }
        Ok(self.speakers.get(speaker).map(|v| v.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(frames: &[&[f32]]) -> Vec<u8> {
        let mut out = Vec::new();
        for samples in frames {
            out.extend_from_slice(&((samples.len() * 4) as u32).to_le_bytes());
            for s in *samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.sample_rate, 24000);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://example.com:9000")
            .with_timeout(60)
            .with_sample_rate(22050);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.sample_rate, 22050);
    }

    async fn collect(data: Vec<u8>) -> Vec<Result<EngineFrame, TtsError>> {
        frame_stream(std::io::Cursor::new(data), 24000).collect().await
    }

    #[tokio::test]
    async fn test_read_frames_until_eof() {
        let frames = collect(encode(&[&[0.5, -0.5], &[], &[1.0]])).await;

        // 空帧被跳过
        assert_eq!(frames.len(), 2);
        let first = frames[0].as_ref().unwrap();
        assert_eq!(first.samples, vec![0.5, -0.5]);
        assert_eq!(first.sample_rate, 24000);
        assert_eq!(frames[1].as_ref().unwrap().samples, vec![1.0]);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_error() {
        let mut data = encode(&[&[0.25, 0.25]]);
        data.truncate(data.len() - 2);
        let frames = collect(data).await;
        assert!(matches!(frames.last(), Some(Err(TtsError::InvalidResponse(_)))));

        let frames = collect(vec![1u8, 0]).await;
        assert!(matches!(frames.last(), Some(Err(TtsError::InvalidResponse(_)))));
    }

    #[tokio::test]
    async fn test_payload_not_multiple_of_four_is_error() {
        let mut data = 3u32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0, 0, 0]);
        let frames = collect(data).await;
        assert!(matches!(frames.as_slice(), [Err(TtsError::InvalidResponse(_))]));
    }

    /// 本地引擎：知道一个说话人，对其他说话人返回 404
    async fn spawn_engine() -> String {
        use axum::{
            http::{HeaderMap, StatusCode as AxumStatus},
            routing::{get, post},
            Json, Router,
        };

        async fn stream(Json(body): Json<serde_json::Value>) -> Result<(HeaderMap, Vec<u8>), AxumStatus> {
            if body["speaker"] != "Nova Hogarth" {
                return Err(AxumStatus::NOT_FOUND);
            }
            let mut headers = HeaderMap::new();
            headers.insert("X-TTS-Sample-Rate", "16000".parse().unwrap());
            Ok((headers, encode(&[&[0.1, 0.2], &[0.3]])))
        }

        let app = Router::new()
            .route("/api/tts/stream", post(stream))
            .route(
                "/api/tts/speakers",
                get(|| async { Json(vec!["Nova Hogarth", "Daisy Studious"]) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn infer_request(speaker: &str) -> InferRequest {
        InferRequest {
            text: "Hello.".to_string(),
            language: "en".to_string(),
            voice: VoiceEmbedding::new(speaker),
            speed: 1.0,
            temperature: 0.01,
            decoding: DecodingOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_stream_reads_frames_with_header_rate() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::new(spawn_engine().await)).unwrap();

        let frames: Vec<EngineFrame> = client
            .infer_stream(infer_request("Nova Hogarth"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.sample_rate == 16000));
        assert_eq!(frames[1].samples, vec![0.3]);
    }

    #[tokio::test]
    async fn test_unknown_speaker_on_engine_is_voice_not_found() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::new(spawn_engine().await)).unwrap();

        assert!(client.lookup("Daisy Studious").await.unwrap().is_some());
        assert!(client.lookup("Nobody").await.unwrap().is_none());

        let err = client
            .infer_stream(infer_request("Daisy Studious"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TtsError::VoiceNotFound(name) if name == "Daisy Studious"));
        assert!(!client.speakers.contains_key("Daisy Studious"));
    }
}
