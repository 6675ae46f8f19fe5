//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::DecodingOptions;
use crate::domain::speech::{Expression, RequestDefaults};
use crate::domain::DEFAULT_CHAR_LIMIT;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 分句配置
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// 拼接配置
    #[serde(default)]
    pub assembler: AssemblerConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 人脸动画配置
    #[serde(default)]
    pub face: FaceConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8003
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// TTS 后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackend {
    #[default]
    Http,
    /// 本地正弦波，离线调试用
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub backend: TtsBackend,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 响应未携带采样率时使用
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_speaker")]
    pub default_speaker: String,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f64,

    /// 解码超参数，每个请求都相同
    #[serde(default)]
    pub decoding: DecodingOptions,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_speaker() -> String {
    "Nova Hogarth".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_temperature() -> f64 {
    0.01
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            sample_rate: default_sample_rate(),
            default_speaker: default_speaker(),
            default_language: default_language(),
            default_temperature: default_temperature(),
            decoding: DecodingOptions::default(),
        }
    }
}

impl TtsConfig {
    /// 请求未给出字段时的默认值
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            language: self.default_language.clone(),
            speaker: self.default_speaker.clone(),
            temperature: self.default_temperature,
        }
    }
}

/// 分句配置
#[derive(Debug, Clone, Deserialize)]
pub struct SegmenterConfig {
    /// 单个 bundle 的字符上限
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,
}

fn default_char_limit() -> usize {
    DEFAULT_CHAR_LIMIT
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            char_limit: default_char_limit(),
        }
    }
}

/// 拼接配置
#[derive(Debug, Clone, Deserialize)]
pub struct AssemblerConfig {
    /// 片段之间的静音（秒，speed = 1 时）
    #[serde(default = "default_silence_secs")]
    pub silence_secs: f64,
}

fn default_silence_secs() -> f64 {
    0.5
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            silence_secs: default_silence_secs(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 音频与口型文件目录
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("data/phrases")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
        }
    }
}

/// 播放后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackBackend {
    /// 写入外部播放器的 stdin
    #[default]
    Pipe,
    /// 丢弃所有音频
    Null,
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub backend: PlaybackBackend,

    /// 播放器命令
    #[serde(default = "default_playback_command")]
    pub command: String,

    /// 参数模板，支持 `{rate}` `{channels}` `{format}`
    #[serde(default = "default_playback_args")]
    pub args: Vec<String>,
}

fn default_playback_command() -> String {
    "aplay".to_string()
}

fn default_playback_args() -> Vec<String> {
    [
        "-q", "-t", "raw", "-f", "{format}", "-r", "{rate}", "-c", "{channels}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            backend: PlaybackBackend::default(),
            command: default_playback_command(),
            args: default_playback_args(),
        }
    }
}

/// 人脸动画配置
#[derive(Debug, Clone, Deserialize)]
pub struct FaceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// 人脸服务 URL
    #[serde(default = "default_face_url")]
    pub url: String,

    /// 音素识别服务 URL
    #[serde(default = "default_recognizer_url")]
    pub recognizer_url: String,

    /// 启动探测超时（毫秒）
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// 请求未指定表情时使用
    #[serde(default)]
    pub default_expression: Expression,

    /// 口型序列末尾 IDLE 的额外延迟（秒）
    #[serde(default = "default_idle_margin")]
    pub idle_margin_secs: f64,
}

fn default_face_url() -> String {
    "http://localhost:8008".to_string()
}

fn default_recognizer_url() -> String {
    "http://localhost:8009".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_idle_margin() -> f64 {
    0.2
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_face_url(),
            recognizer_url: default_recognizer_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
            default_expression: Expression::default(),
            idle_margin_secs: default_idle_margin(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8003);
        assert_eq!(config.tts.backend, TtsBackend::Http);
        assert_eq!(config.tts.sample_rate, 24000);
        assert_eq!(config.segmenter.char_limit, 255);
        assert_eq!(config.assembler.silence_secs, 0.5);
        assert_eq!(config.storage.audio_dir, PathBuf::from("data/phrases"));
        assert_eq!(config.playback.backend, PlaybackBackend::Pipe);
        assert!(!config.face.enabled);
        assert_eq!(config.face.default_expression, Expression::Default);
    }

    #[test]
    fn test_request_defaults_follow_tts_section() {
        let mut tts = TtsConfig::default();
        tts.default_speaker = "Daisy Studious".to_string();
        tts.default_language = "de".to_string();

        let defaults = tts.request_defaults();
        assert_eq!(defaults.speaker, "Daisy Studious");
        assert_eq!(defaults.language, "de");
        assert_eq!(defaults.temperature, 0.01);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let json = r#"{
            "tts": {"backend": "fake", "decoding": {"top_k": 10}},
            "playback": {"backend": "null"},
            "face": {"enabled": true, "default_expression": "happy"}
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.tts.backend, TtsBackend::Fake);
        assert_eq!(config.tts.decoding.top_k, 10);
        assert_eq!(config.tts.decoding.top_p, 0.85);
        assert_eq!(config.playback.backend, PlaybackBackend::Null);
        assert_eq!(config.playback.command, "aplay");
        assert!(config.face.enabled);
        assert_eq!(config.face.default_expression, Expression::Happy);
        assert_eq!(config.server.port, 8003);
    }
}
