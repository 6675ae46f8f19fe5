//! VoxStream - 流式 TTS 播放服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 分句与重新打包（text_segmenter）
//! - Speech Context: 请求解析、会话、表情与拆分方式
//! - 音频块与格式
//!
//! 应用层 (application/):
//! - Ports: TtsEngine, VoiceRegistry, AudioOutput, AudioStorage, AudioAssembler, Face
//! - Commands: 合成命令处理器（请求串行化、逐 bundle 合成、拼接）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 单一端点 `/`，GET/HEAD 探测，POST 合成
//! - Worker: 流式编排器（生产者/消费者）
//! - Adapters: TTS Client, WAV 存储与拼接, 播放器, 口型与人脸服务

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
