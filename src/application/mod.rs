//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、AudioOutput、Face、Storage、Assembler）
//! - commands: 合成命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

pub use commands::{handlers::SynthesizeHandler, SynthesizeCommand, SynthesizeResponse};

pub use error::ApplicationError;

pub use ports::{
    AssembleError, AudioAssemblerPort, AudioOutputPort, AudioStoragePort, BundleSynthesizerPort,
    DecodingOptions, EngineFrame, FaceAnimatorPort, FaceError, FrameStream, InferRequest,
    PlaybackError, PlaybackStream, StorageError, TtsEnginePort, TtsError, VisemeCue,
    VisemeGeneratorPort, VisemeStorePort, VoiceEmbedding, VoiceRegistryPort,
};
