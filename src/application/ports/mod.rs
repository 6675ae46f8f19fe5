//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_assembler;
mod audio_output;
mod audio_storage;
mod bundle_synthesizer;
mod face;
mod tts_engine;

pub use audio_assembler::{AssembleError, AudioAssemblerPort};
pub use audio_output::{AudioOutputPort, PlaybackError, PlaybackStream};
pub use audio_storage::{AudioStoragePort, StorageError};
pub use bundle_synthesizer::BundleSynthesizerPort;
pub use face::{FaceAnimatorPort, FaceError, VisemeCue, VisemeGeneratorPort, VisemeStorePort};
pub use tts_engine::{
    DecodingOptions, EngineFrame, FrameStream, InferRequest, TtsEnginePort, TtsError,
    VoiceEmbedding, VoiceRegistryPort,
};
