//! Domain Layer - 领域层
//!
//! - speech: 合成请求、参数、bundle 与会话
//! - audio: 音频格式与分块
//! - text_segmenter: 拆句与重新打包

pub mod audio;
pub mod speech;

mod text_segmenter;

pub use audio::{AudioChunk, AudioFormat};
pub use text_segmenter::{
    rebundle, segment, split_sentences, SegmentConfig, SentenceOverLimit, DEFAULT_CHAR_LIMIT,
};
