//! Synthesize Commands - 语音合成命令

use std::path::PathBuf;

use crate::domain::speech::{SessionId, SynthesisRequest};

/// 合成一个请求：拆分、逐 bundle 合成、拼接
#[derive(Debug, Clone)]
pub struct SynthesizeCommand {
    pub request: SynthesisRequest,
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct SynthesizeResponse {
    pub session_id: SessionId,
    /// 拼接后的音频；没有 bundle 时为 None
    pub audio_path: Option<PathBuf>,
    pub download: bool,
    pub bundle_count: usize,
}
