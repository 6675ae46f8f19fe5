//! Bundle Synthesizer Port - 单个 bundle 的流式合成
//!
//! 调用方阻塞直到该 bundle 的生产/消费任务全部结束

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::error::ApplicationError;
use crate::domain::speech::{SessionId, SynthesisParams, TextBundle};

#[async_trait]
pub trait BundleSynthesizerPort: Send + Sync {
    /// 返回 bundle 完整音频文件路径
    async fn synthesize(
        &self,
        bundle: &TextBundle,
        session: &SessionId,
        params: &SynthesisParams,
    ) -> Result<PathBuf, ApplicationError>;
}
