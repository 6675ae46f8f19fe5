//! Synthesize Command Handler - 请求分发
//!
//! 请求整体串行；bundle 之间严格顺序执行，前一个 bundle 完全结束后才开始下一个

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::commands::synthesize_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioAssemblerPort, BundleSynthesizerPort};
use crate::domain::speech::SynthesisSession;
use crate::domain::{segment, SegmentConfig};

/// Synthesize Handler
pub struct SynthesizeHandler {
    segment_config: SegmentConfig,
    synthesizer: Arc<dyn BundleSynthesizerPort>,
    assembler: Arc<dyn AudioAssemblerPort>,
    request_lock: Mutex<()>,
}

impl SynthesizeHandler {
    pub fn new(
        segment_config: SegmentConfig,
        synthesizer: Arc<dyn BundleSynthesizerPort>,
        assembler: Arc<dyn AudioAssemblerPort>,
    ) -> Self {
        Self {
            segment_config,
            synthesizer,
            assembler,
            request_lock: Mutex::new(()),
        }
    }

    pub async fn handle(&self, cmd: SynthesizeCommand) -> Result<SynthesizeResponse, ApplicationError> {
        let _guard = self.request_lock.lock().await;

        let request = cmd.request;
        let mut session = SynthesisSession::new();
        let bundles = segment(request.text(), &self.segment_config, request.split());

        tracing::info!(
            session_id = %session.id(),
            split = %request.split(),
            bundles = bundles.len(),
            download = request.download(),
            "Synthesis request accepted"
        );

        for bundle in &bundles {
            tracing::info!(
                session_id = %session.id(),
                bundle_index = bundle.index(),
                text = %bundle.text(),
                "Generating speech for bundle"
            );
            let path = self
                .synthesizer
                .synthesize(bundle, session.id(), request.params())
                .await?;
            session.push_bundle(path);
        }

        let audio_path = self
            .assembler
            .assemble(session.bundle_paths(), request.speed())
            .await?;

        if request.download() && audio_path.is_none() {
            return Err(ApplicationError::internal("no audio was produced"));
        }

        tracing::info!(
            session_id = %session.id(),
            audio = ?audio_path,
            elapsed_ms = session.elapsed_ms(),
            "Synthesis request finished"
        );

        Ok(SynthesizeResponse {
            session_id: *session.id(),
            audio_path,
            download: request.download(),
            bundle_count: bundles.len(),
        })
    }
}
