//! Streaming Synthesis Orchestrator - 单个 bundle 的流式合成
//!
//! 生产者任务：驱动推理引擎，逐块落盘、生成口型、写入有序缓冲区，然后把块序号推入队列。
//! 消费者任务：按 FIFO 取序号，序号 0 时打开播放流，每块触发人脸动画并写入播放流。
//!
//! 生产者在任何退出路径上都恰好推送一次结束信号，消费者因此不会永久阻塞。
//! 两个任务 join 之后才返回；生产者的错误优先于消费者的错误。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioOutputPort, AudioStoragePort, BundleSynthesizerPort, DecodingOptions, FaceAnimatorPort,
    InferRequest, PlaybackStream, TtsEnginePort, VisemeGeneratorPort, VisemeStorePort,
    VoiceEmbedding, VoiceRegistryPort,
};
use crate::domain::speech::{
    Expression, SessionId, SynthesisParams, TextBundle, MAX_SPEED, MIN_SPEED, SUPPORTED_LANGUAGES,
};
use crate::domain::{AudioChunk, AudioFormat};

/// 生产者 → 消费者的队列消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkSignal {
    /// 缓冲区中已可见的块序号
    Chunk(usize),
    /// 结束信号
    Finished,
}

type ChunkBuffer = Arc<RwLock<Vec<Arc<AudioChunk>>>>;

/// 口型生成 + 人脸动画
#[derive(Clone)]
pub struct FacePipeline {
    pub generator: Arc<dyn VisemeGeneratorPort>,
    pub store: Arc<dyn VisemeStorePort>,
    pub animator: Arc<dyn FaceAnimatorPort>,
    pub default_expression: Expression,
}

impl FacePipeline {
    /// 生成并保存口型；失败只记录日志
    async fn prepare(&self, chunk: &AudioChunk, language: &str) {
        let key = chunk.key();
        let cues = match self.generator.generate(&chunk.path, language).await {
            Ok(cues) => cues,
            Err(e) => {
                tracing::warn!(chunk = %key, error = %e, "Viseme generation failed");
                return;
            }
        };
        if let Err(e) = self.store.save(&key, &cues).await {
            tracing::warn!(chunk = %key, error = %e, "Failed to store visemes");
        }
    }

    async fn animate(&self, key: &str, expression: Option<Expression>) {
        let expression = expression.unwrap_or(self.default_expression);
        if let Err(e) = self.animator.animate(key, expression).await {
            tracing::warn!(chunk = %key, error = %e, "Face animation failed");
        }
    }
}

/// 编排器
pub struct SynthesisOrchestrator {
    engine: Arc<dyn TtsEnginePort>,
    voices: Arc<dyn VoiceRegistryPort>,
    output: Arc<dyn AudioOutputPort>,
    storage: Arc<dyn AudioStoragePort>,
    face: Option<FacePipeline>,
    decoding: DecodingOptions,
    /// 引擎与播放设备同一时间只服务一个 bundle
    pipeline_lock: Mutex<()>,
}

impl SynthesisOrchestrator {
    pub fn new(
        engine: Arc<dyn TtsEnginePort>,
        voices: Arc<dyn VoiceRegistryPort>,
        output: Arc<dyn AudioOutputPort>,
        storage: Arc<dyn AudioStoragePort>,
        decoding: DecodingOptions,
    ) -> Self {
        Self {
            engine,
            voices,
            output,
            storage,
            face: None,
            decoding,
            pipeline_lock: Mutex::new(()),
        }
    }

    pub fn with_face(mut self, face: FacePipeline) -> Self {
        self.face = Some(face);
        self
    }

    /// 启动任务前的校验
    async fn preflight(&self, params: &SynthesisParams) -> Result<VoiceEmbedding, ApplicationError> {
        if !SUPPORTED_LANGUAGES.contains(&params.language.as_str()) {
            return Err(ApplicationError::UnsupportedLanguage(params.language.clone()));
        }
        if !(MIN_SPEED..=MAX_SPEED).contains(&params.speed) {
            return Err(ApplicationError::invalid_argument(
                "speed",
                format!("must be between {} and {}", MIN_SPEED, MAX_SPEED),
            ));
        }
        self.voices
            .lookup(&params.speaker)
            .await?
            .ok_or_else(|| ApplicationError::SpeakerNotFound(params.speaker.clone()))
    }
}

#[async_trait]
impl BundleSynthesizerPort for SynthesisOrchestrator {
    async fn synthesize(
        &self,
        bundle: &TextBundle,
        session: &SessionId,
        params: &SynthesisParams,
    ) -> Result<PathBuf, ApplicationError> {
        let voice = self.preflight(params).await?;

        let _guard = self.pipeline_lock.lock().await;

        let (tx, rx) = mpsc::unbounded_channel();
        let buffer: ChunkBuffer = Arc::new(RwLock::new(Vec::new()));

        let producer = Producer {
            engine: self.engine.clone(),
            storage: self.storage.clone(),
            face: self.face.clone(),
            buffer: buffer.clone(),
            session: *session,
            bundle_index: bundle.index(),
            request: InferRequest {
                text: bundle.text().to_string(),
                language: params.language.clone(),
                voice,
                speed: params.speed,
                temperature: params.temperature,
                decoding: self.decoding.clone(),
            },
        };
        let consumer = Consumer {
            output: self.output.clone(),
            face: self.face.clone(),
            buffer,
            playback: params.playback,
            expression: params.expression,
        };

        let producer = tokio::spawn(producer.run(tx));
        let consumer = tokio::spawn(consumer.run(rx));
        let (produced, consumed) = tokio::join!(producer, consumer);

        let produced =
            produced.map_err(|e| ApplicationError::internal(format!("producer task: {}", e)))?;
        let consumed =
            consumed.map_err(|e| ApplicationError::internal(format!("consumer task: {}", e)))?;

        match (produced, consumed) {
            (Err(e), consumer_result) => {
                if let Err(consumer_err) = consumer_result {
                    tracing::warn!(error = %consumer_err, "Consumer also failed");
                }
                tracing::error!(
                    session_id = %session,
                    bundle_index = bundle.index(),
                    error = %e,
                    "Bundle synthesis failed"
                );
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
            (Ok(path), Ok(())) => Ok(path),
        }
    }
}

struct Producer {
    engine: Arc<dyn TtsEnginePort>,
    storage: Arc<dyn AudioStoragePort>,
    face: Option<FacePipeline>,
    buffer: ChunkBuffer,
    session: SessionId,
    bundle_index: usize,
    request: InferRequest,
}

impl Producer {
    async fn run(self, tx: mpsc::UnboundedSender<ChunkSignal>) -> Result<PathBuf, ApplicationError> {
        let result = self.produce(&tx).await;
        // 消费者可能已退出，忽略发送失败
        let _ = tx.send(ChunkSignal::Finished);
        result
    }

    async fn produce(
        &self,
        tx: &mpsc::UnboundedSender<ChunkSignal>,
    ) -> Result<PathBuf, ApplicationError> {
        let started = Instant::now();
        let mut frames = self.engine.infer_stream(self.request.clone()).await?;

        let mut bundle_format: Option<AudioFormat> = None;
        let mut all_frames: Vec<u8> = Vec::new();
        let mut index = 0usize;

        while let Some(frame) = frames.next().await {
            let frame = frame?;
            if index == 0 {
                tracing::info!(
                    session_id = %self.session,
                    bundle_index = self.bundle_index,
                    ttfc_ms = started.elapsed().as_millis() as u64,
                    "Time to first chunk"
                );
            }

            let format = AudioFormat::pcm16(frame.sample_rate, 1);
            match bundle_format {
                None => bundle_format = Some(format),
                Some(expected) if expected != format => {
                    return Err(ApplicationError::synthesis(format!(
                        "engine changed format mid-stream: {} -> {}",
                        expected, format
                    )));
                }
                Some(_) => {}
            }

            let pcm = samples_to_pcm16(&frame.samples);
            let path = self.storage.chunk_path(&self.session, self.bundle_index, index);
            self.storage.write_wav(&path, format, &pcm).await?;

            let chunk = Arc::new(AudioChunk {
                index,
                frames: pcm,
                format,
                path,
            });

            if let Some(face) = &self.face {
                face.prepare(&chunk, &self.request.language).await;
            }

            all_frames.extend_from_slice(&chunk.frames);
            self.buffer.write().await.push(chunk.clone());

            tracing::debug!(
                session_id = %self.session,
                bundle_index = self.bundle_index,
                chunk_index = index,
                duration_secs = chunk.duration_secs(),
                "Chunk produced"
            );

            // 写入缓冲区之后才推送序号
            tx.send(ChunkSignal::Chunk(index))
                .map_err(|_| ApplicationError::internal("consumer stopped before producer"))?;
            index += 1;
        }

        let format = bundle_format
            .ok_or_else(|| ApplicationError::synthesis("engine produced no audio"))?;

        let bundle_path = self.storage.bundle_path(&self.session, self.bundle_index);
        self.storage.write_wav(&bundle_path, format, &all_frames).await?;

        tracing::info!(
            session_id = %self.session,
            bundle_index = self.bundle_index,
            chunks = index,
            elapsed_ms = started.elapsed().as_millis() as u64,
            path = %bundle_path.display(),
            "Bundle audio written"
        );

        Ok(bundle_path)
    }
}

struct Consumer {
    output: Arc<dyn AudioOutputPort>,
    face: Option<FacePipeline>,
    buffer: ChunkBuffer,
    playback: bool,
    expression: Option<Expression>,
}

impl Consumer {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<ChunkSignal>) -> Result<(), ApplicationError> {
        let mut stream: Option<Box<dyn PlaybackStream>> = None;
        let mut first_error: Option<ApplicationError> = None;

        while let Some(signal) = rx.recv().await {
            let index = match signal {
                ChunkSignal::Chunk(index) => index,
                ChunkSignal::Finished => break,
            };

            let chunk = self.buffer.read().await.get(index).cloned();
            let Some(chunk) = chunk else {
                first_error.get_or_insert_with(|| {
                    ApplicationError::internal(format!("chunk {} signalled before it was buffered", index))
                });
                continue;
            };

            if index == 0 {
                match self.output.open(chunk.format).await {
                    Ok(opened) => stream = Some(opened),
                    Err(e) if self.playback => {
                        first_error.get_or_insert(e.into());
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Playback device unavailable");
                    }
                }
            }

            if let Some(face) = &self.face {
                face.animate(&chunk.key(), self.expression).await;
            }

            if self.playback {
                if let Some(open) = stream.as_mut() {
                    tracing::debug!(chunk_index = index, "Playing back chunk");
                    if let Err(e) = open.write(&chunk.frames).await {
                        first_error.get_or_insert(e.into());
                        // 播放流已损坏，后续块只做动画
                        stream = None;
                    }
                }
            }
        }

        if let Some(mut open) = stream.take() {
            if let Err(e) = open.close().await {
                if self.playback {
                    first_error.get_or_insert(e.into());
                } else {
                    tracing::warn!(error = %e, "Failed to close playback stream");
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// 浮点采样 → 16-bit 小端 PCM
fn samples_to_pcm16(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|s| ((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        EngineFrame, FaceError, FrameStream, PlaybackError, TtsError, VisemeCue,
    };
    use crate::infrastructure::adapters::{FileAudioStorage, FileVisemeStore};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// 第 i 帧有 (i + 1) * 10 个采样
    struct ScriptedEngine {
        frames: usize,
        fail_after: Option<usize>,
        calls: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(frames: usize, fail_after: Option<usize>) -> Self {
            Self {
                frames,
                fail_after,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TtsEnginePort for ScriptedEngine {
        async fn infer_stream(&self, _request: InferRequest) -> Result<FrameStream, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail_after = self.fail_after;
            let items: Vec<Result<EngineFrame, TtsError>> = (0..self.frames)
                .map(|i| {
                    if fail_after == Some(i) {
                        Err(TtsError::ServiceError("CUDA out of memory".to_string()))
                    } else {
                        Ok(EngineFrame {
                            samples: vec![0.25; (i + 1) * 10],
                            sample_rate: 16000,
                        })
                    }
                })
                .collect();
            Ok(futures_util::stream::iter(items).boxed())
        }
    }

    struct StaticVoices;

    #[async_trait]
    impl VoiceRegistryPort for StaticVoices {
        async fn lookup(&self, speaker: &str) -> Result<Option<VoiceEmbedding>, TtsError> {
            Ok((speaker == "Nova Hogarth").then(|| VoiceEmbedding::new(speaker)))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingOutput {
        events: Arc<StdMutex<Vec<String>>>,
    }

    struct RecordingStream {
        events: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl AudioOutputPort for RecordingOutput {
        async fn open(&self, format: AudioFormat) -> Result<Box<dyn PlaybackStream>, PlaybackError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("open:{}", format.sample_rate));
            Ok(Box::new(RecordingStream {
                events: self.events.clone(),
            }))
        }
    }

    #[async_trait]
    impl PlaybackStream for RecordingStream {
        async fn write(&mut self, frames: &[u8]) -> Result<(), PlaybackError> {
            // 模拟实时写入
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.events
                .lock()
                .unwrap()
                .push(format!("write:{}", frames.len()));
            Ok(())
        }

        async fn close(&mut self) -> Result<(), PlaybackError> {
            self.events.lock().unwrap().push("close".to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAnimator {
        calls: StdMutex<Vec<(String, Expression)>>,
    }

    #[async_trait]
    impl FaceAnimatorPort for RecordingAnimator {
        async fn animate(&self, key: &str, expression: Expression) -> Result<(), FaceError> {
            self.calls.lock().unwrap().push((key.to_string(), expression));
            Ok(())
        }
    }

    struct IdleVisemes;

    #[async_trait]
    impl VisemeGeneratorPort for IdleVisemes {
        async fn generate(
            &self,
            _chunk_path: &Path,
            _language: &str,
        ) -> Result<Vec<VisemeCue>, FaceError> {
            Ok(vec![VisemeCue {
                time: 0.2,
                viseme: "IDLE".to_string(),
            }])
        }
    }

    struct Fixture {
        dir: TempDir,
        engine: Arc<ScriptedEngine>,
        output: RecordingOutput,
        orchestrator: SynthesisOrchestrator,
    }

    async fn fixture(engine: ScriptedEngine) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileAudioStorage::new(dir.path()).await.unwrap());
        let engine = Arc::new(engine);
        let output = RecordingOutput::default();
        let orchestrator = SynthesisOrchestrator::new(
            engine.clone(),
            Arc::new(StaticVoices),
            Arc::new(output.clone()),
            storage,
            DecodingOptions::default(),
        );
        Fixture {
            dir,
            engine,
            output,
            orchestrator,
        }
    }

    fn params(playback: bool) -> SynthesisParams {
        SynthesisParams {
            language: "en".to_string(),
            speaker: "Nova Hogarth".to_string(),
            speed: 1.0,
            temperature: 0.01,
            playback,
            expression: None,
        }
    }

    fn bundle() -> TextBundle {
        TextBundle::verbatim(0, "The rain in Spain falls mainly in the plain.".to_string())
    }

    #[tokio::test]
    async fn test_chunks_played_in_generation_order() {
        let fx = fixture(ScriptedEngine::new(3, None)).await;
        let session = SessionId::new();

        let path = fx
            .orchestrator
            .synthesize(&bundle(), &session, &params(true))
            .await
            .unwrap();

        let events = fx.output.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["open:16000", "write:20", "write:40", "write:60", "close"]
        );

        assert_eq!(path, fx.dir.path().join(format!("tts_{}_0.wav", session)));
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 60);
        for i in 0..3 {
            assert!(fx
                .dir
                .path()
                .join(format!("tts_{}_0_chunk{}.wav", session, i))
                .exists());
        }
    }

    #[tokio::test]
    async fn test_playback_disabled_skips_writes() {
        let fx = fixture(ScriptedEngine::new(2, None)).await;
        fx.orchestrator
            .synthesize(&bundle(), &SessionId::new(), &params(false))
            .await
            .unwrap();

        let events = fx.output.events.lock().unwrap().clone();
        assert_eq!(events, vec!["open:16000", "close"]);
    }

    #[tokio::test]
    async fn test_engine_failure_unblocks_consumer() {
        let fx = fixture(ScriptedEngine::new(4, Some(2))).await;

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            fx.orchestrator
                .synthesize(&bundle(), &SessionId::new(), &params(true)),
        )
        .await
        .expect("pipeline deadlocked");

        assert!(matches!(result, Err(ApplicationError::SynthesisFailure(_))));
        let events = fx.output.events.lock().unwrap().clone();
        assert_eq!(events, vec!["open:16000", "write:20", "write:40", "close"]);
    }

    #[tokio::test]
    async fn test_empty_stream_is_failure() {
        let fx = fixture(ScriptedEngine::new(0, None)).await;
        let result = fx
            .orchestrator
            .synthesize(&bundle(), &SessionId::new(), &params(true))
            .await;

        assert!(matches!(result, Err(ApplicationError::SynthesisFailure(_))));
        assert!(fx.output.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_runs_before_any_task() {
        let fx = fixture(ScriptedEngine::new(3, None)).await;
        let session = SessionId::new();

        let mut bad_language = params(true);
        bad_language.language = "xx".to_string();
        let err = fx
            .orchestrator
            .synthesize(&bundle(), &session, &bad_language)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'xx' is not a supported language.");

        let mut bad_speaker = params(true);
        bad_speaker.speaker = "Nobody".to_string();
        let err = fx
            .orchestrator
            .synthesize(&bundle(), &session, &bad_speaker)
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::SpeakerNotFound(_)));

        let mut bad_speed = params(true);
        bad_speed.speed = 0.0;
        let err = fx
            .orchestrator
            .synthesize(&bundle(), &session, &bad_speed)
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidArgument { .. }));

        assert_eq!(fx.engine.calls.load(Ordering::SeqCst), 0);
        assert!(fx.output.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_face_pipeline_animates_each_chunk() {
        let fx = fixture(ScriptedEngine::new(2, None)).await;
        let animator = Arc::new(RecordingAnimator::default());
        let orchestrator = fx.orchestrator.with_face(FacePipeline {
            generator: Arc::new(IdleVisemes),
            store: Arc::new(FileVisemeStore::new(fx.dir.path())),
            animator: animator.clone(),
            default_expression: Expression::Default,
        });
        let session = SessionId::new();
        let mut request = params(false);
        request.expression = Some(Expression::Happy);

        orchestrator
            .synthesize(&bundle(), &session, &request)
            .await
            .unwrap();

        let calls = animator.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (format!("tts_{}_0_chunk0", session), Expression::Happy),
                (format!("tts_{}_0_chunk1", session), Expression::Happy),
            ]
        );
        assert!(fx
            .dir
            .path()
            .join(format!("tts_{}_0_chunk1.visemes.json", session))
            .exists());
    }

    #[test]
    fn test_pcm16_conversion_clamps() {
        let pcm = samples_to_pcm16(&[0.0, 1.0, -2.0]);
        assert_eq!(pcm, [0, 0, 0xff, 0x7f, 0x01, 0x80]);
    }
}
