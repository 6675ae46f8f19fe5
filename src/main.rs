//! VoxStream - 流式 TTS 服务
//!
//! 启动流程：配置 -> 日志 -> 适配器 -> 编排器 -> HTTP 服务器

use std::sync::Arc;

use voxstream::application::ports::{AudioOutputPort, TtsEnginePort, VoiceRegistryPort};
use voxstream::application::SynthesizeHandler;
use voxstream::config::{load_config, print_config, AppConfig, PlaybackBackend, TtsBackend};
use voxstream::domain::SegmentConfig;
use voxstream::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, FileAudioStorage, FileVisemeStore, HttpFaceClient,
    HttpFaceClientConfig, HttpTtsClient, HttpTtsClientConfig, HttpVisemeGenerator,
    HttpVisemeGeneratorConfig, NullAudioOutput, PipeAudioOutput, PipeAudioOutputConfig,
    WavAssembler,
};
use voxstream::infrastructure::http::{AppState, HttpServer, ServerConfig};
use voxstream::infrastructure::worker::{FacePipeline, SynthesisOrchestrator};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxstream={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 推理引擎同时充当音色注册表
fn build_engine(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn TtsEnginePort>, Arc<dyn VoiceRegistryPort>)> {
    match config.tts.backend {
        TtsBackend::Http => {
            let tts_config = HttpTtsClientConfig::new(&config.tts.url)
                .with_timeout(config.tts.timeout_secs)
                .with_sample_rate(config.tts.sample_rate);
            let client = Arc::new(HttpTtsClient::new(tts_config)?);
            let engine: Arc<dyn TtsEnginePort> = client.clone();
            Ok((engine, client))
        }
        TtsBackend::Fake => {
            let client = Arc::new(FakeTtsClient::new(FakeTtsClientConfig {
                sample_rate: config.tts.sample_rate,
                ..Default::default()
            }));
            let engine: Arc<dyn TtsEnginePort> = client.clone();
            Ok((engine, client))
        }
    }
}

fn build_output(config: &AppConfig) -> Arc<dyn AudioOutputPort> {
    match config.playback.backend {
        PlaybackBackend::Pipe => Arc::new(PipeAudioOutput::new(PipeAudioOutputConfig {
            command: config.playback.command.clone(),
            args: config.playback.args.clone(),
        })),
        PlaybackBackend::Null => Arc::new(NullAudioOutput),
    }
}

async fn build_face(config: &AppConfig) -> anyhow::Result<FacePipeline> {
    let generator = HttpVisemeGenerator::new(HttpVisemeGeneratorConfig {
        base_url: config.face.recognizer_url.clone(),
        idle_margin_secs: config.face.idle_margin_secs,
        ..Default::default()
    })?;
    let animator = HttpFaceClient::connect(&HttpFaceClientConfig {
        base_url: config.face.url.clone(),
        probe_timeout_ms: config.face.probe_timeout_ms,
        ..Default::default()
    })
    .await;

    Ok(FacePipeline {
        generator: Arc::new(generator),
        store: Arc::new(FileVisemeStore::new(&config.storage.audio_dir)),
        animator,
        default_expression: config.face.default_expression,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("VoxStream - 流式 TTS 服务");
    print_config(&config);

    let storage = Arc::new(FileAudioStorage::new(&config.storage.audio_dir).await?);
    let (engine, voices) = build_engine(&config)?;
    if !engine.health_check().await {
        tracing::warn!(url = %config.tts.url, "TTS engine is not reachable yet");
    }

    let mut orchestrator = SynthesisOrchestrator::new(
        engine,
        voices,
        build_output(&config),
        storage,
        config.tts.decoding.clone(),
    );
    if config.face.enabled {
        orchestrator = orchestrator.with_face(build_face(&config).await?);
    }

    let handler = SynthesizeHandler::new(
        SegmentConfig {
            char_limit: config.segmenter.char_limit,
        },
        Arc::new(orchestrator),
        Arc::new(WavAssembler::new(config.assembler.silence_secs)),
    );
    let state = AppState::new(handler, config.tts.request_defaults());

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
