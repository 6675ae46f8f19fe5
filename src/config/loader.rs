//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, PlaybackBackend, TtsBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXSTREAM_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXSTREAM_SERVER__PORT=8003`
/// - `VOXSTREAM_TTS__URL=http://tts-server:8000`
/// - `VOXSTREAM_PLAYBACK__BACKEND=null`
/// - `VOXSTREAM_FACE__ENABLED=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 结构体上的 serde default 负责缺省值，这里只放最常改的几项
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8003)?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("storage.audio_dir", "data/phrases")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: VOXSTREAM_TTS__URL=http://tts-server:8000
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("VOXSTREAM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.backend == TtsBackend::Http && config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "TTS sample rate must be positive".to_string(),
        ));
    }

    if config.segmenter.char_limit == 0 {
        return Err(ConfigError::ValidationError(
            "Segmenter char limit must be positive".to_string(),
        ));
    }

    if config.assembler.silence_secs.is_nan() || config.assembler.silence_secs < 0.0 {
        return Err(ConfigError::ValidationError(
            "Assembler silence cannot be negative".to_string(),
        ));
    }

    if config.playback.backend == PlaybackBackend::Pipe && config.playback.command.is_empty() {
        return Err(ConfigError::ValidationError(
            "Playback command cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("TTS Backend: {:?}", config.tts.backend);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!(
        "Default Voice: {} ({})",
        config.tts.default_speaker,
        config.tts.default_language
    );
    tracing::info!("Char Limit: {}", config.segmenter.char_limit);
    tracing::info!("Silence Between Bundles: {}s", config.assembler.silence_secs);
    tracing::info!("Audio Directory: {:?}", config.storage.audio_dir);
    tracing::info!("Playback Backend: {:?}", config.playback.backend);
    if config.playback.backend == PlaybackBackend::Pipe {
        tracing::info!(
            "Playback Command: {} {}",
            config.playback.command,
            config.playback.args.join(" ")
        );
    }
    tracing::info!("Face Enabled: {}", config.face.enabled);
    if config.face.enabled {
        tracing::info!("Face URL: {}", config.face.url);
        tracing::info!("Recognizer URL: {}", config.face.recognizer_url);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
