//! Pipe Audio Output - 通过外部播放器进程输出音频
//!
//! 每次 open 启动一个播放器（默认 aplay），原始 PCM 写入其 stdin。
//! 管道背压使写入大致按实时速率阻塞。

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::application::ports::{AudioOutputPort, PlaybackError, PlaybackStream};
use crate::domain::AudioFormat;

/// 播放器配置
///
/// 参数中的 `{rate}`、`{channels}`、`{format}` 在 open 时替换
#[derive(Debug, Clone)]
pub struct PipeAudioOutputConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for PipeAudioOutputConfig {
    fn default() -> Self {
        Self {
            command: "aplay".to_string(),
            args: [
                "-q", "-t", "raw", "-f", "{format}", "-r", "{rate}", "-c", "{channels}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// ALSA 采样格式名
fn alsa_format(sample_width: u16) -> Result<&'static str, PlaybackError> {
    match sample_width {
        1 => Ok("U8"),
        2 => Ok("S16_LE"),
        3 => Ok("S24_3LE"),
        4 => Ok("S32_LE"),
        other => Err(PlaybackError::UnsupportedFormat(format!(
            "{}-byte samples",
            other
        ))),
    }
}

fn render_args(args: &[String], format: AudioFormat) -> Result<Vec<String>, PlaybackError> {
    let sample_format = alsa_format(format.sample_width)?;
    Ok(args
        .iter()
        .map(|arg| {
            arg.replace("{rate}", &format.sample_rate.to_string())
                .replace("{channels}", &format.channels.to_string())
                .replace("{format}", sample_format)
        })
        .collect())
}

/// 外部播放器输出
pub struct PipeAudioOutput {
    config: PipeAudioOutputConfig,
}

impl PipeAudioOutput {
    pub fn new(config: PipeAudioOutputConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AudioOutputPort for PipeAudioOutput {
    async fn open(&self, format: AudioFormat) -> Result<Box<dyn PlaybackStream>, PlaybackError> {
        let args = render_args(&self.config.args, format)?;

        let mut child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PlaybackError::OpenFailed(format!("{}: {}", self.config.command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlaybackError::OpenFailed("player stdin unavailable".to_string()))?;

        tracing::debug!(
            command = %self.config.command,
            format = %format,
            "Playback stream opened"
        );

        Ok(Box::new(PipeStream {
            child,
            stdin: Some(stdin),
        }))
    }
}

struct PipeStream {
    child: Child,
    stdin: Option<ChildStdin>,
}

#[async_trait]
impl PlaybackStream for PipeStream {
    async fn write(&mut self, frames: &[u8]) -> Result<(), PlaybackError> {
        let stdin = self.stdin.as_mut().ok_or(PlaybackError::Closed)?;
        stdin
            .write_all(frames)
            .await
            .map_err(|e| PlaybackError::WriteFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), PlaybackError> {
        let Some(mut stdin) = self.stdin.take() else {
            return Err(PlaybackError::Closed);
        };
        stdin
            .flush()
            .await
            .map_err(|e| PlaybackError::WriteFailed(e.to_string()))?;
        // 关闭 stdin，播放器读到 EOF 后播完剩余数据退出
        drop(stdin);

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| PlaybackError::WriteFailed(e.to_string()))?;
        if !status.success() {
            return Err(PlaybackError::WriteFailed(format!(
                "player exited with {}",
                status
            )));
        }

        tracing::debug!("Playback stream closed");
        Ok(())
    }
}
