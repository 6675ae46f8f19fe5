//! Null Audio Output - 丢弃所有帧（无声卡环境）

use async_trait::async_trait;

use crate::application::ports::{AudioOutputPort, PlaybackError, PlaybackStream};
use crate::domain::AudioFormat;

#[derive(Debug, Default)]
pub struct NullAudioOutput;

#[async_trait]
impl AudioOutputPort for NullAudioOutput {
    async fn open(&self, format: AudioFormat) -> Result<Box<dyn PlaybackStream>, PlaybackError> {
        tracing::debug!(format = %format, "Null playback stream opened");
        Ok(Box::new(NullStream {
            open: true,
            written: 0,
        }))
    }
}

struct NullStream {
    open: bool,
    written: usize,
}

#[async_trait]
impl PlaybackStream for NullStream {
    async fn write(&mut self, frames: &[u8]) -> Result<(), PlaybackError> {
        if !self.open {
            return Err(PlaybackError::Closed);
        }
        self.written += frames.len();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PlaybackError> {
        if !self.open {
            return Err(PlaybackError::Closed);
        }
        self.open = false;
        tracing::debug!(bytes = self.written, "Null playback stream closed");
        Ok(())
    }
}
