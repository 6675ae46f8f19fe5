//! Playback Adapter - 实时音频输出

mod null_output;
mod pipe_output;

pub use null_output::NullAudioOutput;
pub use pipe_output::{PipeAudioOutput, PipeAudioOutputConfig};
