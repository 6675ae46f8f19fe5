//! Audio Adapter - WAV 拼接

mod wav_assembler;

pub use wav_assembler::{assembled_path, silence_frames, WavAssembler, DEFAULT_SILENCE_SECS};
