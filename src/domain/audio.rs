//! 音频值对象

use std::fmt;
use std::path::PathBuf;

/// PCM 格式描述：采样率、声道数、采样宽度（字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_width: u16,
}

impl AudioFormat {
    /// 16-bit 有符号 PCM
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            sample_width: 2,
        }
    }

    /// 每帧字节数
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.sample_width as usize
    }

    /// 指定字节数对应的时长（秒）
    pub fn duration_secs(&self, byte_len: usize) -> f64 {
        let frame_size = self.frame_size();
        if frame_size == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        (byte_len / frame_size) as f64 / self.sample_rate as f64
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}-bit",
            self.sample_rate,
            self.channels,
            self.sample_width * 8
        )
    }
}

impl From<hound::WavSpec> for AudioFormat {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            sample_width: spec.bits_per_sample.div_ceil(8),
        }
    }
}

/// 推理引擎产出的一个音频块，创建后不可变
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// bundle 内从 0 开始的序号
    pub index: usize,
    /// 原始 PCM 帧（小端）
    pub frames: Vec<u8>,
    pub format: AudioFormat,
    pub path: PathBuf,
}

impl AudioChunk {
    /// 块标识：文件名去掉扩展名，人脸动画与口型数据按它关联
    pub fn key(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn duration_secs(&self) -> f64 {
        self.format.duration_secs(self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_wav_spec() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        assert_eq!(AudioFormat::from(spec), AudioFormat::pcm16(24000, 1));
    }

    #[test]
    fn test_chunk_key_and_duration() {
        let chunk = AudioChunk {
            index: 0,
            frames: vec![0u8; 48000],
            format: AudioFormat::pcm16(24000, 1),
            path: PathBuf::from("/tmp/tts_abc_0_chunk0.wav"),
        };
        assert_eq!(chunk.key(), "tts_abc_0_chunk0");
        assert!((chunk.duration_secs() - 1.0).abs() < 1e-9);
    }
}
