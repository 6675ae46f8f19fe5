//! File Storage - 文件系统音频存储实现
//!
//! 实现 AudioStoragePort trait；所有文件平铺在同一个工作目录

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AudioStoragePort, StorageError};
use crate::domain::speech::SessionId;
use crate::domain::AudioFormat;

/// 文件系统音频存储
pub struct FileAudioStorage {
    /// 存储根目录
    base_dir: PathBuf,
}

impl FileAudioStorage {
    /// 创建新的文件存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }
}

/// 按采样宽度把小端 PCM 写进 WAV
fn encode_wav(path: &Path, format: AudioFormat, frames: &[u8]) -> Result<(), StorageError> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.sample_width * 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| StorageError::Encode(e.to_string()))?;

    let width = format.sample_width as usize;
    let encode_err = |e: hound::Error| StorageError::Encode(e.to_string());
    match width {
        // WAV 8-bit 为无符号
        1 => {
            for &b in frames {
                writer.write_sample((b as i16 - 128) as i8).map_err(encode_err)?;
            }
        }
        2 => {
            for s in frames.chunks_exact(2) {
                writer
                    .write_sample(i16::from_le_bytes([s[0], s[1]]))
                    .map_err(encode_err)?;
            }
        }
        3 => {
            for s in frames.chunks_exact(3) {
                let value = i32::from_le_bytes([0, s[0], s[1], s[2]]) >> 8;
                writer.write_sample(value).map_err(encode_err)?;
            }
        }
        4 => {
            for s in frames.chunks_exact(4) {
                writer
                    .write_sample(i32::from_le_bytes([s[0], s[1], s[2], s[3]]))
                    .map_err(encode_err)?;
            }
        }
        other => return Err(StorageError::UnsupportedWidth(other as u16)),
    }

    writer.finalize().map_err(encode_err)
}

#[async_trait]
impl AudioStoragePort for FileAudioStorage {
    fn bundle_path(&self, session: &SessionId, bundle: usize) -> PathBuf {
        self.base_dir.join(format!("tts_{}_{}.wav", session, bundle))
    }

    fn chunk_path(&self, session: &SessionId, bundle: usize, chunk: usize) -> PathBuf {
        self.base_dir
            .join(format!("tts_{}_{}_chunk{}.wav", session, bundle, chunk))
    }

    async fn write_wav(
        &self,
        path: &Path,
        format: AudioFormat,
        frames: &[u8],
    ) -> Result<(), StorageError> {
        if !matches!(format.sample_width, 1..=4) {
            return Err(StorageError::UnsupportedWidth(format.sample_width));
        }

        let target = path.to_path_buf();
        let data = frames.to_vec();
        tokio::task::spawn_blocking(move || encode_wav(&target, format, &data))
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))??;

        tracing::debug!(
            path = %path.display(),
            size = frames.len(),
            "Saved audio"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_paths_follow_session_layout() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path()).await.unwrap();
        let session = SessionId::new();

        let bundle = storage.bundle_path(&session, 2);
        assert_eq!(
            bundle.file_name().unwrap().to_string_lossy(),
            format!("tts_{}_2.wav", session)
        );
        let chunk = storage.chunk_path(&session, 2, 7);
        assert_eq!(
            chunk.file_stem().unwrap().to_string_lossy(),
            format!("tts_{}_2_chunk7", session)
        );
        assert_eq!(chunk.parent().unwrap(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_write_wav_round_trip_16bit() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path().join("nested")).await.unwrap();
        let path = temp_dir.path().join("nested").join("clip.wav");

        let samples: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let frames: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        storage
            .write_wav(&path, AudioFormat::pcm16(16000, 1), &frames)
            .await
            .unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(AudioFormat::from(reader.spec()), AudioFormat::pcm16(16000, 1));
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[tokio::test]
    async fn test_unsupported_width_rejected() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path()).await.unwrap();
        let format = AudioFormat {
            sample_rate: 8000,
            channels: 1,
            sample_width: 5,
        };
        let err = storage
            .write_wav(&temp_dir.path().join("x.wav"), format, &[0; 10])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedWidth(5)));
    }
}
