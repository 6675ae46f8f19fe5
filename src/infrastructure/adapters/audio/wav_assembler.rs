//! WAV Assembler - 基于 hound 的 bundle 音频拼接
//!
//! 所有输入的 WavSpec 必须完全一致，检查通过后才会创建输出文件。
//! 相邻输入之间插入 `silence_secs / speed` 秒静音，首尾不加。

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{AssembleError, AudioAssemblerPort};
use crate::domain::AudioFormat;

/// 默认的 bundle 间静音（秒）
pub const DEFAULT_SILENCE_SECS: f64 = 0.5;

/// WAV 拼接器
pub struct WavAssembler {
    silence_secs: f64,
}

impl WavAssembler {
    pub fn new(silence_secs: f64) -> Self {
        Self { silence_secs }
    }
}

impl Default for WavAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_SECS)
    }
}

/// 拆出文件名末尾的 `_N`；没有数字后缀时返回 None
fn split_suffix(stem: &str) -> (&str, Option<&str>) {
    match stem.rsplit_once('_') {
        Some((base, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => {
            (base, Some(tail))
        }
        _ => (stem, None),
    }
}

fn file_stem(path: &Path) -> Result<String, AssembleError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| AssembleError::InvalidInput(format!("no file name: {}", path.display())))
}

/// 输出文件名：首个输入去掉 `_N` 后，依次接上每个输入的后缀
pub fn assembled_path(inputs: &[PathBuf]) -> Result<PathBuf, AssembleError> {
    let first = inputs
        .first()
        .ok_or_else(|| AssembleError::InvalidInput("no inputs".to_string()))?;
    let first_stem = file_stem(first)?;
    let (base, _) = split_suffix(&first_stem);

    let mut name = base.to_string();
    for input in inputs {
        let stem = file_stem(input)?;
        match split_suffix(&stem) {
            (_, Some(suffix)) => name.push_str(&format!("_{}", suffix)),
            (_, None) => name.push_str(&format!("_{}", stem)),
        }
    }
    name.push_str(".wav");

    Ok(first.with_file_name(name))
}

/// 单段静音上限（秒）
pub const MAX_SILENCE_SECS: f64 = 60.0;

/// 静音帧数：round(silence / speed × rate)，不超过 [`MAX_SILENCE_SECS`]
pub fn silence_frames(silence_secs: f64, speed: f64, sample_rate: u32) -> Result<usize, AssembleError> {
    let secs = silence_secs / speed;
    if !secs.is_finite() || !(0.0..=MAX_SILENCE_SECS).contains(&secs) {
        return Err(AssembleError::InvalidInput(format!(
            "silence of {}s at speed {} is out of range",
            silence_secs, speed
        )));
    }
    Ok((secs * sample_rate as f64).round() as usize)
}

fn io_err(e: hound::Error) -> AssembleError {
    AssembleError::Io(e.to_string())
}

fn assemble_blocking(
    inputs: Vec<PathBuf>,
    silence_secs: f64,
    speed: f64,
) -> Result<PathBuf, AssembleError> {
    let mut readers = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let reader = hound::WavReader::open(path)
            .map_err(|e| AssembleError::Io(format!("{}: {}", path.display(), e)))?;
        readers.push(reader);
    }

    let spec = readers[0].spec();
    for (path, reader) in inputs.iter().zip(&readers).skip(1) {
        if reader.spec() != spec {
            return Err(AssembleError::FormatMismatch {
                path: path.clone(),
                expected: AudioFormat::from(spec),
                found: AudioFormat::from(reader.spec()),
            });
        }
    }

    let silence = silence_frames(silence_secs, speed, spec.sample_rate)? * spec.channels as usize;
    let output = assembled_path(&inputs)?;

    let result = write_output(&output, spec, readers, silence);
    if result.is_err() {
        let _ = std::fs::remove_file(&output);
    }
    result.map(|_| output)
}

fn write_output<R: std::io::Read>(
    output: &Path,
    spec: hound::WavSpec,
    readers: Vec<hound::WavReader<R>>,
    silence_samples: usize,
) -> Result<(), AssembleError> {
    let mut writer = hound::WavWriter::create(output, spec).map_err(io_err)?;

    for (i, reader) in readers.into_iter().enumerate() {
        match spec.sample_format {
            hound::SampleFormat::Int => {
                if i > 0 {
                    for _ in 0..silence_samples {
                        writer.write_sample(0i32).map_err(io_err)?;
                    }
                }
                for sample in reader.into_samples::<i32>() {
                    writer.write_sample(sample.map_err(io_err)?).map_err(io_err)?;
                }
            }
            hound::SampleFormat::Float => {
                if i > 0 {
                    for _ in 0..silence_samples {
                        writer.write_sample(0f32).map_err(io_err)?;
                    }
                }
                for sample in reader.into_samples::<f32>() {
                    writer.write_sample(sample.map_err(io_err)?).map_err(io_err)?;
                }
            }
        }
    }

    writer.finalize().map_err(io_err)
}

#[async_trait]
impl AudioAssemblerPort for WavAssembler {
    async fn assemble(
        &self,
        inputs: &[PathBuf],
        speed: f64,
    ) -> Result<Option<PathBuf>, AssembleError> {
        match inputs {
            [] => return Ok(None),
            [single] => return Ok(Some(single.clone())),
            _ => {}
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(AssembleError::InvalidInput(format!("invalid speed {}", speed)));
        }

        let owned = inputs.to_vec();
        let silence_secs = self.silence_secs;
        let output = tokio::task::spawn_blocking(move || assemble_blocking(owned, silence_secs, speed))
            .await
            .map_err(|e| AssembleError::Io(e.to_string()))??;

        tracing::info!(
            inputs = inputs.len(),
            output = %output.display(),
            "Assembled bundle audio"
        );

        Ok(Some(output))
    }
}
