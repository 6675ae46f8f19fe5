//! HTTP Viseme Generator - 调用音素识别服务生成口型序列
//!
//! 外部识别服务 API:
//! POST {base_url}/recognize  multipart: file (WAV), lang_id (ISO 639-3)
//! Response: text/plain，每行 `起始秒 时长 IPA音素`

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::application::ports::{FaceError, VisemeCue, VisemeGeneratorPort};
use crate::domain::speech::recognizer_language;

/// 块结尾之后追加 IDLE 的时间余量（秒）
pub const DEFAULT_IDLE_MARGIN_SECS: f64 = 0.2;

pub const IDLE: &str = "IDLE";

/// IPA 音素 → 口型
pub fn ipa_to_viseme(phoneme: &str) -> &'static str {
    match phoneme {
        "a" | "ɑ" | "æ" | "ʌ" | "ɐ" | "aː" | "ɑː" => "AA",
        "e" | "ɛ" | "eː" | "ə" | "ɚ" | "ɜ" | "ɝ" => "EH",
        "i" | "iː" | "ɪ" | "j" | "y" | "ʏ" => "IY",
        "o" | "ɔ" | "oː" | "ɒ" | "ø" | "œ" => "AO",
        "u" | "uː" | "ʊ" | "w" | "ɯ" => "UW",
        "p" | "b" | "m" => "B_M_P",
        "f" | "v" => "F_V",
        "θ" | "ð" => "TH",
        "t" | "d" | "n" | "ɾ" | "ŋ" => "T_D_N",
        "s" | "z" | "ts" | "dz" => "S_Z",
        "ʃ" | "ʒ" | "tʃ" | "dʒ" | "ɕ" | "ʑ" => "CH_J_SH",
        "k" | "g" | "ɡ" | "x" | "ɣ" | "h" | "ʔ" => "K_G",
        "l" | "ɫ" | "ʎ" => "L",
        "r" | "ɹ" | "ʁ" | "ʀ" => "R",
        _ => IDLE,
    }
}

/// 解析识别结果并追加结尾 IDLE
pub fn parse_phonemes(output: &str, chunk_secs: f64, idle_margin: f64) -> Vec<VisemeCue> {
    let mut cues: Vec<VisemeCue> = output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let time = tokens.next()?.parse::<f64>().ok()?;
            let phoneme = tokens.last()?;
            Some(VisemeCue {
                time,
                viseme: ipa_to_viseme(phoneme).to_string(),
            })
        })
        .collect();

    cues.push(VisemeCue {
        time: chunk_secs + idle_margin,
        viseme: IDLE.to_string(),
    });
    cues
}

#[derive(Debug, Clone)]
pub struct HttpVisemeGeneratorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub idle_margin_secs: f64,
}

impl Default for HttpVisemeGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8009".to_string(),
            timeout_secs: 10,
            idle_margin_secs: DEFAULT_IDLE_MARGIN_SECS,
        }
    }
}

pub struct HttpVisemeGenerator {
    client: Client,
    config: HttpVisemeGeneratorConfig,
}

impl HttpVisemeGenerator {
    pub fn new(config: HttpVisemeGeneratorConfig) -> Result<Self, FaceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FaceError::Recognizer(e.to_string()))?;
        Ok(Self { client, config })
    }
}

/// WAV 时长（秒）
fn wav_duration(path: &Path) -> Result<f64, FaceError> {
    let reader = hound::WavReader::open(path).map_err(|e| FaceError::Recognizer(e.to_string()))?;
    let spec = reader.spec();
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

#[async_trait]
impl VisemeGeneratorPort for HttpVisemeGenerator {
    async fn generate(
        &self,
        chunk_path: &Path,
        language: &str,
    ) -> Result<Vec<VisemeCue>, FaceError> {
        let path = chunk_path.to_path_buf();
        let duration = tokio::task::spawn_blocking(move || wav_duration(&path))
            .await
            .map_err(|e| FaceError::Recognizer(e.to_string()))??;

        let bytes = tokio::fs::read(chunk_path)
            .await
            .map_err(|e| FaceError::Recognizer(e.to_string()))?;
        let file_name = chunk_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chunk.wav".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| FaceError::Recognizer(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("lang_id", recognizer_language(language));

        let response = self
            .client
            .post(format!("{}/recognize", self.config.base_url.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await
            .map_err(|e| FaceError::Recognizer(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FaceError::Recognizer(format!(
                "recognizer returned {}",
                response.status()
            )));
        }
        let output = response
            .text()
            .await
            .map_err(|e| FaceError::Recognizer(e.to_string()))?;

        let cues = parse_phonemes(&output, duration, self.config.idle_margin_secs);
        tracing::debug!(
            chunk = %chunk_path.display(),
            cues = cues.len(),
            "Visemes generated"
        );
        Ok(cues)
    }
}
