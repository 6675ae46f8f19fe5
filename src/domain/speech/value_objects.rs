//! Speech Context - Value Objects

use serde::{Deserialize, Serialize};

use super::RequestError;

/// 推理引擎支持的语言（ISO 639-1，小写）
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "ar", "cs", "de", "en", "es", "fr", "hu", "it", "nl", "pl", "pt", "ru", "tr", "zh", "ko", "ja",
];

/// 音素识别器使用的语言 ID（ISO 639-3），未知语言回退到英语
pub fn recognizer_language(code: &str) -> &'static str {
    match code {
        "ar" => "ara",
        "cs" => "ces",
        "de" => "deu",
        "es" => "spa",
        "fr" => "fra",
        "hu" => "hun",
        "it" => "ita",
        "nl" => "nld",
        "pl" => "pol",
        "pt" => "por",
        "ru" => "rus",
        "tr" => "tur",
        "zh" => "cmn",
        "ko" => "kor",
        "ja" => "jpn",
        _ => "eng",
    }
}

/// 长文本拆分方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// 不拆分，整段文本一次合成
    #[default]
    None,
    /// 每个句子单独合成
    Sentence,
    /// 按字符上限重新打包句子
    Intelligent,
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitMode::None => write!(f, "none"),
            SplitMode::Sentence => write!(f, "sentence"),
            SplitMode::Intelligent => write!(f, "intelligent"),
        }
    }
}

impl std::str::FromStr for SplitMode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(SplitMode::None),
            "sentence" => Ok(SplitMode::Sentence),
            "intelligent" => Ok(SplitMode::Intelligent),
            other => Err(RequestError::invalid(
                "split",
                format!("'{other}' is not one of none, sentence, intelligent"),
            )),
        }
    }
}

/// 人脸表情预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Default,
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
}

impl Expression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Default => "default",
            Expression::Angry => "angry",
            Expression::Disgust => "disgust",
            Expression::Fear => "fear",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Surprise => "surprise",
        }
    }
}

impl std::str::FromStr for Expression {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Expression::Default),
            "angry" => Ok(Expression::Angry),
            "disgust" => Ok(Expression::Disgust),
            "fear" => Ok(Expression::Fear),
            "happy" => Ok(Expression::Happy),
            "sad" => Ok(Expression::Sad),
            "surprise" => Ok(Expression::Surprise),
            other => Err(RequestError::invalid(
                "expression",
                format!("unknown expression preset '{other}'"),
            )),
        }
    }
}

/// 一次推理调用的文本单元
///
/// 不变量:
/// - sentences 非空（verbatim 模式下为整段文本本身）
/// - 所有 bundle 的 sentences 按顺序拼接后等于原句子序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBundle {
    index: usize,
    text: String,
    sentences: Vec<String>,
    char_len: usize,
}

impl TextBundle {
    /// 原样文本（none / sentence 模式）
    pub fn verbatim(index: usize, text: String) -> Self {
        let char_len = text.chars().count();
        Self {
            index,
            sentences: vec![text.clone()],
            text,
            char_len,
        }
    }

    /// 由多个句子打包，每句前加一个空格分隔
    pub fn packed(index: usize, sentences: Vec<String>) -> Self {
        let text = sentences.iter().map(|s| format!(" {s}")).collect::<String>();
        let char_len = sentences.iter().map(|s| s.chars().count()).sum();
        Self {
            index,
            text,
            sentences,
            char_len,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 送入推理引擎的文本
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    /// 句子字符数之和（不含分隔空格）
    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_mode_parse() {
        assert_eq!("Intelligent".parse::<SplitMode>().unwrap(), SplitMode::Intelligent);
        assert_eq!("sentence".parse::<SplitMode>().unwrap(), SplitMode::Sentence);
        assert_eq!("none".parse::<SplitMode>().unwrap(), SplitMode::None);
        assert!("paragraph".parse::<SplitMode>().is_err());
    }

    #[test]
    fn test_expression_parse() {
        assert_eq!("HAPPY".parse::<Expression>().unwrap(), Expression::Happy);
        assert!("smug".parse::<Expression>().is_err());
    }

    #[test]
    fn test_packed_bundle_text() {
        let bundle = TextBundle::packed(3, vec!["One.".into(), "Two.".into()]);
        assert_eq!(bundle.text(), " One. Two.");
        assert_eq!(bundle.char_len(), 8);
        assert_eq!(bundle.index(), 3);
    }

    #[test]
    fn test_recognizer_language_fallback() {
        assert_eq!(recognizer_language("de"), "deu");
        assert_eq!(recognizer_language("xx"), "eng");
    }
}
