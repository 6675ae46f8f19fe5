//! 文本分割器
//!
//! 按句末标点拆句，并按推理引擎的单次字符上限把句子重新打包成 bundle
//!
//! 三种模式：
//! - `none`: 整段文本作为一个 bundle，不检查上限
//! - `sentence`: 每个句子一个 bundle
//! - `intelligent`: 贪心装箱，让每个 bundle 接近平均目标长度且不超过上限

use thiserror::Error;

use super::speech::{SplitMode, TextBundle};

/// 推理引擎单次调用的默认字符上限
pub const DEFAULT_CHAR_LIMIT: usize = 255;

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 单个 bundle 的字符上限（按 Unicode 标量计数）
    pub char_limit: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            char_limit: DEFAULT_CHAR_LIMIT,
        }
    }
}

/// 单句超过字符上限（仅记录日志，不中断请求）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sentence exceeds {limit}-character limit ({length} chars): \"{sentence}\"")]
pub struct SentenceOverLimit {
    pub sentence: String,
    pub length: usize,
    pub limit: usize,
}

/// 句末标点（含全角句号）
#[inline]
fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '?' | '!' | '。')
}

#[inline]
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// 检查结尾是否像缩写（"e.g." 或 "Mr."），这类位置不拆句
fn ends_with_abbreviation(prefix: &[char]) -> bool {
    let n = prefix.len();
    if n >= 4 && is_word_char(prefix[n - 4]) && prefix[n - 3] == '.' && is_word_char(prefix[n - 2])
    {
        return true;
    }
    n >= 3
        && prefix[n - 3].is_ascii_uppercase()
        && prefix[n - 2].is_ascii_lowercase()
        && prefix[n - 1] == '.'
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// 按句末标点拆句
///
/// 在句末标点之后的空白处断开；全角句号之后即使没有空白也断开。
/// 空片段会被丢弃，其余片段去掉首尾空白。
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        current.push(ch);
        pos += 1;

        if !is_sentence_end(ch) {
            continue;
        }
        let followed_by_space = chars.get(pos).is_some_and(|c| c.is_whitespace());
        if (ch == '。' || followed_by_space) && !ends_with_abbreviation(&chars[..pos]) {
            while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
                pos += 1;
            }
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

/// 贪心装箱：在不超过上限的前提下，让每个 bundle 接近 `total / ceil(total / limit)`
///
/// 单句超过上限时原样单独成一个 bundle（下游有截断风险），不会丢弃。
pub fn rebundle(sentences: &[String], limit: usize) -> Vec<TextBundle> {
    if sentences.is_empty() {
        return Vec::new();
    }

    let lengths: Vec<usize> = sentences.iter().map(|s| s.chars().count()).collect();
    let total: usize = lengths.iter().sum();
    let excess_factor = total.div_ceil(limit.max(1)).max(1);
    let target = total as f64 / excess_factor as f64;

    let mut bundles = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut running = 0usize;
    let mut idx = 0;

    while idx < sentences.len() {
        let sentence = &sentences[idx];
        let with_sentence = running + lengths[idx];
        let mut full = false;

        if with_sentence <= limit {
            current.push(sentence.clone());
            running = with_sentence;
            idx += 1;
            if running as f64 >= target {
                full = true;
            }
        } else {
            full = true;
        }

        // 空 bundle 也装不下：单句超限
        if running == 0 && full {
            let warning = SentenceOverLimit {
                sentence: sentence.clone(),
                length: lengths[idx],
                limit,
            };
            tracing::warn!(error = %warning, "Oversized sentence emitted as its own bundle");
            current.push(sentence.clone());
            running = with_sentence;
            idx += 1;
        }

        if full {
            bundles.push(TextBundle::packed(bundles.len(), std::mem::take(&mut current)));
            running = 0;
        }
    }

    if !current.is_empty() {
        bundles.push(TextBundle::packed(bundles.len(), current));
    }

    bundles
}

/// 对文本进行分段
pub fn segment(text: &str, config: &SegmentConfig, mode: SplitMode) -> Vec<TextBundle> {
    let bundles = match mode {
        SplitMode::None => vec![TextBundle::verbatim(0, text.to_string())],
        SplitMode::Sentence => split_sentences(text)
            .into_iter()
            .enumerate()
            .map(|(index, sentence)| TextBundle::verbatim(index, sentence))
            .collect(),
        SplitMode::Intelligent => rebundle(&split_sentences(text), config.char_limit),
    };

    tracing::debug!(
        mode = %mode,
        text_len = text.chars().count(),
        bundles = bundles.len(),
        "Text segmented"
    );

    bundles
}
