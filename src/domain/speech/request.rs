//! Speech Context - 合成请求
//!
//! 请求体是一个 JSON 对象；控制字段 `download`、`split` 在解析时被取出，
//! 不会进入 [`SynthesisParams`]。未识别的字段直接拒绝。

use serde_json::{Map, Value};

use super::value_objects::{Expression, SplitMode};
use super::RequestError;

pub const DEFAULT_SPEED: f64 = 1.0;
/// 语速允许范围（闭区间）
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 10.0;

/// 请求中未给出时使用的默认值（来自配置）
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub language: String,
    pub speaker: String,
    pub temperature: f64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            speaker: "Nova Hogarth".to_string(),
            temperature: 0.01,
        }
    }
}

/// 传给编排器的合成参数
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    pub language: String,
    pub speaker: String,
    pub speed: f64,
    pub temperature: f64,
    pub playback: bool,
    /// 请求级表情覆盖；None 时使用配置的默认表情
    pub expression: Option<Expression>,
}

/// 已解析的合成请求，解析后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    text: String,
    download: bool,
    split: SplitMode,
    params: SynthesisParams,
}

impl SynthesisRequest {
    /// 从原始请求体解析
    pub fn from_json(body: &[u8], defaults: &RequestDefaults) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| RequestError::MalformedBody(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(RequestError::MalformedBody(
                "request body must be a JSON object".to_string(),
            ));
        };

        // 控制字段先取出
        let download = take_bool(&mut fields, "download")?.unwrap_or(false);
        let split = match fields.remove("split") {
            None | Some(Value::Null) => SplitMode::None,
            Some(Value::String(mode)) => mode.parse()?,
            Some(_) => return Err(RequestError::wrong_type("split", "str")),
        };

        let text = match take_string(&mut fields, "text")? {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(RequestError::MissingText),
        };

        let language = take_string(&mut fields, "language")?
            .unwrap_or_else(|| defaults.language.clone());
        let speaker =
            take_string(&mut fields, "speaker")?.unwrap_or_else(|| defaults.speaker.clone());

        let speed = take_number(&mut fields, "speed")?.unwrap_or(DEFAULT_SPEED);
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(RequestError::invalid(
                "speed",
                format!("must be between {} and {}", MIN_SPEED, MAX_SPEED),
            ));
        }

        let temperature = take_number(&mut fields, "temperature")?.unwrap_or(defaults.temperature);
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(RequestError::invalid("temperature", "must not be negative"));
        }

        let playback = take_bool(&mut fields, "playback")?.unwrap_or(false);
        let expression = take_string(&mut fields, "expression")?
            .map(|name| name.parse::<Expression>())
            .transpose()?;

        if let Some(unknown) = fields.keys().next() {
            return Err(RequestError::UnknownField(unknown.clone()));
        }

        Ok(Self {
            text,
            download,
            split,
            params: SynthesisParams {
                language,
                speaker,
                speed,
                temperature,
                playback,
                expression,
            },
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn download(&self) -> bool {
        self.download
    }

    pub fn split(&self) -> SplitMode {
        self.split
    }

    /// 语速，同时用于拼接时的静音时长
    pub fn speed(&self) -> f64 {
        self.params.speed
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }
}

fn take_string(fields: &mut Map<String, Value>, name: &str) -> Result<Option<String>, RequestError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RequestError::wrong_type(name, "str")),
    }
}

fn take_bool(fields: &mut Map<String, Value>, name: &str) -> Result<Option<bool>, RequestError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(RequestError::wrong_type(name, "bool")),
    }
}

fn take_number(fields: &mut Map<String, Value>, name: &str) -> Result<Option<f64>, RequestError> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| RequestError::wrong_type(name, "float")),
        Some(_) => Err(RequestError::wrong_type(name, "float")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<SynthesisRequest, RequestError> {
        SynthesisRequest::from_json(body.as_bytes(), &RequestDefaults::default())
    }

    #[test]
    fn test_defaults_applied() {
        let request = parse(r#"{"text": "Hello."}"#).unwrap();
        assert_eq!(request.text(), "Hello.");
        assert!(!request.download());
        assert_eq!(request.split(), SplitMode::None);
        assert_eq!(request.params().language, "en");
        assert_eq!(request.params().speaker, "Nova Hogarth");
        assert_eq!(request.speed(), 1.0);
        assert!(!request.params().playback);
        assert!(request.params().expression.is_none());
    }

    #[test]
    fn test_control_fields_extracted() {
        let request = parse(
            r#"{"text": "Hi. There.", "download": true, "split": "Intelligent", "speed": 1.5, "playback": true}"#,
        )
        .unwrap();
        assert!(request.download());
        assert_eq!(request.split(), SplitMode::Intelligent);
        assert_eq!(request.speed(), 1.5);
        assert!(request.params().playback);
    }

    #[test]
    fn test_missing_or_blank_text() {
        assert_eq!(parse(r#"{"speed": 1.0}"#).unwrap_err(), RequestError::MissingText);
        assert_eq!(parse(r#"{"text": "   "}"#).unwrap_err(), RequestError::MissingText);
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = parse(r#"{"text": "Hi.", "speed": "fast"}"#).unwrap_err();
        assert_eq!(err, RequestError::wrong_type("speed", "float"));

        let err = parse(r#"{"text": "Hi.", "language": 7}"#).unwrap_err();
        assert_eq!(err, RequestError::wrong_type("language", "str"));

        let err = parse(r#"{"text": "Hi.", "split": true}"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidArgumentType { .. }));
    }

    #[test]
    fn test_integer_speed_accepted() {
        let request = parse(r#"{"text": "Hi.", "speed": 2}"#).unwrap();
        assert_eq!(request.speed(), 2.0);
    }

    #[test]
    fn test_out_of_range_values() {
        assert!(matches!(
            parse(r#"{"text": "Hi.", "speed": 0}"#).unwrap_err(),
            RequestError::InvalidArgument { .. }
        ));
        assert!(matches!(
            parse(r#"{"text": "Hi.", "temperature": -0.5}"#).unwrap_err(),
            RequestError::InvalidArgument { .. }
        ));
        assert!(matches!(
            parse(r#"{"text": "Hi.", "split": "paragraph"}"#).unwrap_err(),
            RequestError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_speed_outside_range_rejected() {
        for speed in ["1e-300", "0.05", "10.5", "1e300", "-1"] {
            let body = format!(r#"{{"text": "Hi.", "speed": {}}}"#, speed);
            assert!(
                matches!(parse(&body).unwrap_err(), RequestError::InvalidArgument { .. }),
                "speed {} accepted",
                speed
            );
        }
        assert_eq!(parse(r#"{"text": "Hi.", "speed": 0.1}"#).unwrap().speed(), MIN_SPEED);
        assert_eq!(parse(r#"{"text": "Hi.", "speed": 10}"#).unwrap().speed(), MAX_SPEED);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse(r#"{"text": "Hi.", "volume": 11}"#).unwrap_err();
        assert_eq!(err, RequestError::UnknownField("volume".to_string()));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(parse("not json").unwrap_err(), RequestError::MalformedBody(_)));
        assert!(matches!(parse(r#"["text"]"#).unwrap_err(), RequestError::MalformedBody(_)));
    }

    #[test]
    fn test_expression_override() {
        let request = parse(r#"{"text": "Hi.", "expression": "happy"}"#).unwrap();
        assert_eq!(request.params().expression, Some(Expression::Happy));
    }
}
