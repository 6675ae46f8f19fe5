//! Speech Context - 语音合成限界上下文
//!
//! 职责:
//! - 解析并校验合成请求（控制字段与合成参数分离）
//! - 文本 bundle 与合成会话

mod errors;
mod request;
mod session;
mod value_objects;

pub use errors::RequestError;
pub use request::{RequestDefaults, SynthesisParams, SynthesisRequest, MAX_SPEED, MIN_SPEED};
pub use session::{SessionId, SynthesisSession};
pub use value_objects::{
    recognizer_language, Expression, SplitMode, TextBundle, SUPPORTED_LANGUAGES,
};
