//! Application State

use crate::application::SynthesizeHandler;
use crate::domain::speech::RequestDefaults;

/// 应用状态
pub struct AppState {
    pub synthesize_handler: SynthesizeHandler,
    /// 请求缺省字段的取值
    pub request_defaults: RequestDefaults,
}

impl AppState {
    pub fn new(synthesize_handler: SynthesizeHandler, request_defaults: RequestDefaults) -> Self {
        Self {
            synthesize_handler,
            request_defaults,
        }
    }
}
