//! Command Handlers 实现

mod synthesize_handler;

pub use synthesize_handler::*;
