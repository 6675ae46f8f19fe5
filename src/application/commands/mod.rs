//! 应用层 - 命令（写操作）
//!
//! 合成请求的用例编排

mod synthesize_commands;

pub mod handlers;

pub use synthesize_commands::*;
