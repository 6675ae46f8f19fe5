//! HTTP Handlers

mod synthesize;

pub use synthesize::*;
