//! Worker Layer - 流式合成流水线
//!
//! 每个 bundle 一对生产者/消费者任务

mod stream_orchestrator;

pub use stream_orchestrator::{FacePipeline, SynthesisOrchestrator};
