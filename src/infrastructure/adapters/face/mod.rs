//! Face Adapter - 口型识别、存储与人脸动画

mod http_face_client;
mod http_viseme_generator;
mod noop;
mod viseme_store;

pub use http_face_client::{HttpFaceClient, HttpFaceClientConfig, EXPRESSION_TRANSITION_SECS};
pub use http_viseme_generator::{
    ipa_to_viseme, parse_phonemes, HttpVisemeGenerator, HttpVisemeGeneratorConfig,
    DEFAULT_IDLE_MARGIN_SECS,
};
pub use noop::NoopFaceAnimator;
pub use viseme_store::FileVisemeStore;
