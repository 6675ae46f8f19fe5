//! Speech Context - 合成会话
//!
//! 一次 HTTP 请求对应一个会话，会话产生的文件不会自动清理

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 会话 ID（UUID v4，simple 格式用于文件名）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// 会话：ID + 按顺序完成的 bundle 文件
#[derive(Debug, Clone)]
pub struct SynthesisSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    bundle_paths: Vec<PathBuf>,
}

impl SynthesisSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            bundle_paths: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// 追加一个已完成的 bundle 文件（顺序即拼接顺序）
    pub fn push_bundle(&mut self, path: impl AsRef<Path>) {
        self.bundle_paths.push(path.as_ref().to_path_buf());
    }

    pub fn bundle_paths(&self) -> &[PathBuf] {
        &self.bundle_paths
    }

    /// 距离会话创建已过去的毫秒数
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.created_at).num_milliseconds()
    }
}

impl Default for SynthesisSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_simple_hex() {
        let id = SessionId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_bundle_paths_keep_order() {
        let mut session = SynthesisSession::new();
        session.push_bundle("b.wav");
        session.push_bundle("a.wav");
        assert_eq!(
            session.bundle_paths(),
            &[PathBuf::from("b.wav"), PathBuf::from("a.wav")]
        );
        assert_ne!(session.id(), SynthesisSession::new().id());
    }
}
