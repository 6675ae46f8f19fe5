//! File Viseme Store - 口型序列持久化
//!
//! 每个块一个 `{key}.visemes.json`，人脸服务按 key 读取

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{FaceError, VisemeCue, VisemeStorePort};

pub struct FileVisemeStore {
    dir: PathBuf,
}

impl FileVisemeStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.visemes.json", key))
    }
}

#[async_trait]
impl VisemeStorePort for FileVisemeStore {
    async fn save(&self, key: &str, cues: &[VisemeCue]) -> Result<(), FaceError> {
        let json = serde_json::to_vec(cues).map_err(|e| FaceError::Store(e.to_string()))?;
        tokio::fs::write(self.path_for(key), json)
            .await
            .map_err(|e| FaceError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_writes_json_by_key() {
        let dir = tempdir().unwrap();
        let store = FileVisemeStore::new(dir.path());
        let cues = vec![
            VisemeCue {
                time: 0.1,
                viseme: "AA".to_string(),
            },
            VisemeCue {
                time: 0.7,
                viseme: "IDLE".to_string(),
            },
        ];

        store.save("tts_s_0_chunk0", &cues).await.unwrap();
        let data = std::fs::read(dir.path().join("tts_s_0_chunk0.visemes.json")).unwrap();
        let saved: Vec<VisemeCue> = serde_json::from_slice(&data).unwrap();
        assert_eq!(saved, cues);
    }
}
