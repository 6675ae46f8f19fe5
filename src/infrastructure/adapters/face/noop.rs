//! No-op 人脸动画（人脸服务不可用或未启用）

use async_trait::async_trait;

use crate::application::ports::{FaceAnimatorPort, FaceError};
use crate::domain::speech::Expression;

#[derive(Debug, Default)]
pub struct NoopFaceAnimator;

#[async_trait]
impl FaceAnimatorPort for NoopFaceAnimator {
    async fn animate(&self, _key: &str, _expression: Expression) -> Result<(), FaceError> {
        Ok(())
    }
}
