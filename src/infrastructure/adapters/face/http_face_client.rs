//! HTTP Face Client - 人脸动画服务客户端
//!
//! 外部人脸服务 API:
//! GET  {base_url}/face                    可用性探测
//! POST {base_url}/face/express           {"expression": "happy", "transition": 0.25}
//! POST {base_url}/face/lip_visemes       {"key": "tts_..._chunk0"}
//!
//! 服务按 key 从工作目录读取 `{key}.visemes.json`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::application::ports::{FaceAnimatorPort, FaceError};
use crate::domain::speech::Expression;

use super::NoopFaceAnimator;

/// 表情切换过渡时间（秒）
pub const EXPRESSION_TRANSITION_SECS: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct HttpFaceClientConfig {
    pub base_url: String,
    /// 启动探测超时（毫秒）
    pub probe_timeout_ms: u64,
    /// 单次动画请求超时（毫秒）
    pub request_timeout_ms: u64,
}

impl Default for HttpFaceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8008".to_string(),
            probe_timeout_ms: 1000,
            request_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExpressRequest<'a> {
    expression: &'a str,
    transition: f64,
}

#[derive(Debug, Serialize)]
struct LipVisemesRequest<'a> {
    key: &'a str,
}

/// HTTP 人脸动画客户端
pub struct HttpFaceClient {
    client: Client,
    base_url: String,
}

impl HttpFaceClient {
    pub fn new(config: &HttpFaceClientConfig) -> Result<Self, FaceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| FaceError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 探测人脸服务；不可达时退化为 no-op
    pub async fn connect(config: &HttpFaceClientConfig) -> Arc<dyn FaceAnimatorPort> {
        let client = match Self::new(config) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Face client init failed, animation disabled");
                return Arc::new(NoopFaceAnimator);
            }
        };

        let probe = client
            .client
            .get(format!("{}/face", client.base_url))
            .timeout(Duration::from_millis(config.probe_timeout_ms))
            .send()
            .await;

        match probe {
            Ok(response) if response.status().is_success() => {
                tracing::info!(url = %client.base_url, "Connected to face server");
                Arc::new(client)
            }
            Ok(response) => {
                tracing::warn!(
                    url = %client.base_url,
                    status = %response.status(),
                    "Face server probe failed, animation disabled"
                );
                Arc::new(NoopFaceAnimator)
            }
            Err(e) => {
                tracing::warn!(
                    url = %client.base_url,
                    error = %e,
                    "Face server unreachable, animation disabled"
                );
                Arc::new(NoopFaceAnimator)
            }
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), FaceError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| FaceError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FaceError::Unavailable(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FaceAnimatorPort for HttpFaceClient {
    async fn animate(&self, key: &str, expression: Expression) -> Result<(), FaceError> {
        self.post(
            "/face/express",
            &ExpressRequest {
                expression: expression.as_str(),
                transition: EXPRESSION_TRANSITION_SECS,
            },
        )
        .await?;
        self.post("/face/lip_visemes", &LipVisemesRequest { key }).await?;

        tracing::debug!(key = %key, expression = expression.as_str(), "Face animation triggered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_degrades_to_noop() {
        let config = HttpFaceClientConfig {
            // 保留端口，连接会被拒绝
            base_url: "http://127.0.0.1:9".to_string(),
            probe_timeout_ms: 200,
            request_timeout_ms: 200,
        };
        let animator = HttpFaceClient::connect(&config).await;
        assert!(animator.animate("tts_x_0_chunk0", Expression::Happy).await.is_ok());
    }

    #[test]
    fn test_express_payload() {
        let body = serde_json::to_value(ExpressRequest {
            expression: Expression::Sad.as_str(),
            transition: EXPRESSION_TRANSITION_SECS,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"expression": "sad", "transition": 0.25}));
    }
}
