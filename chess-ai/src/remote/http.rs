//! 云库 HTTP 客户端
//!
//! 查询 `querybest` 接口：`<base_url>?action=querybest&board=<fen>&learn=0`，
//! 回复为纯文本。单次请求的超时由调用方用 `tokio::time::timeout` 控制。

use async_trait::async_trait;

use super::{RemoteConfig, RemoteError, RemoteMoveSource};

#[cfg(feature = "cloud")]
use anyhow::Context;
#[cfg(feature = "cloud")]
use tracing::debug;

/// 云库来源
#[cfg(feature = "cloud")]
pub struct CloudDbSource {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(feature = "cloud")]
impl CloudDbSource {
    /// 创建新的云库客户端
    pub fn new(config: &RemoteConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_millis(config.connect_timeout_ms))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }
}

#[cfg(feature = "cloud")]
#[async_trait]
impl RemoteMoveSource for CloudDbSource {
    async fn query_best(&self, fen: &str) -> Result<String, RemoteError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("action", "querybest"), ("board", fen), ("learn", "0")])
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        // 安全截取（避免切到多字节字符中间）
        let preview: String = body.chars().take(120).collect();
        debug!("Cloud reply for {}: {}", fen, preview.trim());
        Ok(body)
    }
}

/// 未启用 cloud feature 时的占位实现
#[cfg(not(feature = "cloud"))]
pub struct CloudDbSource {
    _config: RemoteConfig,
}

#[cfg(not(feature = "cloud"))]
impl CloudDbSource {
    pub fn new(config: &RemoteConfig) -> anyhow::Result<Self> {
        Ok(Self {
            _config: config.clone(),
        })
    }
}

#[cfg(not(feature = "cloud"))]
#[async_trait]
impl RemoteMoveSource for CloudDbSource {
    async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Disabled)
    }
}
