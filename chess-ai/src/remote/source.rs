use async_trait::async_trait;

use super::RemoteError;

/// 远程走法来源
///
/// 输入为 `Fen::to_remote` 生成的局面文本，返回服务的原始回复。
#[async_trait]
pub trait RemoteMoveSource: Send + Sync {
    async fn query_best(&self, fen: &str) -> Result<String, RemoteError>;
}

/// 关闭远程查询时使用的来源，总是返回 `Disabled`
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

#[async_trait]
impl RemoteMoveSource for OfflineSource {
    async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
        Err(RemoteError::Disabled)
    }
}
