//! 远程走法来源（云库）
//!
//! 局面编码为 FEN 发给远程服务，回复中的 ICCS 走法在使用前
//! 必须通过当前局面的合法走法校验。

mod client;
mod http;
mod parser;
mod source;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::RemoteClient;
pub use http::CloudDbSource;
pub use parser::parse_response;
pub use source::{OfflineSource, RemoteMoveSource};

/// 远程查询错误，全部由决策器降级处理
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// 超时
    #[error("Remote lookup timed out")]
    Timeout,

    /// 网络错误
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP 状态码异常
    #[error("Remote service returned status {0}")]
    Status(u16),

    /// 服务明确表示没有走法（invalid / unknown / nobestmove / 终局）
    #[error("Remote service has no move: {0}")]
    Negative(String),

    /// 回复中找不到走法
    #[error("Unparseable remote reply: {0}")]
    Unparseable(String),

    /// 走法在当前局面不合法
    #[error("Remote suggested an illegal move: {0}")]
    IllegalSuggestion(String),

    /// 远程来源已关闭
    #[error("Remote source is disabled")]
    Disabled,
}

/// 远程来源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// 云库查询地址
    pub base_url: String,
    /// HTTP 建立连接的超时（毫秒）
    pub connect_timeout_ms: u64,
    /// 走法缓存容量，满了整体清空
    pub cache_capacity: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.chessdb.cn/chessdb.php".to_string(),
            connect_timeout_ms: 800,
            cache_capacity: 4096,
        }
    }
}
