//! 云库回复解析

use chess_core::{Iccs, Move};

use super::RemoteError;

/// 表示没有走法的回复前缀
const NEGATIVE_PREFIXES: [&str; 5] = ["invalid", "unknown", "nobestmove", "checkmate", "stalemate"];

/// 走法字段标记
const MOVE_MARKERS: [&str; 2] = ["move:", "egtb:"];

/// 从回复中取出走法
///
/// 支持 `move:h2e2`、`egtb:h2e2` 字段，或整个回复只有一个四字符走法。
/// 这里只检查坐标是否在棋盘内，合法性由调用方校验。
pub fn parse_response(reply: &str) -> Result<Move, RemoteError> {
    let trimmed = reply.trim().trim_end_matches('\0');
    let lower = trimmed.to_ascii_lowercase();

    if let Some(prefix) = NEGATIVE_PREFIXES.iter().find(|p| lower.starts_with(*p)) {
        return Err(RemoteError::Negative((*prefix).to_string()));
    }

    for marker in MOVE_MARKERS {
        if let Some(idx) = lower.find(marker) {
            let token = trimmed.get(idx + marker.len()..idx + marker.len() + 4);
            return token
                .and_then(Iccs::parse)
                .ok_or_else(|| RemoteError::Unparseable(trimmed.to_string()));
        }
    }

    Iccs::parse(trimmed).ok_or_else(|| RemoteError::Unparseable(trimmed.to_string()))
}
