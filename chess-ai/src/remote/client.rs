//! 带缓存的远程查询客户端

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chess_core::{Board, Fen, Iccs, Move, MoveGenerator, Side};
use tracing::{debug, warn};

use super::{OfflineSource, RemoteError, RemoteMoveSource};

/// 远程查询客户端
///
/// 按局面文本缓存已接受的走法。缓存命中时同样重新校验合法性，不合法则删除。
pub struct RemoteClient {
    source: Arc<dyn RemoteMoveSource>,
    cache: Mutex<HashMap<String, Move>>,
    capacity: usize,
}

impl RemoteClient {
    pub fn new(source: Arc<dyn RemoteMoveSource>, capacity: usize) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// 不访问网络的客户端
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineSource), 1)
    }

    /// 查询当前局面的推荐走法，`timeout` 为本次查询的上限
    pub async fn fetch_move(
        &self,
        board: &Board,
        side: Side,
        timeout: Duration,
    ) -> Result<Move, RemoteError> {
        let fen = Fen::to_remote(board, side);

        if let Some(mv) = self.cached(&fen) {
            if MoveGenerator::is_legal(board, side, mv) {
                debug!("Remote cache hit: {}", Iccs::to_string(&mv));
                return Ok(mv);
            }
            warn!("缓存走法 {} 已不合法，删除缓存", Iccs::to_string(&mv));
            self.lock_cache().remove(&fen);
        }

        let reply = tokio::time::timeout(timeout, self.source.query_best(&fen))
            .await
            .map_err(|_| RemoteError::Timeout)??;

        let mv = super::parse_response(&reply)?;
        if !MoveGenerator::is_legal(board, side, mv) {
            return Err(RemoteError::IllegalSuggestion(Iccs::to_string(&mv)));
        }

        self.insert(fen, mv);
        Ok(mv)
    }

    /// 预取对手可能的应着后的局面，只用于填充缓存
    pub async fn prefetch(&self, board: &Board, side: Side, timeout: Duration) {
        match self.fetch_move(board, side, timeout).await {
            Ok(mv) => debug!("Prefetched {}", Iccs::to_string(&mv)),
            Err(e) => debug!("Prefetch skipped: {}", e),
        }
    }

    /// 缓存条目数
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn cached(&self, fen: &str) -> Option<Move> {
        self.lock_cache().get(fen).copied()
    }

    fn insert(&self, fen: String, mv: Move) {
        let mut cache = self.lock_cache();
        if cache.len() >= self.capacity && !cache.contains_key(&fen) {
            debug!("Remote cache full ({} entries), clearing", cache.len());
            cache.clear();
        }
        cache.insert(fen, mv);
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, Move>> {
        // 缓存内容在任何时刻都是完整的，锁中毒时直接继续使用
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chess_core::Position;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 固定回复的来源，记录调用次数
    struct ScriptedSource {
        reply: Result<String, RemoteError>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(reply: Result<&str, RemoteError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RemoteMoveSource for ScriptedSource {
        async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    /// 永不回复的来源
    struct SilentSource;

    #[async_trait]
    impl RemoteMoveSource for SilentSource {
        async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
            std::future::pending().await
        }
    }

    fn h2e2() -> Move {
        Move::new(Position::new_unchecked(7, 2), Position::new_unchecked(4, 2))
    }

    const TIMEOUT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_accepts_and_caches_legal_move() {
        let source = ScriptedSource::new(Ok("move:h2e2"));
        let client = RemoteClient::new(source.clone(), 16);
        let board = Board::initial();

        assert_eq!(client.fetch_move(&board, Side::Red, TIMEOUT).await, Ok(h2e2()));
        assert_eq!(client.fetch_move(&board, Side::Red, TIMEOUT).await, Ok(h2e2()));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_illegal_suggestion() {
        // 红方不能走黑方的炮
        let source = ScriptedSource::new(Ok("move:b7e7"));
        let client = RemoteClient::new(source, 16);

        let result = client.fetch_move(&Board::initial(), Side::Red, TIMEOUT).await;
        assert_eq!(result, Err(RemoteError::IllegalSuggestion("b7e7".to_string())));
        assert_eq!(client.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_negative_reply_is_failure() {
        let client = RemoteClient::new(ScriptedSource::new(Ok("nobestmove")), 16);
        let result = client.fetch_move(&Board::initial(), Side::Red, TIMEOUT).await;
        assert!(matches!(result, Err(RemoteError::Negative(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let client = RemoteClient::new(Arc::new(SilentSource), 16);
        let result = client.fetch_move(&Board::initial(), Side::Red, TIMEOUT).await;
        assert_eq!(result, Err(RemoteError::Timeout));
    }

    #[tokio::test]
    async fn test_stale_cache_entry_is_dropped() {
        let source = ScriptedSource::new(Err(RemoteError::Transport("down".to_string())));
        let client = RemoteClient::new(source.clone(), 16);

        // 人为写入一个在该局面不合法的缓存走法
        let board = Board::initial();
        client.insert(Fen::to_remote(&board, Side::Red), Move::new(
            Position::new_unchecked(4, 3),
            Position::new_unchecked(3, 3),
        ));

        let result = client.fetch_move(&board, Side::Red, TIMEOUT).await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));
        assert_eq!(client.cache_len(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_capacity() {
        let client = RemoteClient::new(Arc::new(OfflineSource), 2);
        client.insert("a".to_string(), h2e2());
        client.insert("b".to_string(), h2e2());
        client.insert("c".to_string(), h2e2());
        assert_eq!(client.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_offline_client() {
        let client = RemoteClient::offline();
        let result = client.fetch_move(&Board::initial(), Side::Red, TIMEOUT).await;
        assert_eq!(result, Err(RemoteError::Disabled));
    }
}
