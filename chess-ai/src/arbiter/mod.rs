//! 决策器
//!
//! 每个回合在远程走法和本地搜索之间做一次决策：
//! - 远程关闭：只用本地搜索
//! - 开局阶段（`ply < remote_priority_ply`）：先查远程，失败再本地搜索
//! - 之后：远程与本地同时进行，本地结束后再给远程一段宽限期
//!
//! 任何来源的走法在返回前都会用新生成的合法走法再校验一次，
//! 所有失败都逐级降级，最后落到第一个合法走法。

mod machine;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chess_core::{Board, Iccs, Move, MoveGenerator, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::remote::RemoteClient;
use crate::repetition::RepetitionHistory;
use crate::search::{LocalMoveSource, SearchRequest};

pub use machine::{transition, Candidate, DecisionEvent, DecisionMachine, DecisionState, MoveSource};

/// 决策器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// 是否查询远程
    pub remote_enabled: bool,
    /// 小于此半回合数时优先远程
    pub remote_priority_ply: u32,
    /// 开局阶段远程查询超时
    pub early_remote_timeout_ms: u64,
    /// 并行阶段远程查询超时
    pub remote_timeout_ms: u64,
    /// 本地搜索结束后等待远程的宽限期
    pub grace_period_ms: u64,
    /// 本地搜索的最短思考时间
    pub min_think_ms: u64,
    /// 决策后预取的对手应着数量
    pub prefetch_replies: usize,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            remote_priority_ply: 20,
            early_remote_timeout_ms: 2000,
            remote_timeout_ms: 800,
            grace_period_ms: 50,
            min_think_ms: 400,
            prefetch_replies: 3,
        }
    }
}

/// 决策请求
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub board: Board,
    pub side: Side,
    /// 已走的半回合数
    pub ply: u32,
    /// 对局重复历史的副本
    pub history: RepetitionHistory,
}

/// 决策结果
#[derive(Debug, Clone)]
pub struct Decision {
    /// 选中的走法，无子可走时为 None
    pub mv: Option<Move>,
    pub source: MoveSource,
    /// 经过的状态
    pub trail: Vec<DecisionState>,
    pub elapsed: Duration,
}

/// 决策器
pub struct DecisionArbiter {
    config: ArbiterConfig,
    remote: Arc<RemoteClient>,
    local: Arc<dyn LocalMoveSource>,
}

impl DecisionArbiter {
    pub fn new(
        config: ArbiterConfig,
        remote: Arc<RemoteClient>,
        local: Arc<dyn LocalMoveSource>,
    ) -> Self {
        Self { config, remote, local }
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// 为当前局面选出一步走法
    pub async fn decide(&self, request: DecisionRequest) -> Decision {
        let start = Instant::now();
        let mut machine = DecisionMachine::new();

        if !self.config.remote_enabled {
            machine.advance(DecisionEvent::Remote(None));
            machine.advance(DecisionEvent::Proceed);
            let local = self.run_local(&request).await;
            machine.advance(DecisionEvent::Local(local));
        } else if request.ply < self.config.remote_priority_ply {
            let timeout = Duration::from_millis(self.config.early_remote_timeout_ms);
            let remote = match self.remote.fetch_move(&request.board, request.side, timeout).await {
                Ok(mv) => Some(mv),
                Err(e) => {
                    warn!("Remote move unavailable at ply {}: {}", request.ply, e);
                    None
                }
            };
            machine.advance(DecisionEvent::Remote(remote));
            if machine.advance(DecisionEvent::Proceed) == &DecisionState::LocalSearch {
                let local = self.run_local(&request).await;
                machine.advance(DecisionEvent::Local(local));
            }
        } else {
            let (remote, local) = self.race(&request).await;
            machine.advance(DecisionEvent::Remote(remote));
            if machine.advance(DecisionEvent::Proceed) == &DecisionState::LocalSearch {
                machine.advance(DecisionEvent::Local(local));
            }
        }

        let legal = MoveGenerator::legal_moves(&request.board, request.side, None);
        if let DecisionState::Validate(Some(candidate)) = machine.state() {
            if !legal.contains(&candidate.mv) {
                error!(
                    "Chosen move {} from {} is illegal, falling back",
                    Iccs::to_string(&candidate.mv),
                    candidate.source
                );
            }
        }
        machine.advance(DecisionEvent::Resolve(legal));

        let (mv, source) = machine.outcome();
        if let Some(mv) = mv {
            self.spawn_prefetch(&request.board, request.side, mv);
        }

        let elapsed = start.elapsed();
        info!(
            "Decision at ply {}: {} via {} in {}ms",
            request.ply,
            mv.map(|m| Iccs::to_string(&m)).unwrap_or_else(|| "none".to_string()),
            source,
            elapsed.as_millis()
        );

        Decision {
            mv,
            source,
            trail: machine.into_trail(),
            elapsed,
        }
    }

    /// 同时进行远程查询和本地搜索
    ///
    /// 本地搜索是计时主线。本地结束后远程只再等宽限期，
    /// 超出宽限期的远程任务被放弃等待但不取消，结果只会写入缓存。
    async fn race(&self, request: &DecisionRequest) -> (Option<Move>, Option<Move>) {
        let remote = Arc::clone(&self.remote);
        let board = request.board.clone();
        let side = request.side;
        let timeout = Duration::from_millis(self.config.remote_timeout_ms);
        let mut remote_task =
            tokio::spawn(async move { remote.fetch_move(&board, side, timeout).await });

        let local = self.run_local(request).await;

        let grace = Duration::from_millis(self.config.grace_period_ms);
        let remote = match tokio::time::timeout(grace, &mut remote_task).await {
            Ok(Ok(Ok(mv))) => Some(mv),
            Ok(Ok(Err(e))) => {
                debug!("Remote failed during race: {}", e);
                None
            }
            Ok(Err(e)) => {
                warn!("Remote task failed: {}", e);
                None
            }
            Err(_) => {
                debug!("远程未在宽限期内返回，结果仅用于缓存");
                None
            }
        };

        (remote, local)
    }

    /// 在阻塞线程池上运行本地搜索，并保证最短思考时间
    async fn run_local(&self, request: &DecisionRequest) -> Option<Move> {
        let started = Instant::now();
        let local = Arc::clone(&self.local);
        let search = SearchRequest {
            board: request.board.clone(),
            side: request.side,
            history: request.history.clone(),
        };

        let best = match tokio::task::spawn_blocking(move || local.search(search)).await {
            Ok(outcome) => outcome.best_move,
            Err(e) => {
                error!("Local search task failed: {}", e);
                None
            }
        };

        let floor = Duration::from_millis(self.config.min_think_ms);
        let spent = started.elapsed();
        if spent < floor {
            tokio::time::sleep(floor - spent).await;
        }

        best
    }

    /// 预取对手前几种应着之后的远程走法，不阻塞当前决策
    fn spawn_prefetch(&self, board: &Board, side: Side, chosen: Move) {
        if !self.config.remote_enabled || self.config.prefetch_replies == 0 {
            return;
        }

        let mut after = board.clone();
        after.move_piece(chosen.from, chosen.to);
        let replies = MoveGenerator::legal_moves(&after, side.opponent(), None);
        let timeout = Duration::from_millis(self.config.remote_timeout_ms);

        for reply in replies.into_iter().take(self.config.prefetch_replies) {
            let mut next = after.clone();
            next.move_piece(reply.from, reply.to);
            let remote = Arc::clone(&self.remote);
            tokio::spawn(async move {
                remote.prefetch(&next, side, timeout).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{RemoteError, RemoteMoveSource};
    use crate::search::SearchOutcome;
    use async_trait::async_trait;
    use chess_core::{Fen, Position};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 永不回复的远程来源
    struct SilentRemote;

    #[async_trait]
    impl RemoteMoveSource for SilentRemote {
        async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
            std::future::pending().await
        }
    }

    /// 固定回复的远程来源
    struct FixedRemote {
        reply: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteMoveSource for FixedRemote {
        async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    /// 延迟一段时间后才回复的远程来源
    struct SlowRemote {
        delay: Duration,
        reply: &'static str,
    }

    #[async_trait]
    impl RemoteMoveSource for SlowRemote {
        async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.reply.to_string())
        }
    }

    /// 固定返回某个走法的本地来源
    struct FixedLocal {
        mv: Option<Move>,
        calls: AtomicUsize,
    }

    impl LocalMoveSource for FixedLocal {
        fn search(&self, _request: SearchRequest) -> SearchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SearchOutcome {
                best_move: self.mv,
                score: 0,
                depth: 1,
                nodes: 1,
                elapsed: Duration::ZERO,
                aborted: false,
                tt_hit_rate: 0.0,
            }
        }
    }

    fn mv(fx: u8, fy: u8, tx: u8, ty: u8) -> Move {
        Move::new(Position::new_unchecked(fx, fy), Position::new_unchecked(tx, ty))
    }

    fn fast_config() -> ArbiterConfig {
        ArbiterConfig {
            early_remote_timeout_ms: 50,
            remote_timeout_ms: 50,
            grace_period_ms: 20,
            min_think_ms: 0,
            prefetch_replies: 0,
            ..ArbiterConfig::default()
        }
    }

    fn request(ply: u32) -> DecisionRequest {
        DecisionRequest {
            board: Board::initial(),
            side: Side::Red,
            ply,
            history: RepetitionHistory::default(),
        }
    }

    fn local(mv: Option<Move>) -> Arc<FixedLocal> {
        Arc::new(FixedLocal {
            mv,
            calls: AtomicUsize::new(0),
        })
    }

    fn fixed_remote(reply: &'static str) -> Arc<FixedRemote> {
        Arc::new(FixedRemote {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_silent_remote_uses_local_move() {
        // 炮二平五
        let m = mv(7, 2, 4, 2);
        for ply in [0, 40] {
            let local = local(Some(m));
            let remote = Arc::new(RemoteClient::new(Arc::new(SilentRemote), 16));
            let arbiter = DecisionArbiter::new(fast_config(), remote, local.clone());

            let decision = arbiter.decide(request(ply)).await;
            assert_eq!(decision.mv, Some(m));
            assert_eq!(decision.source, MoveSource::Local);
            assert!(MoveGenerator::is_legal(&Board::initial(), Side::Red, m));
            assert_eq!(local.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_early_remote_move_skips_local() {
        // 一个合法但不常见的走法：车九进一
        let remote_source = fixed_remote("move:a0a1");
        let remote = Arc::new(RemoteClient::new(remote_source.clone(), 16));
        let local = local(Some(mv(7, 2, 4, 2)));
        let arbiter = DecisionArbiter::new(fast_config(), remote, local.clone());

        let decision = arbiter.decide(request(0)).await;
        assert_eq!(decision.mv, Some(mv(0, 0, 0, 1)));
        assert_eq!(decision.source, MoveSource::Remote);
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
        assert_eq!(remote_source.calls.load(Ordering::SeqCst), 1);
        assert!(!decision.trail.contains(&DecisionState::LocalSearch));
    }

    #[tokio::test]
    async fn test_late_remote_only_warms_cache() {
        let remote = Arc::new(RemoteClient::new(
            Arc::new(SlowRemote {
                delay: Duration::from_millis(150),
                reply: "move:a0a1",
            }),
            16,
        ));
        let local = local(Some(mv(7, 2, 4, 2)));
        let config = ArbiterConfig {
            remote_timeout_ms: 1_000,
            ..fast_config()
        };
        let arbiter = DecisionArbiter::new(config, Arc::clone(&remote), local.clone());

        let decision = arbiter.decide(request(30)).await;
        assert_eq!(decision.mv, Some(mv(7, 2, 4, 2)));
        assert_eq!(decision.source, MoveSource::Local);
        assert_eq!(remote.cache_len(), 0);

        // 超出宽限期的远程任务没有被取消，稍后结果写入缓存
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(remote.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_race_remote_within_grace_wins() {
        let remote = Arc::new(RemoteClient::new(fixed_remote("move:a0a1"), 16));
        let local = local(Some(mv(7, 2, 4, 2)));
        let arbiter = DecisionArbiter::new(fast_config(), remote, local.clone());

        let decision = arbiter.decide(request(30)).await;
        assert_eq!(decision.mv, Some(mv(0, 0, 0, 1)));
        assert_eq!(decision.source, MoveSource::Remote);
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_illegal_local_move_falls_back() {
        let remote = Arc::new(RemoteClient::offline());
        // 兵不能横走
        let local = local(Some(mv(4, 3, 3, 3)));
        let arbiter = DecisionArbiter::new(fast_config(), remote, local);

        let decision = arbiter.decide(request(0)).await;
        let first = MoveGenerator::legal_moves(&Board::initial(), Side::Red, None)[0];
        assert_eq!(decision.mv, Some(first));
        assert_eq!(decision.source, MoveSource::FallbackFirstLegal);
    }

    #[tokio::test]
    async fn test_no_legal_moves() {
        let state = Fen::parse("3k5/R8/3R5/9/9/9/9/9/9/4K4 b").unwrap();
        let remote = Arc::new(RemoteClient::offline());
        let arbiter = DecisionArbiter::new(fast_config(), remote, local(None));

        let decision = arbiter
            .decide(DecisionRequest {
                board: state.board,
                side: Side::Black,
                ply: 50,
                history: RepetitionHistory::default(),
            })
            .await;
        assert_eq!(decision.mv, None);
        assert_eq!(decision.source, MoveSource::None);
        assert_eq!(decision.trail.last(), Some(&DecisionState::NoMove));
    }

    #[tokio::test]
    async fn test_remote_disabled() {
        let remote_source = fixed_remote("move:a0a1");
        let remote = Arc::new(RemoteClient::new(remote_source.clone(), 16));
        let config = ArbiterConfig {
            remote_enabled: false,
            ..fast_config()
        };
        let arbiter = DecisionArbiter::new(config, remote, local(Some(mv(7, 2, 4, 2))));

        let decision = arbiter.decide(request(0)).await;
        assert_eq!(decision.source, MoveSource::Local);
        assert_eq!(remote_source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_min_think_floor() {
        let config = ArbiterConfig {
            remote_enabled: false,
            min_think_ms: 100,
            ..fast_config()
        };
        let remote = Arc::new(RemoteClient::offline());
        let arbiter = DecisionArbiter::new(config, remote, local(Some(mv(7, 2, 4, 2))));

        let decision = arbiter.decide(request(0)).await;
        assert!(decision.elapsed >= Duration::from_millis(100));
    }

    /// 第一次回复 `first`，之后都回复 `rest`
    struct SequenceRemote {
        first: &'static str,
        rest: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteMoveSource for SequenceRemote {
        async fn query_best(&self, _fen: &str) -> Result<String, RemoteError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if n == 0 { self.first } else { self.rest }.to_string())
        }
    }

    #[tokio::test]
    async fn test_prefetch_warms_cache() {
        let remote_source = Arc::new(SequenceRemote {
            first: "move:a9a8",
            rest: "move:a8a9",
            calls: AtomicUsize::new(0),
        });
        let remote = Arc::new(RemoteClient::new(remote_source.clone(), 16));
        let config = ArbiterConfig {
            prefetch_replies: 3,
            ..fast_config()
        };
        // 黑方车1进1，之后预取红方前三种应着后的局面
        let arbiter = DecisionArbiter::new(config, Arc::clone(&remote), local(None));
        let decision = arbiter
            .decide(DecisionRequest {
                board: Board::initial(),
                side: Side::Black,
                ply: 1,
                history: RepetitionHistory::default(),
            })
            .await;
        assert_eq!(decision.mv, Some(mv(0, 9, 0, 8)));
        assert_eq!(decision.source, MoveSource::Remote);

        // 预取任务在后台运行，等待它们完成
        for _ in 0..100 {
            if remote.cache_len() >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(remote_source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(remote.cache_len(), 4);
    }
}
