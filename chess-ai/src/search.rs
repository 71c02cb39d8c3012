//! 搜索引擎
//!
//! 迭代加深 + 负极大值 Alpha-Beta 搜索，配合置换表、杀手走法、历史启发、
//! 将军延伸和静态搜索。
//!
//! 超时通过 `Aborted` 沿递归向上传播，被中断的那一轮迭代整体作废，
//! 只有完整跑完的迭代才会影响最终走法。

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess_core::{Board, Move, Side, BOARD_SQUARES};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::evaluate::Evaluator;
use crate::position::SearchPosition;
use crate::repetition::RepetitionHistory;
use crate::transposition::{Bound, TranspositionTable};
use crate::zobrist::ZobristTable;

/// 将死分
pub const MATE_SCORE: i32 = 100_000;
/// 无穷大
const INFINITY: i32 = 1_000_000;
/// 和棋分
const DRAW_SCORE: i32 = 0;
/// 超过此分数视为已找到杀棋
const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
/// 静态评估前允许超出名义深度的层数
const MAX_EXTRA_PLY: i32 = 5;

// 走法排序权重
const TT_MOVE_BONUS: i32 = 200_000;
const CAPTURE_BONUS: i32 = 100_000;
const KILLER_BONUSES: [i32; 2] = [90_000, 80_000];
const HISTORY_CAP: i32 = 70_000;

/// AI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// 迭代加深的最大深度
    pub max_depth: u8,
    /// 整次搜索的时间预算
    pub time_limit_ms: u64,
    /// 静态搜索的最大层数
    pub quiescence_depth: u8,
    /// 置换表大小（MB）
    pub tt_size_mb: usize,
    /// 将军时是否延伸一层
    pub check_extension: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            max_depth: 7,
            time_limit_ms: 1000,
            quiescence_depth: 4,
            tt_size_mb: 8,
            check_extension: true,
        }
    }
}

/// 搜索中断标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Aborted;

/// 搜索结果
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// 最佳走法，根节点无合法走法时为 None
    pub best_move: Option<Move>,
    /// 最后一轮完整迭代的分数（走子方视角）
    pub score: i32,
    /// 完整跑完的深度
    pub depth: u8,
    /// 搜索节点数
    pub nodes: u64,
    /// 耗时
    pub elapsed: Duration,
    /// 是否因超时中断过
    pub aborted: bool,
    /// 置换表命中率
    pub tt_hit_rate: f64,
}

/// AI 引擎
///
/// 置换表、杀手走法和历史表都属于单次搜索，每次 `search` 开始时重置。
pub struct AiEngine {
    config: AiConfig,
    keys: Arc<ZobristTable>,
    tt: TranspositionTable,
    killers: Vec<[Option<Move>; 2]>,
    history: Vec<i32>,
    nodes: u64,
    deadline: Instant,
    root_best: Option<Move>,
}

impl AiEngine {
    /// 创建新的 AI 引擎
    pub fn new(config: AiConfig, keys: Arc<ZobristTable>) -> Self {
        let tt = TranspositionTable::new(config.tt_size_mb);
        Self {
            config,
            keys,
            tt,
            killers: Vec::new(),
            history: vec![0; BOARD_SQUARES * BOARD_SQUARES],
            nodes: 0,
            deadline: Instant::now(),
            root_best: None,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 搜索最佳走法
    ///
    /// `history` 是对局重复历史的副本，搜索中的模拟走子只修改它。
    pub fn search(&mut self, board: Board, side: Side, history: RepetitionHistory) -> SearchOutcome {
        let start = Instant::now();
        self.reset(start);

        let mut pos = SearchPosition::new(board, side, history, Arc::clone(&self.keys));
        let root_moves = pos.legal_moves();

        let mut outcome = SearchOutcome {
            best_move: None,
            score: 0,
            depth: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
            aborted: false,
            tt_hit_rate: 0.0,
        };

        match root_moves.as_slice() {
            [] => {
                debug!("根节点没有合法走法");
                outcome.score = if pos.in_check() { -MATE_SCORE } else { DRAW_SCORE };
                outcome.elapsed = start.elapsed();
                return outcome;
            }
            [only] => {
                // 唯一走法不需要搜索
                outcome.best_move = Some(*only);
                outcome.elapsed = start.elapsed();
                return outcome;
            }
            _ => {}
        }

        let mut best_move = None;
        for depth in 1..=self.config.max_depth {
            self.root_best = None;
            match self.negamax(&mut pos, i32::from(depth), -INFINITY, INFINITY, 0) {
                Ok(score) => {
                    best_move = self.root_best;
                    outcome.score = score;
                    outcome.depth = depth;
                    debug!(
                        depth,
                        score,
                        nodes = self.nodes,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        best = ?best_move,
                        "迭代完成"
                    );
                    if score.abs() >= MATE_THRESHOLD {
                        break;
                    }
                }
                Err(Aborted) => {
                    outcome.aborted = true;
                    debug!(depth, "Search timed out, discarding iteration");
                    break;
                }
            }
        }

        // 最终再确认一次走法在根节点合法走法列表中
        outcome.best_move = match best_move {
            Some(mv) if root_moves.contains(&mv) => Some(mv),
            _ => root_moves.first().copied(),
        };
        outcome.nodes = self.nodes;
        outcome.elapsed = start.elapsed();
        outcome.tt_hit_rate = self.tt.stats().hit_rate();

        info!(
            depth = outcome.depth,
            score = outcome.score,
            nodes = outcome.nodes,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            tt_hit_rate = outcome.tt_hit_rate,
            aborted = outcome.aborted,
            "Local search finished"
        );

        outcome
    }

    fn reset(&mut self, start: Instant) {
        self.tt.clear();
        let plies = usize::from(self.config.max_depth)
            + usize::from(self.config.quiescence_depth)
            + MAX_EXTRA_PLY as usize
            + 2;
        self.killers = vec![[None; 2]; plies];
        self.history.fill(0);
        self.nodes = 0;
        self.deadline = start + Duration::from_millis(self.config.time_limit_ms);
        self.root_best = None;
    }

    #[inline]
    fn check_time(&self) -> Result<(), Aborted> {
        if Instant::now() >= self.deadline {
            Err(Aborted)
        } else {
            Ok(())
        }
    }

    /// 负极大值 Alpha-Beta 搜索，返回走子方视角的分数
    fn negamax(
        &mut self,
        pos: &mut SearchPosition,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: i32,
    ) -> Result<i32, Aborted> {
        self.nodes += 1;

        if ply > 0 {
            self.check_time()?;
            if pos.is_repetition_draw() {
                return Ok(DRAW_SCORE);
            }
            if ply > i32::from(self.config.max_depth) + MAX_EXTRA_PLY {
                return Ok(Evaluator::evaluate(pos.board(), pos.side()));
            }
        }

        let alpha_orig = alpha;
        let hash = pos.hash();

        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move;
            if ply > 0 && entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return Ok(score),
                    Bound::LowerBound => alpha = alpha.max(score),
                    Bound::UpperBound => beta = beta.min(score),
                }
                if alpha >= beta {
                    return Ok(score);
                }
            }
        }

        let mut moves = pos.legal_moves();
        if moves.is_empty() {
            return Ok(if pos.in_check() { -MATE_SCORE + ply } else { DRAW_SCORE });
        }

        if depth <= 0 {
            return self.quiescence(pos, alpha, beta, ply, i32::from(self.config.quiescence_depth));
        }

        self.order_moves(pos.board(), &mut moves, tt_move, ply);

        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in moves {
            if ply == 0 {
                self.check_time()?;
            }

            let Some(undo) = pos.make_move(mv) else {
                continue;
            };
            let extension = i32::from(self.config.check_extension && pos.in_check());
            let result = self.negamax(pos, depth - 1 + extension, -beta, -alpha, ply + 1);
            pos.unmake_move(mv, undo);
            let score = -result?;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                if ply == 0 {
                    self.root_best = Some(mv);
                }
            }
            alpha = alpha.max(score);

            if alpha >= beta {
                if undo.captured.is_none() {
                    self.record_quiet_cutoff(mv, depth, ply);
                }
                break;
            }
        }

        let bound = if best_score <= alpha_orig {
            Bound::UpperBound
        } else if best_score >= beta {
            Bound::LowerBound
        } else {
            Bound::Exact
        };
        self.tt.store(hash, score_to_tt(best_score, ply), depth, bound, best_move);

        Ok(best_score)
    }

    /// 静态搜索：只看吃子和将军的走法
    fn quiescence(
        &mut self,
        pos: &mut SearchPosition,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        depth: i32,
    ) -> Result<i32, Aborted> {
        self.nodes += 1;
        self.check_time()?;

        if pos.is_repetition_draw() {
            return Ok(DRAW_SCORE);
        }

        let mut moves = pos.legal_moves();
        if moves.is_empty() {
            return Ok(if pos.in_check() { -MATE_SCORE + ply } else { DRAW_SCORE });
        }

        let stand_pat = Evaluator::evaluate(pos.board(), pos.side());
        if depth <= 0 {
            return Ok(stand_pat);
        }
        if stand_pat >= beta {
            return Ok(beta);
        }
        alpha = alpha.max(stand_pat);

        self.order_moves(pos.board(), &mut moves, None, ply);

        for mv in moves {
            let Some(undo) = pos.make_move(mv) else {
                continue;
            };
            if undo.captured.is_none() && !pos.in_check() {
                pos.unmake_move(mv, undo);
                continue;
            }
            let result = self.quiescence(pos, -beta, -alpha, ply + 1, depth - 1);
            pos.unmake_move(mv, undo);
            let score = -result?;

            if score >= beta {
                return Ok(beta);
            }
            alpha = alpha.max(score);
        }

        Ok(alpha)
    }

    /// 走法排序：置换表走法、吃子（MVV-LVA）、杀手走法、历史分
    fn order_moves(&self, board: &Board, moves: &mut [Move], tt_move: Option<Move>, ply: i32) {
        let killers = usize::try_from(ply)
            .ok()
            .and_then(|ply| self.killers.get(ply))
            .copied()
            .unwrap_or([None; 2]);

        moves.sort_by_cached_key(|&mv| {
            let score = if Some(mv) == tt_move {
                TT_MOVE_BONUS
            } else if let Some(victim) = board.get(mv.to) {
                let attacker = board.get(mv.from).map_or(0, |p| p.value());
                CAPTURE_BONUS + victim.value() * 10 - attacker
            } else if killers[0] == Some(mv) {
                KILLER_BONUSES[0]
            } else if killers[1] == Some(mv) {
                KILLER_BONUSES[1]
            } else {
                self.history[history_index(mv)].min(HISTORY_CAP)
            };
            Reverse(score)
        });
    }

    /// 非吃子走法引起截断：记入杀手槽并累加历史分
    fn record_quiet_cutoff(&mut self, mv: Move, depth: i32, ply: i32) {
        if let Some(slots) = usize::try_from(ply).ok().and_then(|ply| self.killers.get_mut(ply)) {
            if slots[0] != Some(mv) {
                slots[1] = slots[0];
                slots[0] = Some(mv);
            }
        }
        let entry = &mut self.history[history_index(mv)];
        *entry = entry.saturating_add(depth * depth);
    }
}

#[inline]
fn history_index(mv: Move) -> usize {
    mv.from.to_index() * BOARD_SQUARES + mv.to.to_index()
}

/// 搜索请求
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub board: Board,
    pub side: Side,
    pub history: RepetitionHistory,
}

/// 本地走法来源
///
/// 同步阻塞调用，由决策器放到阻塞线程池中执行。
pub trait LocalMoveSource: Send + Sync + 'static {
    fn search(&self, request: SearchRequest) -> SearchOutcome;
}

/// 基于 `AiEngine` 的本地引擎，每次搜索使用全新的搜索状态
pub struct LocalEngine {
    config: AiConfig,
    keys: Arc<ZobristTable>,
}

impl LocalEngine {
    pub fn new(config: AiConfig, keys: Arc<ZobristTable>) -> Self {
        Self { config, keys }
    }
}

impl LocalMoveSource for LocalEngine {
    fn search(&self, request: SearchRequest) -> SearchOutcome {
        let mut engine = AiEngine::new(self.config.clone(), Arc::clone(&self.keys));
        engine.search(request.board, request.side, request.history)
    }
}

/// 杀棋分存入置换表前换算为相对当前节点的步数
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// 从置换表取出的杀棋分换算回相对根节点的步数
fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}
