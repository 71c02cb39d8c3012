//! 对局控制器
//!
//! 持有权威的棋盘状态和重复局面历史。每步落子后重新计算哈希并计数，
//! 先判断重复和棋，再判断将死和困毙。只在 AI 的回合调用决策器。

use std::sync::Arc;

use chess_ai::{
    CloudDbSource, DecisionArbiter, DecisionRequest, LocalEngine, OfflineSource, RemoteClient,
    RemoteMoveSource, RepetitionHistory, ZobristTable,
};
use chess_core::{
    BoardState, ChessError, DrawReason, GameEvent, GameResult, Iccs, Move, MoveGenerator,
    Position, Side,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::GameConfig;

/// 对局控制器
pub struct GameController {
    state: BoardState,
    ai_side: Side,
    keys: Option<Arc<ZobristTable>>,
    hash: u64,
    repetitions: RepetitionHistory,
    arbiter: DecisionArbiter,
    result: Option<GameResult>,
    last_move: Option<Move>,
    events: mpsc::UnboundedSender<GameEvent>,
}

impl GameController {
    /// 创建控制器，返回事件接收端
    ///
    /// 创建后需要调用 `new_game` 开局。
    pub fn new(
        ai_side: Side,
        arbiter: DecisionArbiter,
    ) -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            state: BoardState::initial(),
            ai_side,
            keys: None,
            hash: 0,
            repetitions: RepetitionHistory::default(),
            arbiter,
            result: None,
            last_move: None,
            events,
        };
        (controller, receiver)
    }

    /// 按配置组装本地引擎、远程客户端和决策器
    pub fn from_config(
        config: &GameConfig,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<GameEvent>)> {
        let source: Arc<dyn RemoteMoveSource> = if config.arbiter.remote_enabled {
            Arc::new(CloudDbSource::new(&config.remote)?)
        } else {
            Arc::new(OfflineSource)
        };
        let remote = Arc::new(RemoteClient::new(source, config.remote.cache_capacity));
        let keys = Arc::new(ZobristTable::new());
        let local = Arc::new(LocalEngine::new(config.ai.clone(), Arc::clone(&keys)));
        let arbiter = DecisionArbiter::new(config.arbiter.clone(), remote, local);

        let (mut controller, receiver) = Self::new(config.ai_side, arbiter);
        controller.keys = Some(keys);
        Ok((controller, receiver))
    }

    /// 初始化哈希表（只在第一次调用时创建）
    pub fn ensure_initialized(&mut self) -> Arc<ZobristTable> {
        Arc::clone(self.keys.get_or_insert_with(|| Arc::new(ZobristTable::new())))
    }

    /// 从初始局面开始新对局
    pub fn new_game(&mut self) {
        self.new_game_from(BoardState::initial());
    }

    /// 从指定局面开始新对局，重复历史以该局面计数 1 重新开始
    pub fn new_game_from(&mut self, state: BoardState) {
        let keys = self.ensure_initialized();
        self.hash = keys.hash(&state.board);
        self.repetitions = RepetitionHistory::seeded(self.hash);
        self.state = state;
        self.result = None;
        self.last_move = None;

        info!("新对局开始，AI 执{}", self.ai_side);
        self.emit_board();
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn ai_side(&self) -> Side {
        self.ai_side
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn repetitions(&self) -> &RepetitionHistory {
        &self.repetitions
    }

    /// 当前局面的哈希
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// 是否轮到 AI 走
    pub fn is_ai_turn(&self) -> bool {
        self.result.is_none() && self.state.current_turn == self.ai_side
    }

    /// 当前走子方的全部合法走法
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.result.is_some() {
            return Vec::new();
        }
        MoveGenerator::legal_moves(&self.state.board, self.state.current_turn, None)
    }

    /// 某个棋子的合法走法，用于界面高亮
    pub fn legal_moves_from(&self, from: Position) -> Vec<Move> {
        if self.result.is_some() {
            return Vec::new();
        }
        MoveGenerator::legal_moves(&self.state.board, self.state.current_turn, Some(from))
    }

    /// 玩家走子，非法时返回错误且不修改任何状态
    pub fn submit_move(&mut self, from: Position, to: Position) -> Result<Option<GameResult>, ChessError> {
        if self.result.is_some() {
            return Err(ChessError::GameOver);
        }
        if self.state.current_turn == self.ai_side {
            return Err(ChessError::NotYourTurn);
        }
        if self.state.board.get(from).is_none() {
            return Err(ChessError::NoPiece(from));
        }

        let mv = Move::new(from, to);
        if !self.legal_moves_from(from).contains(&mv) {
            return Err(ChessError::IllegalMove { from, to });
        }

        Ok(self.commit(mv))
    }

    /// AI 走子
    ///
    /// 返回 AI 走的棋；AI 无子可走时返回 None，并以将死或困毙结束对局。
    pub async fn play_ai_turn(&mut self) -> Result<Option<Move>, ChessError> {
        if self.result.is_some() {
            return Err(ChessError::GameOver);
        }
        if self.state.current_turn != self.ai_side {
            return Err(ChessError::NotYourTurn);
        }

        self.emit(GameEvent::Thinking(true));
        let decision = self
            .arbiter
            .decide(DecisionRequest {
                board: self.state.board.clone(),
                side: self.ai_side,
                ply: self.state.ply,
                history: self.repetitions.clone(),
            })
            .await;
        self.emit(GameEvent::Thinking(false));

        debug!("Decision trail: {:?}", decision.trail);

        match decision.mv {
            Some(mv) => {
                self.commit(mv);
                Ok(Some(mv))
            }
            None => {
                let side = self.state.current_turn;
                let result = MoveGenerator::terminal_result(&mut self.state.board, side)
                    .unwrap_or(GameResult::Draw(DrawReason::Stalemate));
                self.finish(result);
                Ok(None)
            }
        }
    }

    /// 落子并检查对局结果
    fn commit(&mut self, mv: Move) -> Option<GameResult> {
        let keys = self.ensure_initialized();

        self.state.board.move_piece(mv.from, mv.to);
        self.state.switch_turn();
        self.last_move = Some(mv);

        self.hash = keys.hash(&self.state.board);
        let count = self.repetitions.record(self.hash);
        debug!("{} 后局面出现 {} 次", Iccs::to_string(&mv), count);

        self.emit_board();

        let result = if self.repetitions.is_draw(self.hash) {
            Some(GameResult::Draw(DrawReason::Repetition))
        } else {
            let side = self.state.current_turn;
            MoveGenerator::terminal_result(&mut self.state.board, side)
        };

        if let Some(result) = result {
            self.finish(result);
        }
        result
    }

    fn finish(&mut self, result: GameResult) {
        info!("对局结束: {}", result);
        self.result = Some(result);
        self.emit(GameEvent::GameOver(result));
    }

    fn emit_board(&self) {
        self.emit(GameEvent::BoardUpdated {
            board: self.state.board.clone(),
            side_to_move: self.state.current_turn,
            last_move: self.last_move,
        });
    }

    fn emit(&self, event: GameEvent) {
        // 界面层可能已经退出
        let _ = self.events.send(event);
    }
}
