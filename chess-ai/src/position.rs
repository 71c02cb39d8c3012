//! 搜索局面
//!
//! 单块可变棋盘加上增量维护的哈希和重复计数。
//! `make_move` 和 `unmake_move` 必须成对调用，撤销后三者与走子前逐位相同。

use std::sync::Arc;

use chess_core::{Board, Move, MoveGenerator, Piece, Side};

use crate::repetition::RepetitionHistory;
use crate::zobrist::ZobristTable;

/// 走子撤销所需的信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undo {
    pub mover: Piece,
    pub captured: Option<Piece>,
}

/// 搜索用局面
pub struct SearchPosition {
    board: Board,
    side: Side,
    hash: u64,
    repetitions: RepetitionHistory,
    keys: Arc<ZobristTable>,
}

impl SearchPosition {
    /// 从棋盘创建，`repetitions` 为对局历史的副本
    pub fn new(
        board: Board,
        side: Side,
        repetitions: RepetitionHistory,
        keys: Arc<ZobristTable>,
    ) -> Self {
        let hash = keys.hash(&board);
        Self {
            board,
            side,
            hash,
            repetitions,
            keys,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// 当前局面在对局历史加搜索路径上的出现次数
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.count(self.hash)
    }

    /// 当前局面是否已重复到判和次数
    pub fn is_repetition_draw(&self) -> bool {
        self.repetitions.is_draw(self.hash)
    }

    /// 走子：更新棋盘、哈希、重复计数并交换走子方
    ///
    /// 起点没有棋子时不做任何修改并返回 None。
    pub fn make_move(&mut self, mv: Move) -> Option<Undo> {
        let mover = self.board.get(mv.from)?;
        let captured = self.board.move_piece(mv.from, mv.to);
        self.hash = self.keys.apply_move(self.hash, mover, mv.from, mv.to, captured);
        self.repetitions.record(self.hash);
        self.side = self.side.opponent();
        Some(Undo { mover, captured })
    }

    /// 撤销走子，严格按相反顺序还原
    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.side = self.side.opponent();
        self.repetitions.unrecord(self.hash);
        self.hash = self
            .keys
            .undo_move(self.hash, undo.mover, mv.from, mv.to, undo.captured);
        self.board.unmove_piece(mv.from, mv.to, undo.captured);
    }

    /// 当前走子方的合法走法
    pub fn legal_moves(&mut self) -> Vec<Move> {
        MoveGenerator::generate_legal(&mut self.board, self.side, None)
    }

    /// 当前走子方是否被将军
    pub fn in_check(&self) -> bool {
        MoveGenerator::is_in_check(&self.board, self.side)
    }
}
