//! Zobrist 哈希
//!
//! 每个（阵营, 棋子类型, 位置）对应一个随机数，局面哈希为所有占用格随机数的异或。
//! 哈希只覆盖棋子分布，不包含走子方：重复局面按棋子分布计数。

use chess_core::{Board, Piece, Position, BOARD_SQUARES};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 固定种子，保证不同进程间哈希一致
const ZOBRIST_SEED: u64 = 0x5851_F42D_4C95_7F2D;

/// Zobrist 哈希表
pub struct ZobristTable {
    /// 棋子哈希值 [side][piece_type][position]
    pieces: [[[u64; BOARD_SQUARES]; 7]; 2],
}

impl ZobristTable {
    /// 创建新的 Zobrist 表（使用固定种子保证确定性）
    pub fn new() -> Self {
        Self::with_seed(ZOBRIST_SEED)
    }

    /// 使用指定种子创建
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut pieces = [[[0u64; BOARD_SQUARES]; 7]; 2];
        for side in pieces.iter_mut() {
            for piece in side.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        Self { pieces }
    }

    /// 从头计算棋盘的完整哈希值
    pub fn hash(&self, board: &Board) -> u64 {
        board
            .occupied()
            .fold(0u64, |hash, (pos, piece)| hash ^ self.piece_hash(piece, pos))
    }

    /// 获取棋子在某一格的哈希值
    #[inline]
    pub fn piece_hash(&self, piece: Piece, pos: Position) -> u64 {
        self.pieces[piece.side.index()][piece.piece_type.index()][pos.to_index()]
    }

    /// 走子后的增量哈希：移出起点、移出被吃子、移入终点
    #[inline]
    pub fn apply_move(
        &self,
        hash: u64,
        mover: Piece,
        from: Position,
        to: Position,
        captured: Option<Piece>,
    ) -> u64 {
        let mut hash = hash ^ self.piece_hash(mover, from);
        if let Some(captured) = captured {
            hash ^= self.piece_hash(captured, to);
        }
        hash ^ self.piece_hash(mover, to)
    }

    /// 撤销走子，按相反顺序执行 `apply_move` 的每一步
    #[inline]
    pub fn undo_move(
        &self,
        hash: u64,
        mover: Piece,
        from: Position,
        to: Position,
        captured: Option<Piece>,
    ) -> u64 {
        let mut hash = hash ^ self.piece_hash(mover, to);
        if let Some(captured) = captured {
            hash ^= self.piece_hash(captured, to);
        }
        hash ^ self.piece_hash(mover, from)
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}
