//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SQUARES, BOARD_WIDTH};
use crate::piece::{Piece, PieceType, Position, Side};

/// 初始局面底线排列（从第 0 列到第 8 列）
const BACK_RANK: [PieceType; 9] = [
    PieceType::Chariot,
    PieceType::Horse,
    PieceType::Elephant,
    PieceType::Advisor,
    PieceType::King,
    PieceType::Advisor,
    PieceType::Elephant,
    PieceType::Horse,
    PieceType::Chariot,
];

/// 棋盘
///
/// 10x9 网格，索引为 y * 9 + x。第 0 行是红方底线，第 9 行是黑方底线。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    squares: Vec<Option<Piece>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; BOARD_SQUARES],
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();

        for (side, back, cannon, soldier) in [(Side::Red, 0, 2, 3), (Side::Black, 9, 7, 6)] {
            for (x, piece_type) in BACK_RANK.iter().enumerate() {
                board.set(
                    Position::new_unchecked(x as u8, back),
                    Some(Piece::new(*piece_type, side)),
                );
            }
            for x in [1, 7] {
                board.set(
                    Position::new_unchecked(x, cannon),
                    Some(Piece::new(PieceType::Cannon, side)),
                );
            }
            for x in (0..9).step_by(2) {
                board.set(
                    Position::new_unchecked(x, soldier),
                    Some(Piece::new(PieceType::Soldier, side)),
                );
            }
        }

        board
    }

    /// 获取指定位置的棋子
    #[inline]
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if pos.is_valid() {
            self.squares[pos.to_index()]
        } else {
            None
        }
    }

    /// 设置指定位置的棋子
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        if pos.is_valid() {
            self.squares[pos.to_index()] = piece;
        }
    }

    /// 移动棋子（不检查规则），返回被吃的棋子
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<Piece> {
        let piece = self.get(from);
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, piece);
        captured
    }

    /// 撤销 `move_piece`，必须与之成对使用
    pub fn unmove_piece(&mut self, from: Position, to: Position, captured: Option<Piece>) {
        let piece = self.get(to);
        self.set(from, piece);
        self.set(to, captured);
    }

    /// 查找指定阵营的将/帅位置
    pub fn find_king(&self, side: Side) -> Option<Position> {
        self.squares.iter().enumerate().find_map(|(index, square)| match square {
            Some(piece) if piece.piece_type == PieceType::King && piece.side == side => {
                Position::from_index(index)
            }
            _ => None,
        })
    }

    /// 获取指定阵营的所有棋子位置
    pub fn pieces(&self, side: Side) -> Vec<(Position, Piece)> {
        self.occupied().filter(|(_, piece)| piece.side == side).collect()
    }

    /// 遍历所有有子的格子（按索引顺序）
    pub fn occupied(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.squares.iter().enumerate().filter_map(|(index, square)| {
            square.map(|piece| {
                (
                    Position::new_unchecked((index % BOARD_WIDTH) as u8, (index / BOARD_WIDTH) as u8),
                    piece,
                )
            })
        })
    }

    /// 统计同一直线上两点之间（不含端点）的棋子数，不在同一直线返回 None
    pub fn count_between(&self, from: Position, to: Position) -> Option<usize> {
        if from.x == to.x {
            let (low, high) = (from.y.min(to.y), from.y.max(to.y));
            Some(
                ((low + 1)..high)
                    .filter(|&y| self.get(Position::new_unchecked(from.x, y)).is_some())
                    .count(),
            )
        } else if from.y == to.y {
            let (low, high) = (from.x.min(to.x), from.x.max(to.x));
            Some(
                ((low + 1)..high)
                    .filter(|&x| self.get(Position::new_unchecked(x, from.y)).is_some())
                    .count(),
            )
        } else {
            None
        }
    }

    /// 检查两个将是否面对面（飞将）
    pub fn kings_facing(&self) -> bool {
        match (self.find_king(Side::Red), self.find_king(Side::Black)) {
            (Some(red_pos), Some(black_pos)) if red_pos.x == black_pos.x => {
                self.count_between(red_pos, black_pos) == Some(0)
            }
            _ => false,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 完整的棋盘状态（棋盘 + 走子方 + 已走半回合数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    /// 棋盘
    pub board: Board,
    /// 当前走子方
    pub current_turn: Side,
    /// 已走的半回合数
    pub ply: u32,
}

impl BoardState {
    /// 创建初始状态
    pub fn initial() -> Self {
        Self {
            board: Board::initial(),
            current_turn: Side::Red,
            ply: 0,
        }
    }

    /// 从棋盘创建状态
    pub fn from_board(board: Board, current_turn: Side) -> Self {
        Self {
            board,
            current_turn,
            ply: 0,
        }
    }

    /// 切换走子方
    pub fn switch_turn(&mut self) {
        self.current_turn = self.current_turn.opponent();
        self.ply += 1;
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}
