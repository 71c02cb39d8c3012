//! 走法生成和验证
//!
//! 伪合法性按棋子规则判断；合法走法在伪合法基础上，
//! 通过在同一块棋盘上"走子 - 检查将军 - 撤销"过滤掉送将的走法。

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::message::{DrawReason, GameResult, WinReason};
use crate::piece::{Piece, PieceType, Position, Side};

/// 走法
///
/// 不携带被吃子信息，被吃的棋子在执行时从棋盘上读取。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始位置
    pub from: Position,
    /// 目标位置
    pub to: Position,
}

impl Move {
    /// 创建新走法
    pub const fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// 马的 8 个方向和对应的马腿位置
const HORSE_JUMPS: [((i8, i8), (i8, i8)); 8] = [
    ((1, 2), (0, 1)),
    ((2, 1), (1, 0)),
    ((2, -1), (1, 0)),
    ((1, -2), (0, -1)),
    ((-1, -2), (0, -1)),
    ((-2, -1), (-1, 0)),
    ((-2, 1), (-1, 0)),
    ((-1, 2), (0, 1)),
];

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 判断单步走法是否符合棋子规则（不考虑将军）
    pub fn is_pseudo_legal(board: &Board, from: Position, to: Position) -> bool {
        if from == to || !from.is_valid() || !to.is_valid() {
            return false;
        }
        let Some(piece) = board.get(from) else {
            return false;
        };
        let target = board.get(to);
        if matches!(target, Some(t) if t.side == piece.side) {
            return false;
        }

        let dx = to.x as i8 - from.x as i8;
        let dy = to.y as i8 - from.y as i8;

        match piece.piece_type {
            PieceType::Chariot => board.count_between(from, to) == Some(0),
            PieceType::Horse => {
                let is_horse_move =
                    (dx.abs() == 1 && dy.abs() == 2) || (dx.abs() == 2 && dy.abs() == 1);
                if !is_horse_move {
                    return false;
                }
                let leg = if dx.abs() == 2 {
                    Position::new_unchecked((from.x as i8 + dx.signum()) as u8, from.y)
                } else {
                    Position::new_unchecked(from.x, (from.y as i8 + dy.signum()) as u8)
                };
                board.get(leg).is_none()
            }
            PieceType::Elephant => {
                if dx.abs() != 2 || dy.abs() != 2 || !to.is_on_own_half(piece.side) {
                    return false;
                }
                let eye = Position::new_unchecked(
                    (from.x as i8 + dx / 2) as u8,
                    (from.y as i8 + dy / 2) as u8,
                );
                board.get(eye).is_none()
            }
            PieceType::Advisor => dx.abs() == 1 && dy.abs() == 1 && to.is_in_palace(piece.side),
            PieceType::King => dx.abs() + dy.abs() == 1 && to.is_in_palace(piece.side),
            PieceType::Cannon => match (board.count_between(from, to), target) {
                (Some(screens), Some(_)) => screens == 1,
                (Some(screens), None) => screens == 0,
                (None, _) => false,
            },
            PieceType::Soldier => {
                let forward = piece.side.forward();
                if dx == 0 && dy == forward {
                    true
                } else {
                    dy == 0 && dx.abs() == 1 && from.has_crossed_river(piece.side)
                }
            }
        }
    }

    /// 生成伪合法走法（不考虑将军），`only` 指定时只生成该格棋子的走法
    pub fn generate_pseudo_legal(board: &Board, side: Side, only: Option<Position>) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);

        match only {
            Some(pos) => {
                if let Some(piece) = board.get(pos).filter(|p| p.side == side) {
                    Self::generate_piece_moves(board, pos, piece, &mut moves);
                }
            }
            None => {
                for (pos, piece) in board.occupied().filter(|(_, p)| p.side == side) {
                    Self::generate_piece_moves(board, pos, piece, &mut moves);
                }
            }
        }

        moves
    }

    /// 生成合法走法（过滤掉走后己方被将军的走法）
    ///
    /// 在传入的棋盘上逐个走子再撤销，返回时棋盘与调用前完全一致。
    pub fn generate_legal(board: &mut Board, side: Side, only: Option<Position>) -> Vec<Move> {
        let mut moves = Self::generate_pseudo_legal(board, side, only);
        moves.retain(|mv| {
            let captured = board.move_piece(mv.from, mv.to);
            let safe = !Self::is_in_check(board, side);
            board.unmove_piece(mv.from, mv.to, captured);
            safe
        });
        moves
    }

    /// 只读棋盘上的合法走法（复制一次棋盘）
    pub fn legal_moves(board: &Board, side: Side, only: Option<Position>) -> Vec<Move> {
        let mut scratch = board.clone();
        Self::generate_legal(&mut scratch, side, only)
    }

    /// 走法是否合法
    pub fn is_legal(board: &Board, side: Side, mv: Move) -> bool {
        Self::legal_moves(board, side, Some(mv.from)).contains(&mv)
    }

    /// 生成指定棋子的所有伪合法走法
    fn generate_piece_moves(board: &Board, pos: Position, piece: Piece, moves: &mut Vec<Move>) {
        match piece.piece_type {
            PieceType::King => Self::generate_king_moves(board, pos, piece.side, moves),
            PieceType::Advisor => Self::generate_advisor_moves(board, pos, piece.side, moves),
            PieceType::Elephant => Self::generate_elephant_moves(board, pos, piece.side, moves),
            PieceType::Horse => Self::generate_horse_moves(board, pos, piece.side, moves),
            PieceType::Chariot => Self::generate_chariot_moves(board, pos, piece.side, moves),
            PieceType::Cannon => Self::generate_cannon_moves(board, pos, piece.side, moves),
            PieceType::Soldier => Self::generate_soldier_moves(board, pos, piece.side, moves),
        }
    }

    /// 生成将/帅的走法
    fn generate_king_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        for (dx, dy) in ORTHOGONAL {
            if let Some(to) = pos.offset(dx, dy).filter(|to| to.is_in_palace(side)) {
                Self::try_add_move(board, pos, to, side, moves);
            }
        }
    }

    /// 生成士/仕的走法
    fn generate_advisor_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        for (dx, dy) in DIAGONAL {
            if let Some(to) = pos.offset(dx, dy).filter(|to| to.is_in_palace(side)) {
                Self::try_add_move(board, pos, to, side, moves);
            }
        }
    }

    /// 生成象/相的走法
    fn generate_elephant_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        for (bx, by) in DIAGONAL {
            // 塞象眼
            match pos.offset(bx, by) {
                Some(eye) if board.get(eye).is_none() => {}
                _ => continue,
            }

            // 不能过河
            if let Some(to) = pos.offset(bx * 2, by * 2).filter(|to| to.is_on_own_half(side)) {
                Self::try_add_move(board, pos, to, side, moves);
            }
        }
    }

    /// 生成马/傌的走法
    fn generate_horse_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        for ((dx, dy), (bx, by)) in HORSE_JUMPS {
            // 蹩马腿
            match pos.offset(bx, by) {
                Some(leg) if board.get(leg).is_none() => {}
                _ => continue,
            }

            if let Some(to) = pos.offset(dx, dy) {
                Self::try_add_move(board, pos, to, side, moves);
            }
        }
    }

    /// 生成车/俥的走法
    fn generate_chariot_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        for (dx, dy) in ORTHOGONAL {
            let mut current = pos;
            while let Some(to) = current.offset(dx, dy) {
                if let Some(target) = board.get(to) {
                    if target.side != side {
                        moves.push(Move::new(pos, to));
                    }
                    break;
                }
                moves.push(Move::new(pos, to));
                current = to;
            }
        }
    }

    /// 生成炮/砲的走法
    fn generate_cannon_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        for (dx, dy) in ORTHOGONAL {
            let mut current = pos;
            let mut screened = false;

            while let Some(to) = current.offset(dx, dy) {
                match (board.get(to), screened) {
                    (None, false) => moves.push(Move::new(pos, to)),
                    (None, true) => {}
                    // 第一个棋子作为炮架
                    (Some(_), false) => screened = true,
                    (Some(target), true) => {
                        if target.side != side {
                            moves.push(Move::new(pos, to));
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    /// 生成兵/卒的走法
    fn generate_soldier_moves(board: &Board, pos: Position, side: Side, moves: &mut Vec<Move>) {
        if let Some(to) = pos.offset(0, side.forward()) {
            Self::try_add_move(board, pos, to, side, moves);
        }

        // 过河后可以左右移动
        if pos.has_crossed_river(side) {
            for dx in [-1i8, 1i8] {
                if let Some(to) = pos.offset(dx, 0) {
                    Self::try_add_move(board, pos, to, side, moves);
                }
            }
        }
    }

    /// 目标格为空或为敌子时添加走法
    fn try_add_move(board: &Board, from: Position, to: Position, side: Side, moves: &mut Vec<Move>) {
        match board.get(to) {
            Some(target) if target.side == side => {}
            _ => moves.push(Move::new(from, to)),
        }
    }

    /// 检查指定阵营是否被将军
    ///
    /// 任一敌子可以伪合法地走到将位，或双将同列且中间无子（飞将，双方同时视为被将）。
    /// 找不到将时视为被将军：吃将只可能出现在非法的中间局面里。
    pub fn is_in_check(board: &Board, side: Side) -> bool {
        let Some(king_pos) = board.find_king(side) else {
            return true;
        };

        let opponent = side.opponent();
        let attacked = board
            .occupied()
            .filter(|(_, piece)| piece.side == opponent)
            .any(|(pos, _)| Self::is_pseudo_legal(board, pos, king_pos));

        attacked || board.kings_facing()
    }

    /// 无子可走时的终局判定：被将军则对方胜，否则困毙和棋
    pub fn terminal_result(board: &mut Board, side_to_move: Side) -> Option<GameResult> {
        if !Self::generate_legal(board, side_to_move, None).is_empty() {
            return None;
        }
        if Self::is_in_check(board, side_to_move) {
            Some(GameResult::win_for(side_to_move.opponent(), WinReason::Checkmate))
        } else {
            Some(GameResult::Draw(DrawReason::Stalemate))
        }
    }

    /// 检查是否被将死
    pub fn is_checkmate(board: &Board, side: Side) -> bool {
        Self::is_in_check(board, side) && Self::legal_moves(board, side, None).is_empty()
    }

    /// 检查是否困毙（无子可动但未被将军）
    pub fn is_stalemate(board: &Board, side: Side) -> bool {
        !Self::is_in_check(board, side) && Self::legal_moves(board, side, None).is_empty()
    }
}
