//! 棋局评估函数
//!
//! 子力分 + 位置分，被将军的一方扣固定分，结果取走子方视角。

use chess_core::{Board, MoveGenerator, Piece, PieceType, Position, Side};

/// 被将军的惩罚分
pub const IN_CHECK_PENALTY: i32 = 50;

/// 评估器
pub struct Evaluator;

/// 棋子位置分值表（红方视角，黑方按行镜像）
/// 索引为 y * 9 + x，第 0 行是己方底线
mod position_tables {
    /// 兵的位置分值
    pub const SOLDIER: [i32; 90] = [
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0, -2,  0,  4,  0, -2,  0,  0,
        2,  0,  8,  0,  8,  0,  8,  0,  2,
       10, 18, 22, 35, 40, 35, 22, 18, 10,
       20, 27, 30, 40, 42, 40, 30, 27, 20,
       20, 30, 45, 55, 55, 55, 45, 30, 20,
       20, 30, 50, 65, 70, 65, 50, 30, 20,
        0,  3,  6,  9, 12,  9,  6,  3,  0,  // 底兵价值下降
    ];

    /// 马的位置分值
    pub const HORSE: [i32; 90] = [
        0, -3,  2,  0,  2,  0,  2, -3,  0,
       -3,  2,  4,  5,-10,  5,  4,  2, -3,
        5,  4,  6,  7,  4,  7,  6,  4,  5,
        4,  6, 10,  7, 10,  7, 10,  6,  4,
        2, 10, 13, 14, 15, 14, 13, 10,  2,
        2, 12, 11, 15, 16, 15, 11, 12,  2,
        5, 20, 12, 19, 12, 19, 12, 20,  5,
        4, 10, 11, 15, 11, 15, 11, 10,  4,
        2,  8, 15,  9,  6,  9, 15,  8,  2,
        2,  2,  2,  8,  2,  8,  2,  2,  2,
    ];

    /// 炮的位置分值
    pub const CANNON: [i32; 90] = [
        0,  0,  1,  3,  3,  3,  1,  0,  0,
        0,  1,  2,  2,  2,  2,  2,  1,  0,
        1,  0,  4,  3,  5,  3,  4,  0,  1,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
       -1,  0,  3,  0,  4,  0,  3,  0, -1,
        0,  0,  0,  0,  4,  0,  0,  0,  0,
        0,  3,  3,  2,  4,  2,  3,  3,  0,
        1,  1,  0, -5, -4, -5,  0,  1,  1,
        2,  2,  0, -4, -7, -4,  0,  2,  2,
        4,  4,  0, -5, -6, -5,  0,  4,  4,
    ];

    /// 车的位置分值
    pub const CHARIOT: [i32; 90] = [
       -2, 10,  6, 14, 12, 14,  6, 10, -2,
        8,  4,  8, 16,  8, 16,  8,  4,  8,
        4,  8,  6, 14, 12, 14,  6,  8,  4,
        6, 10,  8, 14, 14, 14,  8, 10,  6,
       12, 16, 14, 20, 20, 20, 14, 16, 12,
       12, 14, 12, 18, 18, 18, 12, 14, 12,
       12, 18, 16, 22, 22, 22, 16, 18, 12,
       12, 12, 12, 18, 18, 18, 12, 12, 12,
       16, 20, 18, 24, 26, 24, 18, 20, 16,
       14, 14, 12, 18, 16, 18, 12, 14, 14,
    ];

    /// 士只在九宫内有意义，占据下二路两角略有加分
    pub const ADVISOR: [i32; 90] = {
        let mut table = [0; 90];
        table[13] = 3; // (4, 1) 中心
        table[3] = 1;
        table[5] = 1;
        table
    };

    /// 相守在中路和边路的象位
    pub const ELEPHANT: [i32; 90] = {
        let mut table = [0; 90];
        table[2 * 9 + 4] = 3; // (4, 2) 象眼
        table[2] = 1;
        table[6] = 1;
        table
    };
}

impl Evaluator {
    /// 评估棋局，正值对 `side_to_move` 有利
    pub fn evaluate(board: &Board, side_to_move: Side) -> i32 {
        let mut red = 0;
        let mut black = 0;

        for (pos, piece) in board.occupied() {
            let piece_score = Self::evaluate_piece(pos, piece);
            match piece.side {
                Side::Red => red += piece_score,
                Side::Black => black += piece_score,
            }
        }

        if MoveGenerator::is_in_check(board, Side::Red) {
            red -= IN_CHECK_PENALTY;
        }
        if MoveGenerator::is_in_check(board, Side::Black) {
            black -= IN_CHECK_PENALTY;
        }

        match side_to_move {
            Side::Red => red - black,
            Side::Black => black - red,
        }
    }

    /// 评估单个棋子的价值（包括位置分）
    fn evaluate_piece(pos: Position, piece: Piece) -> i32 {
        piece.value() + Self::position_bonus(pos, piece)
    }

    /// 获取位置加成分
    fn position_bonus(pos: Position, piece: Piece) -> i32 {
        let index = match piece.side {
            Side::Red => pos.y as usize * 9 + pos.x as usize,
            // 黑方需要镜像（y 坐标翻转）
            Side::Black => (9 - pos.y as usize) * 9 + pos.x as usize,
        };

        match piece.piece_type {
            PieceType::Soldier => position_tables::SOLDIER[index],
            PieceType::Horse => position_tables::HORSE[index],
            PieceType::Cannon => position_tables::CANNON[index],
            PieceType::Chariot => position_tables::CHARIOT[index],
            PieceType::Advisor => position_tables::ADVISOR[index],
            PieceType::Elephant => position_tables::ELEPHANT[index],
            PieceType::King => 0,
        }
    }

    /// 快速评估（仅计算子力差，红方视角）
    pub fn evaluate_material(board: &Board) -> i32 {
        board
            .occupied()
            .map(|(_, piece)| match piece.side {
                Side::Red => piece.value(),
                Side::Black => -piece.value(),
            })
            .sum()
    }
}
