//! 错误类型定义

use thiserror::Error;

use crate::piece::Position;

/// 象棋规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    /// 非法走法（违反走子规则或走后己方被将军）
    #[error("Illegal move: from {from} to {to}")]
    IllegalMove { from: Position, to: Position },

    /// 没有棋子
    #[error("No piece at position {0}")]
    NoPiece(Position),

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },

    /// 无法解析的坐标记法
    #[error("Invalid move notation: {0}")]
    InvalidNotation(String),

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, ChessError>;
