//! 对局结果与对局事件

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::moves::Move;
use crate::piece::Side;

/// 游戏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 红方胜
    RedWin(WinReason),
    /// 黑方胜
    BlackWin(WinReason),
    /// 和棋
    Draw(DrawReason),
}

impl GameResult {
    /// 指定阵营获胜
    pub fn win_for(side: Side, reason: WinReason) -> Self {
        match side {
            Side::Red => GameResult::RedWin(reason),
            Side::Black => GameResult::BlackWin(reason),
        }
    }

    /// 获胜方，和棋时为 None
    pub fn winner(&self) -> Option<Side> {
        match self {
            GameResult::RedWin(_) => Some(Side::Red),
            GameResult::BlackWin(_) => Some(Side::Black),
            GameResult::Draw(_) => None,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::RedWin(WinReason::Checkmate) => write!(f, "红方胜（将死）"),
            GameResult::BlackWin(WinReason::Checkmate) => write!(f, "黑方胜（将死）"),
            GameResult::Draw(DrawReason::Stalemate) => write!(f, "和棋（困毙）"),
            GameResult::Draw(DrawReason::Repetition) => write!(f, "和棋（重复局面）"),
        }
    }
}

/// 胜利原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// 将死
    Checkmate,
}

/// 和棋原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    /// 无子可动（困毙）
    Stalemate,
    /// 同一局面出现五次
    Repetition,
}

/// 对局事件，由对局控制器发给界面层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// 棋盘更新
    BoardUpdated {
        board: Board,
        side_to_move: Side,
        last_move: Option<Move>,
    },
    /// AI 开始或结束思考
    Thinking(bool),
    /// 游戏结束
    GameOver(GameResult),
}
