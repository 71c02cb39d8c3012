//! 中国象棋规则库
//!
//! 包含:
//! - 棋子、棋盘、位置等核心数据结构
//! - 走法生成和规则验证（将军、将死、困毙）
//! - 对局结果与对局事件
//! - 局面格式 (FEN) 和坐标记法 (ICCS)

mod board;
mod constants;
mod error;
mod fen;
mod message;
mod moves;
mod notation;
mod piece;

pub use board::{Board, BoardState};
pub use constants::*;
pub use error::{ChessError, Result};
pub use fen::{Fen, INITIAL_FEN};
pub use message::{DrawReason, GameEvent, GameResult, WinReason};
pub use moves::{Move, MoveGenerator};
pub use notation::Iccs;
pub use piece::{Piece, PieceType, Position, Side};
