//! 规则常量定义

/// 棋盘宽度（列数）
pub const BOARD_WIDTH: usize = 9;

/// 棋盘高度（行数）
pub const BOARD_HEIGHT: usize = 10;

/// 棋盘格子总数
pub const BOARD_SQUARES: usize = BOARD_WIDTH * BOARD_HEIGHT;

/// 红方半场的最后一行（河界在第 4 行与第 5 行之间）
pub const RED_RIVER_ROW: u8 = 4;

/// 同一局面出现多少次判和
pub const REPETITION_DRAW_COUNT: u32 = 5;
