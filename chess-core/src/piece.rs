//! 棋子定义

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_HEIGHT, BOARD_SQUARES, BOARD_WIDTH, RED_RIVER_ROW};

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    /// 将/帅
    King,
    /// 士/仕
    Advisor,
    /// 象/相
    Elephant,
    /// 马/傌
    Horse,
    /// 车/俥
    Chariot,
    /// 炮/砲
    Cannon,
    /// 兵/卒
    Soldier,
}

impl PieceType {
    /// 获取棋子的基础分值（用于 AI 评估和吃子排序）
    pub fn value(&self) -> i32 {
        match self {
            PieceType::King => 10000,
            PieceType::Chariot => 900,
            PieceType::Cannon => 500,
            PieceType::Horse => 450,
            PieceType::Elephant => 200,
            PieceType::Advisor => 120,
            PieceType::Soldier => 100,
        }
    }

    /// 表索引（0-6）
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            PieceType::King => 0,
            PieceType::Advisor => 1,
            PieceType::Elephant => 2,
            PieceType::Horse => 3,
            PieceType::Chariot => 4,
            PieceType::Cannon => 5,
            PieceType::Soldier => 6,
        }
    }

    /// 获取 FEN 字符（红方大写，黑方小写）
    pub fn to_fen_char(&self, side: Side) -> char {
        let c = match self {
            PieceType::King => 'k',
            PieceType::Advisor => 'a',
            PieceType::Elephant => 'b',
            PieceType::Horse => 'n',
            PieceType::Chariot => 'r',
            PieceType::Cannon => 'c',
            PieceType::Soldier => 'p',
        };
        match side {
            Side::Red => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }

    /// 从 FEN 字符解析，兼容 `e`/`h` 写法
    pub fn from_fen_char(c: char) -> Option<(PieceType, Side)> {
        let side = if c.is_ascii_uppercase() {
            Side::Red
        } else {
            Side::Black
        };
        let piece_type = match c.to_ascii_lowercase() {
            'k' => PieceType::King,
            'a' => PieceType::Advisor,
            'b' | 'e' => PieceType::Elephant,
            'n' | 'h' => PieceType::Horse,
            'r' => PieceType::Chariot,
            'c' => PieceType::Cannon,
            'p' => PieceType::Soldier,
            _ => return None,
        };
        Some((piece_type, side))
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 红方（先手，占据第 0-4 行）
    Red,
    /// 黑方（后手，占据第 5-9 行）
    Black,
}

impl Side {
    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Side::Red => 0,
            Side::Black => 1,
        }
    }

    /// 兵卒前进方向（行增量）
    #[inline]
    pub fn forward(&self) -> i8 {
        match self {
            Side::Red => 1,
            Side::Black => -1,
        }
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Side::Red => 'w',
            Side::Black => 'b',
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Side> {
        match c {
            'w' | 'W' | 'r' | 'R' => Some(Side::Red),
            'b' | 'B' => Some(Side::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Red => write!(f, "红方"),
            Side::Black => write!(f, "黑方"),
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub side: Side,
}

impl Piece {
    /// 创建新棋子
    pub const fn new(piece_type: PieceType, side: Side) -> Self {
        Self { piece_type, side }
    }

    /// 获取棋子显示的汉字
    pub fn display_char(&self) -> char {
        match (self.piece_type, self.side) {
            (PieceType::King, Side::Red) => '帥',
            (PieceType::King, Side::Black) => '將',
            (PieceType::Advisor, Side::Red) => '仕',
            (PieceType::Advisor, Side::Black) => '士',
            (PieceType::Elephant, Side::Red) => '相',
            (PieceType::Elephant, Side::Black) => '象',
            (PieceType::Horse, Side::Red) => '傌',
            (PieceType::Horse, Side::Black) => '馬',
            (PieceType::Chariot, Side::Red) => '俥',
            (PieceType::Chariot, Side::Black) => '車',
            (PieceType::Cannon, Side::Red) => '炮',
            (PieceType::Cannon, Side::Black) => '砲',
            (PieceType::Soldier, Side::Red) => '兵',
            (PieceType::Soldier, Side::Black) => '卒',
        }
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        self.piece_type.to_fen_char(self.side)
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Piece> {
        PieceType::from_fen_char(c).map(|(piece_type, side)| Piece { piece_type, side })
    }

    /// 获取棋子分值
    pub fn value(&self) -> i32 {
        self.piece_type.value()
    }
}

/// 棋盘位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 列 (0-8)
    pub x: u8,
    /// 行 (0-9)，0 为红方底线
    pub y: u8,
}

impl Position {
    /// 创建新位置
    pub fn new(x: u8, y: u8) -> Option<Self> {
        if (x as usize) < BOARD_WIDTH && (y as usize) < BOARD_HEIGHT {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// 检查位置是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.x as usize) < BOARD_WIDTH && (self.y as usize) < BOARD_HEIGHT
    }

    /// 是否在指定阵营的己方半场
    pub fn is_on_own_half(&self, side: Side) -> bool {
        match side {
            Side::Red => self.y <= RED_RIVER_ROW,
            Side::Black => self.y > RED_RIVER_ROW,
        }
    }

    /// 对指定阵营而言是否已过河
    pub fn has_crossed_river(&self, side: Side) -> bool {
        !self.is_on_own_half(side)
    }

    /// 检查位置是否在九宫格内
    pub fn is_in_palace(&self, side: Side) -> bool {
        let in_x = (3..=5).contains(&self.x);
        let in_y = match side {
            Side::Red => (0..=2).contains(&self.y),
            Side::Black => (7..=9).contains(&self.y),
        };
        in_x && in_y
    }

    /// 获取偏移后的位置
    pub fn offset(&self, dx: i8, dy: i8) -> Option<Position> {
        let new_x = self.x as i8 + dx;
        let new_y = self.y as i8 + dy;
        if new_x >= 0 && (new_x as usize) < BOARD_WIDTH && new_y >= 0 && (new_y as usize) < BOARD_HEIGHT {
            Some(Position {
                x: new_x as u8,
                y: new_y as u8,
            })
        } else {
            None
        }
    }

    /// 转换为数组索引
    #[inline]
    pub fn to_index(&self) -> usize {
        self.y as usize * BOARD_WIDTH + self.x as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < BOARD_SQUARES {
            Some(Position {
                x: (index % BOARD_WIDTH) as u8,
                y: (index / BOARD_WIDTH) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
