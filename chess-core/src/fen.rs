//! FEN 格式解析和生成
//!
//! 格式：`<棋盘> <走子方> - - <无吃子步数> <回合数>`
//!
//! 棋盘部分从黑方底线（y=9）写到红方底线（y=0），走子方为 `w`（红）或 `b`（黑）。
//! 解析时只要求棋盘部分，缺省的走子方按红方处理，其余字段只取回合数。

use crate::board::{Board, BoardState};
use crate::error::ChessError;
use crate::piece::{Piece, Position, Side};

/// 初始局面 FEN
pub const INITIAL_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串为棋盘状态
    ///
    /// 回合数换算为半回合数 `ply`：第 n 回合红方走时为 `2(n-1)`，黑方走时再加一。
    pub fn parse(fen: &str) -> Result<BoardState, ChessError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        let Some(board_part) = parts.first() else {
            return Err(ChessError::InvalidFen {
                reason: "Empty FEN string".to_string(),
            });
        };

        let board = Self::parse_board(board_part)?;

        let current_turn = match parts.get(1) {
            Some(field) => {
                let mut chars = field.chars();
                match (chars.next().and_then(Side::from_fen_char), chars.next()) {
                    (Some(side), None) => side,
                    _ => {
                        return Err(ChessError::InvalidFen {
                            reason: format!("Invalid side to move: {}", field),
                        })
                    }
                }
            }
            None => Side::Red,
        };

        // 带 '-' 占位的六字段格式取最后一个字段作为回合数
        let round: u32 = parts
            .last()
            .filter(|_| parts.len() >= 4)
            .and_then(|s| s.parse().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(1);

        let ply = (round - 1) * 2 + u32::from(current_turn == Side::Black);

        Ok(BoardState {
            board,
            current_turn,
            ply,
        })
    }

    /// 解析棋盘部分
    pub fn parse_board(board_str: &str) -> Result<Board, ChessError> {
        let mut board = Board::empty();
        let rows: Vec<&str> = board_str.split('/').collect();

        if rows.len() != 10 {
            return Err(ChessError::InvalidFen {
                reason: format!("Expected 10 rows, got {}", rows.len()),
            });
        }

        // FEN 从上到下是 y=9 到 y=0
        for (row_idx, row) in rows.iter().enumerate() {
            let y = 9 - row_idx as u8;
            let mut x = 0u8;

            for c in row.chars() {
                if x >= 9 {
                    return Err(ChessError::InvalidFen {
                        reason: format!("Row {} has too many columns", row_idx),
                    });
                }

                if let Some(empty_count) = c.to_digit(10) {
                    x += empty_count as u8;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    board.set(Position::new_unchecked(x, y), Some(piece));
                    x += 1;
                } else {
                    return Err(ChessError::InvalidFen {
                        reason: format!("Invalid piece character: {}", c),
                    });
                }
            }

            if x != 9 {
                return Err(ChessError::InvalidFen {
                    reason: format!("Row {} has {} columns, expected 9", row_idx, x),
                });
            }
        }

        Ok(board)
    }

    /// 将棋盘状态转换为 FEN 字符串
    pub fn to_string(state: &BoardState) -> String {
        format!(
            "{} {} - - 0 {}",
            Self::board_to_string(&state.board),
            state.current_turn.to_fen_char(),
            state.ply / 2 + 1
        )
    }

    /// 云库查询使用的 FEN，后四个字段固定为 `- - 0 1`
    pub fn to_remote(board: &Board, side: Side) -> String {
        format!("{} {} - - 0 1", Self::board_to_string(board), side.to_fen_char())
    }

    /// 只生成棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let mut rows = Vec::with_capacity(10);

        for y in (0..10u8).rev() {
            let mut row = String::new();
            let mut empty_count = 0;

            for x in 0..9u8 {
                match board.get(Position::new_unchecked(x, y)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            row.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        row.push(piece.to_fen_char());
                    }
                    None => empty_count += 1,
                }
            }

            if empty_count > 0 {
                row.push_str(&empty_count.to_string());
            }

            rows.push(row);
        }

        rows.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceType;

    #[test]
    fn test_parse_initial_fen() {
        let state = Fen::parse(INITIAL_FEN).unwrap();

        assert_eq!(state.current_turn, Side::Red);
        assert_eq!(state.ply, 0);
        assert_eq!(state.board, Board::initial());

        let king = state.board.get(Position::new_unchecked(4, 0));
        assert_eq!(king, Some(Piece::new(PieceType::King, Side::Red)));

        let cannon = state.board.get(Position::new_unchecked(1, 7));
        assert_eq!(cannon, Some(Piece::new(PieceType::Cannon, Side::Black)));
    }

    #[test]
    fn test_fen_roundtrip() {
        let fen = "r1bakab1r/9/1cn4cn/p1p1p1p1p/9/2P6/P3P1P1P/1C2B2C1/9/RN1AKABNR b - - 0 3";
        let state = Fen::parse(fen).unwrap();
        assert_eq!(state.ply, 5);
        assert_eq!(Fen::to_string(&state), fen);
    }

    #[test]
    fn test_short_fen() {
        let state = Fen::parse("4k4/9/9/9/9/9/9/9/9/4K4 b").unwrap();
        assert_eq!(state.current_turn, Side::Black);
        assert_eq!(state.ply, 1);
        assert_eq!(state.board.find_king(Side::Red), Some(Position::new_unchecked(4, 0)));
        assert_eq!(state.board.find_king(Side::Black), Some(Position::new_unchecked(4, 9)));

        let state = Fen::parse("4k4/9/9/9/9/9/9/9/9/4K4").unwrap();
        assert_eq!(state.current_turn, Side::Red);
    }

    #[test]
    fn test_remote_format() {
        let board = Board::initial();
        assert_eq!(
            Fen::to_remote(&board, Side::Black),
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR b - - 0 1"
        );
    }

    #[test]
    fn test_invalid_fen() {
        assert!(Fen::parse("").is_err());
        // 行数不对
        assert!(Fen::parse("4k4/9/9").is_err());
        // 列数不对
        assert!(Fen::parse("4k44/9/9/9/9/9/9/9/9/4K4 w").is_err());
        // 无效字符
        assert!(Fen::parse("4x4/9/9/9/9/9/9/9/9/4K4 w").is_err());
        // 无效走子方
        assert!(Fen::parse("4k4/9/9/9/9/9/9/9/9/4K4 x").is_err());
    }
}
