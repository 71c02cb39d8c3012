//! ICCS 坐标记法
//!
//! 四个字符 `<列><行><列><行>`，列为 `a`-`i`（红方视角从左到右），
//! 行为 `0`-`9`（从红方底线数起）。例如炮二平五写作 `h2e2`。
//! 云库的回复和终端输入都使用这种记法。

use crate::error::{ChessError, Result};
use crate::moves::Move;
use crate::piece::Position;

/// ICCS 记法
pub struct Iccs;

impl Iccs {
    /// 格式化单个位置，例如 `(4, 0)` 为 `e0`
    pub fn square(pos: Position) -> String {
        format!("{}{}", (b'a' + pos.x) as char, pos.y)
    }

    /// 格式化走法
    pub fn to_string(mv: &Move) -> String {
        format!("{}{}", Self::square(mv.from), Self::square(mv.to))
    }

    /// 解析单个位置
    pub fn parse_square(s: &str) -> Option<Position> {
        let mut chars = s.chars();
        let (file, rank) = (chars.next()?, chars.next()?);
        if chars.next().is_some() {
            return None;
        }
        Self::square_from_chars(file, rank)
    }

    /// 解析走法，忽略首尾空白，列字母大小写均可
    pub fn parse(s: &str) -> Option<Move> {
        let chars: Vec<char> = s.trim().chars().collect();
        match chars.as_slice() {
            &[f1, r1, f2, r2] => Some(Move::new(
                Self::square_from_chars(f1, r1)?,
                Self::square_from_chars(f2, r2)?,
            )),
            _ => None,
        }
    }

    /// 解析走法，失败时返回 `InvalidNotation`
    pub fn parse_move(s: &str) -> Result<Move> {
        Self::parse(s).ok_or_else(|| ChessError::InvalidNotation(s.trim().to_string()))
    }

    fn square_from_chars(file: char, rank: char) -> Option<Position> {
        let file = file.to_ascii_lowercase();
        if !('a'..='i').contains(&file) {
            return None;
        }
        let y = rank.to_digit(10)? as u8;
        Position::new(file as u8 - b'a', y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        // 炮二平五
        let mv = Move::new(Position::new_unchecked(7, 2), Position::new_unchecked(4, 2));
        assert_eq!(Iccs::to_string(&mv), "h2e2");
        assert_eq!(Iccs::square(Position::new_unchecked(0, 9)), "a9");
    }

    #[test]
    fn test_parse() {
        let mv = Iccs::parse(" b0C2\n").unwrap();
        assert_eq!(mv.from, Position::new_unchecked(1, 0));
        assert_eq!(mv.to, Position::new_unchecked(2, 2));
        assert_eq!(Iccs::parse_square("i9"), Some(Position::new_unchecked(8, 9)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Iccs::parse("j0a0"), None);
        assert_eq!(Iccs::parse("a0a"), None);
        assert_eq!(Iccs::parse("a0a0a"), None);
        assert_eq!(Iccs::parse("axa0"), None);
        assert_eq!(Iccs::parse_square("a10"), None);
    }

    #[test]
    fn test_parse_move_error() {
        assert_eq!(
            Iccs::parse_move(" z9a0 "),
            Err(ChessError::InvalidNotation("z9a0".to_string()))
        );
        assert_eq!(
            Iccs::parse_move("h2e2"),
            Ok(Move::new(Position::new_unchecked(7, 2), Position::new_unchecked(4, 2)))
        );
    }
}
