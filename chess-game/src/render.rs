//! 终端棋盘显示

use chess_core::{Board, Move, Position, BOARD_HEIGHT, BOARD_WIDTH};

/// 把棋盘画成文本，黑方在上
///
/// 每行以行号开头，最下面一行是列字母，与 ICCS 记法一致。
/// 上一步的起点和终点用 `*` 标出。
pub fn render_board(board: &Board, last_move: Option<Move>) -> String {
    let mut out = String::new();
    for y in (0..BOARD_HEIGHT).rev() {
        out.push_str(&format!("{} ", y));
        for x in 0..BOARD_WIDTH {
            let pos = Position::new_unchecked(x as u8, y as u8);
            let cell = match board.get(pos) {
                Some(piece) => piece.display_char(),
                None => '＋',
            };
            let marked = last_move.is_some_and(|mv| mv.from == pos || mv.to == pos);
            out.push(cell);
            out.push(if marked { '*' } else { ' ' });
        }
        out.push('\n');
        if y == 5 {
            out.push_str("  ～～～ 楚河  漢界 ～～～\n");
        }
    }
    out.push_str("  ");
    for x in 0..BOARD_WIDTH {
        out.push((b'a' + x as u8) as char);
        out.push_str("  ");
    }
    out.push('\n');
    out
}
