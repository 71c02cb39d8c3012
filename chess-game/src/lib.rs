//! 中国象棋人机对局
//!
//! 对局控制器、配置和终端显示。

pub mod config;
pub mod controller;
pub mod render;

pub use config::GameConfig;
pub use controller::GameController;
pub use render::render_board;
