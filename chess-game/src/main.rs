use std::path::PathBuf;

use anyhow::{Context, Result};
use chess_core::{GameEvent, Iccs};
use chess_game::{render_board, GameConfig, GameController};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HELP: &str = "输入 ICCS 走法（如 h2e2），`moves [格子]` 列出合法走法，`new` 重新开局，`quit` 退出";

#[derive(Parser)]
#[command(name = "xiangqi")]
#[command(about = "中国象棋人机对局", long_about = None)]
struct Args {
    /// 配置文件路径，默认在用户配置目录下
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 把当前配置写入配置文件后退出
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::load(args.config.as_deref());

    // 初始化日志，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("日志过滤规则无效")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if args.init_config {
        let path = args
            .config
            .or_else(GameConfig::default_path)
            .context("无法获取配置目录")?;
        config.save_to(&path)?;
        println!("配置已写入 {}", path.display());
        return Ok(());
    }

    info!("中国象棋人机对局启动，AI 执{}", config.ai_side);

    let (mut controller, mut events) = GameController::from_config(&config)?;
    controller.new_game();
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        show_events(&mut events);

        if controller.result().is_some() {
            println!("输入 `new` 重新开局，`quit` 退出");
        } else if controller.is_ai_turn() {
            match controller.play_ai_turn().await {
                Ok(Some(mv)) => println!("AI 走 {}", Iccs::to_string(&mv)),
                Ok(None) => {}
                Err(e) => warn!("AI 走子失败: {}", e),
            }
            continue;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut words = line.split_whitespace();
        match words.next() {
            None => {}
            Some("quit") | Some("exit") => break,
            Some("new") => controller.new_game(),
            Some("moves") => {
                let moves = match words.next() {
                    Some(square) => match Iccs::parse_square(square) {
                        Some(pos) => controller.legal_moves_from(pos),
                        None => {
                            println!("无效的格子: {}", square);
                            continue;
                        }
                    },
                    None => controller.legal_moves(),
                };
                let list: Vec<String> = moves.iter().map(Iccs::to_string).collect();
                println!("{}", list.join(" "));
            }
            Some(word) => match Iccs::parse_move(word) {
                Ok(mv) => {
                    if let Err(e) = controller.submit_move(mv.from, mv.to) {
                        println!("{}", e);
                    }
                }
                Err(e) => println!("{}\n{}", e, HELP),
            },
        }
    }

    info!("退出");
    Ok(())
}

fn show_events(events: &mut UnboundedReceiver<GameEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            GameEvent::BoardUpdated { board, side_to_move, last_move } => {
                println!();
                print!("{}", render_board(&board, last_move));
                println!("轮到{}", side_to_move);
            }
            GameEvent::Thinking(true) => println!("AI 思考中..."),
            GameEvent::Thinking(false) => {}
            GameEvent::GameOver(result) => println!("对局结束: {}", result),
        }
    }
}
