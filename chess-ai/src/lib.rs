//! 中国象棋 AI
//!
//! 包含:
//! - Zobrist 哈希与重复局面计数
//! - 棋局评估函数
//! - 迭代加深 Alpha-Beta 搜索（置换表、杀手走法、历史启发、静态搜索）
//! - 云库远程走法查询
//! - 远程与本地之间的决策器

pub mod arbiter;
mod evaluate;
mod position;
pub mod remote;
mod repetition;
mod search;
mod transposition;
mod zobrist;

pub use arbiter::{
    ArbiterConfig, Decision, DecisionArbiter, DecisionRequest, DecisionState, MoveSource,
};
pub use evaluate::{Evaluator, IN_CHECK_PENALTY};
pub use position::{SearchPosition, Undo};
pub use remote::{
    CloudDbSource, OfflineSource, RemoteClient, RemoteConfig, RemoteError, RemoteMoveSource,
};
pub use repetition::RepetitionHistory;
pub use search::{
    AiConfig, AiEngine, LocalEngine, LocalMoveSource, SearchOutcome, SearchRequest, MATE_SCORE,
};
pub use transposition::{Bound, TTEntry, TTStats, TranspositionTable};
pub use zobrist::ZobristTable;
