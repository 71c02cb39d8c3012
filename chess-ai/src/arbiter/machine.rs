//! 决策状态机
//!
//! `AwaitingRemote → (RemoteOk | RemoteFailed) → [LocalSearch] → Validate
//!  → {Accept | FallbackFirstLegal | NoMove}`
//!
//! 状态转换是纯函数，不涉及计时和并发；驱动方按时序把事件喂进来。

use chess_core::Move;
use serde::{Deserialize, Serialize};

/// 走法来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveSource {
    Remote,
    Local,
    FallbackFirstLegal,
    None,
}

impl std::fmt::Display for MoveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MoveSource::Remote => "remote",
            MoveSource::Local => "local",
            MoveSource::FallbackFirstLegal => "fallback",
            MoveSource::None => "none",
        };
        f.write_str(name)
    }
}

/// 待校验的候选走法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub mv: Move,
    pub source: MoveSource,
}

/// 决策状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionState {
    /// 等待远程结果
    AwaitingRemote,
    /// 远程给出了走法（已通过远程客户端的合法性校验）
    RemoteOk(Move),
    /// 远程失败、超时或关闭
    RemoteFailed,
    /// 等待本地搜索
    LocalSearch,
    /// 最终校验
    Validate(Option<Candidate>),
    /// 接受候选走法
    Accept(Candidate),
    /// 候选走法缺失或不合法，使用第一个合法走法
    FallbackFirstLegal(Move),
    /// 无子可走
    NoMove,
}

impl DecisionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DecisionState::Accept(_) | DecisionState::FallbackFirstLegal(_) | DecisionState::NoMove
        )
    }
}

/// 驱动状态机的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionEvent {
    /// 远程结果，None 表示失败
    Remote(Option<Move>),
    /// 离开远程结果状态
    Proceed,
    /// 本地搜索结果
    Local(Option<Move>),
    /// 最终校验，携带当前局面新生成的合法走法
    Resolve(Vec<Move>),
}

/// 计算下一个状态，不匹配的事件保持原状态
pub fn transition(state: &DecisionState, event: DecisionEvent) -> DecisionState {
    use DecisionEvent as E;
    use DecisionState as S;

    match (state, event) {
        (S::AwaitingRemote, E::Remote(Some(mv))) => S::RemoteOk(mv),
        (S::AwaitingRemote, E::Remote(None)) => S::RemoteFailed,
        (S::RemoteOk(mv), E::Proceed) => S::Validate(Some(Candidate {
            mv: *mv,
            source: MoveSource::Remote,
        })),
        (S::RemoteFailed, E::Proceed) => S::LocalSearch,
        (S::LocalSearch, E::Local(mv)) => S::Validate(mv.map(|mv| Candidate {
            mv,
            source: MoveSource::Local,
        })),
        (S::Validate(candidate), E::Resolve(legal)) => match candidate {
            Some(c) if legal.contains(&c.mv) => S::Accept(*c),
            _ => match legal.first() {
                Some(first) => S::FallbackFirstLegal(*first),
                None => S::NoMove,
            },
        },
        (state, _) => state.clone(),
    }
}

/// 记录经过状态的状态机
#[derive(Debug, Clone)]
pub struct DecisionMachine {
    trail: Vec<DecisionState>,
}

impl DecisionMachine {
    pub fn new() -> Self {
        Self {
            trail: vec![DecisionState::AwaitingRemote],
        }
    }

    /// 当前状态
    pub fn state(&self) -> &DecisionState {
        // trail 初始化时至少有一个状态
        &self.trail[self.trail.len() - 1]
    }

    /// 喂入事件，状态变化时追加到轨迹
    pub fn advance(&mut self, event: DecisionEvent) -> &DecisionState {
        let next = transition(self.state(), event);
        if &next != self.state() {
            self.trail.push(next);
        }
        self.state()
    }

    /// 最终走法和来源
    pub fn outcome(&self) -> (Option<Move>, MoveSource) {
        match self.state() {
            DecisionState::Accept(c) => (Some(c.mv), c.source),
            DecisionState::FallbackFirstLegal(mv) => (Some(*mv), MoveSource::FallbackFirstLegal),
            _ => (None, MoveSource::None),
        }
    }

    pub fn into_trail(self) -> Vec<DecisionState> {
        self.trail
    }
}

impl Default for DecisionMachine {
    fn default() -> Self {
        Self::new()
    }
}
