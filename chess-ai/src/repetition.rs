//! 重复局面计数
//!
//! 以局面哈希为键记录出现次数。对局控制器持有权威的一份，
//! 每次决策把副本交给搜索，搜索中的模拟走子只修改副本。

use std::collections::HashMap;

use chess_core::REPETITION_DRAW_COUNT;

/// 局面出现次数表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepetitionHistory {
    counts: HashMap<u64, u32>,
}

impl RepetitionHistory {
    /// 以起始局面（计数 1）初始化
    pub fn seeded(hash: u64) -> Self {
        let mut history = Self::default();
        history.record(hash);
        history
    }

    /// 记录一次出现，返回记录后的次数
    pub fn record(&mut self, hash: u64) -> u32 {
        let count = self.counts.entry(hash).or_insert(0);
        *count += 1;
        *count
    }

    /// 撤销一次记录，计数归零时删除
    pub fn unrecord(&mut self, hash: u64) {
        if let Some(count) = self.counts.get_mut(&hash) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&hash);
            }
        }
    }

    /// 局面出现次数
    pub fn count(&self, hash: u64) -> u32 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }

    /// 是否已达到判和次数
    pub fn is_draw(&self, hash: u64) -> bool {
        self.count(hash) >= REPETITION_DRAW_COUNT
    }

    /// 不同局面的数量
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
