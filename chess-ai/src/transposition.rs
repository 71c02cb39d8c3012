//! 置换表
//!
//! 缓存单次搜索中已经算过的局面。每次搜索开始前清空，不跨决策复用。

use std::sync::atomic::{AtomicU64, Ordering};

use chess_core::Move;

/// 置换表条目的分数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// 精确值
    Exact,
    /// 下界（发生 Beta 截断，真实分数不低于此值）
    LowerBound,
    /// 上界（没有走法超过 Alpha，真实分数不高于此值）
    UpperBound,
}

/// 置换表条目
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    /// 完整的 Zobrist 哈希，用于排除索引冲突
    pub key: u64,
    /// 评估分数
    pub score: i32,
    /// 剩余搜索深度
    pub depth: i32,
    /// 分数类型
    pub bound: Bound,
    /// 最佳走法
    pub best_move: Option<Move>,
}

/// 置换表
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    /// 命中次数
    hits: AtomicU64,
    /// 查询次数
    probes: AtomicU64,
}

impl TranspositionTable {
    /// 创建指定大小的置换表
    ///
    /// # Arguments
    /// * `size_mb` - 表大小（MB），至少分配一个条目
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        let size = ((size_mb * 1024 * 1024) / entry_size).max(1);

        Self {
            entries: vec![None; size],
            hits: AtomicU64::new(0),
            probes: AtomicU64::new(0),
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    /// 查询条目
    pub fn probe(&self, hash: u64) -> Option<&TTEntry> {
        self.probes.fetch_add(1, Ordering::Relaxed);

        let entry = self.entries[self.index(hash)].as_ref()?;
        if entry.key != hash {
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    /// 存储条目
    ///
    /// 替换策略：空槽直接写入；新条目深度不低于旧条目时替换；
    /// 新条目是精确值而旧条目不是时也替换。
    pub fn store(&mut self, hash: u64, score: i32, depth: i32, bound: Bound, best_move: Option<Move>) {
        let index = self.index(hash);

        let should_replace = match &self.entries[index] {
            None => true,
            Some(existing) => {
                depth >= existing.depth
                    || (bound == Bound::Exact && existing.bound != Bound::Exact)
            }
        };

        if should_replace {
            self.entries[index] = Some(TTEntry {
                key: hash,
                score,
                depth,
                bound,
                best_move,
            });
        }
    }

    /// 清空表和统计
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.hits.store(0, Ordering::Relaxed);
        self.probes.store(0, Ordering::Relaxed);
    }

    /// 获取统计信息
    pub fn stats(&self) -> TTStats {
        TTStats {
            entries: self.entries.len(),
            used: self.entries.iter().filter(|e| e.is_some()).count(),
            hits: self.hits.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
        }
    }
}

/// 置换表统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTStats {
    pub entries: usize,
    pub used: usize,
    pub hits: u64,
    pub probes: u64,
}

impl TTStats {
    pub fn hit_rate(&self) -> f64 {
        if self.probes == 0 {
            0.0
        } else {
            self.hits as f64 / self.probes as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Position;

    fn sample_move() -> Move {
        Move::new(Position::new_unchecked(1, 2), Position::new_unchecked(4, 2))
    }

    #[test]
    fn test_tt_store_and_probe() {
        let mut tt = TranspositionTable::new(1);

        let hash = 0x1234567890ABCDEF_u64;
        tt.store(hash, 100, 5, Bound::Exact, Some(sample_move()));

        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.score, 100);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, Some(sample_move()));
        assert_eq!(tt.stats().hits, 1);
    }

    #[test]
    fn test_tt_miss_on_index_collision() {
        let mut tt = TranspositionTable::new(1);
        let size = tt.stats().entries as u64;

        tt.store(7, 1, 1, Bound::Exact, None);
        assert!(tt.probe(7 + size).is_none());
        assert_eq!(tt.stats().probes, 1);
        assert_eq!(tt.stats().hits, 0);
    }

    #[test]
    fn test_tt_replacement() {
        let mut tt = TranspositionTable::new(1);
        let hash = 0x1234567890ABCDEF_u64;

        // 更深的条目替换
        tt.store(hash, 50, 3, Bound::LowerBound, None);
        tt.store(hash, 100, 5, Bound::LowerBound, None);
        assert_eq!(tt.probe(hash).unwrap().depth, 5);

        // 更浅的非精确条目不替换
        tt.store(hash, 10, 2, Bound::UpperBound, None);
        assert_eq!(tt.probe(hash).unwrap().score, 100);

        // 更浅的精确条目替换非精确条目
        tt.store(hash, 30, 2, Bound::Exact, None);
        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.score, 30);
        assert_eq!(entry.bound, Bound::Exact);
    }

    #[test]
    fn test_clear() {
        let mut tt = TranspositionTable::new(1);
        tt.store(42, 1, 1, Bound::Exact, None);
        tt.clear();
        assert!(tt.probe(42).is_none());
        assert_eq!(tt.stats().used, 0);
        assert_eq!(tt.stats().hits, 0);
    }
}
