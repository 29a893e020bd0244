// 排名结果缓存
// 开发心理：全量排名代价高且结果只取决于 (CP上限, 种族值)，计算一次后只读共享
// 缓存值不可变，读者通过 Arc 共享，不复制；数据集更换时整体清空，从不局部失效
// 清空时递增代数，清空前开始的计算不会写回

use std::sync::{Arc, Mutex, RwLock};

use hashbrown::HashMap;
use log::{debug, info};

use crate::core::config::RankerConfig;
use crate::core::error::{PvpError, Result};
use crate::pokemon::{calculate_cp, BaseStats, Ivs, MAX_LEVEL};
use crate::pvp::{rank_all, RankingBucket, RankingComparator};
use crate::profile;

/// 单个等级上限档位的紧凑排名：名次表 + 最佳能力值乘积
#[derive(Debug, Clone, PartialEq)]
pub struct CompactBucket {
    ranks: Vec<u16>,
    top_value: f64,
}

impl CompactBucket {
    pub fn rank(&self, ivs: Ivs) -> Option<u16> {
        match self.ranks[ivs.index()] {
            0 => None,
            rank => Some(rank),
        }
    }

    pub fn ranks(&self) -> &[u16] {
        &self.ranks
    }

    pub fn top_value(&self) -> f64 {
        self.top_value
    }
}

impl From<RankingBucket> for CompactBucket {
    fn from(bucket: RankingBucket) -> Self {
        let top_value = bucket.top_value();
        Self {
            ranks: bucket.into_ranks(),
            top_value,
        }
    }
}

/// 某个 (种族值, CP上限) 在全部等级上限档位下的排名，按等级上限升序
#[derive(Debug, Clone)]
pub struct CompactRanking {
    buckets: Vec<(f64, Arc<CompactBucket>)>,
    maxed: bool,
}

impl CompactRanking {
    pub fn get(&self, level_cap: f64) -> Option<&CompactBucket> {
        self.buckets
            .iter()
            .find(|(cap, _)| *cap == level_cap)
            .map(|(_, bucket)| bucket.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &CompactBucket)> {
        self.buckets.iter().map(|(cap, bucket)| (*cap, bucket.as_ref()))
    }

    pub fn level_caps(&self) -> Vec<f64> {
        self.buckets.iter().map(|(cap, _)| *cap).collect()
    }

    /// 提前停止：更高的等级上限不会改变任何结果，最大等级档位复用最后一个档位
    pub fn is_maxed(&self) -> bool {
        self.maxed
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// 全量排名的计算参数
#[derive(Debug, Clone)]
pub struct RankingOptions {
    /// 严格升序
    pub level_caps: Vec<f64>,
    pub include_hundos_under_cap: bool,
    pub comparator: RankingComparator,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self::from(&RankerConfig::default())
    }
}

impl From<&RankerConfig> for RankingOptions {
    fn from(config: &RankerConfig) -> Self {
        let mut level_caps = config.level_caps.clone();
        level_caps.sort_by(f64::total_cmp);
        level_caps.dedup();
        Self {
            level_caps,
            include_hundos_under_cap: config.include_hundos_under_cap,
            comparator: config.comparator,
        }
    }
}

/// 按升序遍历等级上限计算各档位排名，不经过缓存
///
/// 没有任何档位产生结果时返回 `Ok(None)`。
pub fn compute_all_ranks(
    stats: &BaseStats,
    cp_cap: u32,
    options: &RankingOptions,
) -> Result<Option<CompactRanking>> {
    if cp_cap == 0 {
        return Err(PvpError::UncappedLeague);
    }
    if options.level_caps.is_empty() {
        return Err(PvpError::LevelCapsMissing);
    }

    profile!("全量排名", {
        let mut buckets: Vec<(f64, Arc<CompactBucket>)> = Vec::new();
        let mut maxed = false;

        for &level_cap in &options.level_caps {
            if !options.include_hundos_under_cap
                && calculate_cp(stats, Ivs::PERFECT, level_cap) <= cp_cap
            {
                continue;
            }

            let bucket = rank_all(stats, cp_cap, level_cap, 0, options.comparator)?;
            if bucket.is_empty() {
                // 最低等级就超过上限，任何档位都一样
                return Ok(None);
            }
            let bucket = Arc::new(CompactBucket::from(bucket));
            buckets.push((level_cap, Arc::clone(&bucket)));

            if level_cap >= MAX_LEVEL {
                maxed = true;
                break;
            }
            if calculate_cp(stats, Ivs::ZERO, level_cap + 0.5) > cp_cap {
                maxed = true;
                buckets.push((MAX_LEVEL, bucket));
                break;
            }
        }

        if buckets.is_empty() {
            return Ok(None);
        }
        if !maxed {
            let bucket = rank_all(stats, cp_cap, MAX_LEVEL, 0, options.comparator)?;
            buckets.push((MAX_LEVEL, Arc::new(CompactBucket::from(bucket))));
        }

        Ok(Some(CompactRanking { buckets, maxed }))
    })
}

// 缓存统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub stale_discards: u64,
    pub clears: u64,
    pub current_entries: usize,
}

impl CacheStatistics {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f32 / total as f32
        } else {
            0.0
        }
    }
}

struct CacheState {
    generation: u64,
    entries: HashMap<u64, Arc<CompactRanking>>,
}

/// 以 (CP上限, 种族值) 指纹为键的排名缓存
pub struct RankCache {
    state: RwLock<CacheState>,
    options: RankingOptions,
    statistics: Mutex<CacheStatistics>,
}

impl RankCache {
    pub fn new(options: RankingOptions) -> Self {
        Self {
            state: RwLock::new(CacheState {
                generation: 0,
                entries: HashMap::new(),
            }),
            options,
            statistics: Mutex::new(CacheStatistics::default()),
        }
    }

    pub fn options(&self) -> &RankingOptions {
        &self.options
    }

    /// 命中直接返回共享的排名，未命中则计算并写入
    ///
    /// 同一个键的并发未命中可能重复计算，结果相同，后写者覆盖。
    pub fn get_or_compute(&self, stats: &BaseStats, cp_cap: u32) -> Result<Option<Arc<CompactRanking>>> {
        let key = stats.fingerprint(cp_cap);

        let generation = {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ranking) = state.entries.get(&key) {
                self.record(|stats| stats.hits += 1);
                debug!("缓存命中: {}", key);
                return Ok(Some(Arc::clone(ranking)));
            }
            state.generation
        };
        self.record(|stats| stats.misses += 1);
        debug!("缓存未命中: {}", key);

        let Some(ranking) = compute_all_ranks(stats, cp_cap, &self.options)? else {
            return Ok(None);
        };
        let ranking = Arc::new(ranking);
        self.store(key, generation, Arc::clone(&ranking));
        Ok(Some(ranking))
    }

    // 只在代数未变时写入
    fn store(&self, key: u64, generation: u64, ranking: Arc<CompactRanking>) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.generation != generation {
            debug!("缓存已清空，丢弃过期结果: {}", key);
            self.record(|stats| stats.stale_discards += 1);
            return false;
        }
        state.entries.insert(key, ranking);
        let entries = state.entries.len();
        self.record(|stats| {
            stats.inserts += 1;
            stats.current_entries = entries;
        });
        true
    }

    pub fn get(&self, stats: &BaseStats, cp_cap: u32) -> Option<Arc<CompactRanking>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.entries.get(&stats.fingerprint(cp_cap)).cloned()
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.entries.clear();
        state.generation += 1;
        self.record(|stats| {
            stats.clears += 1;
            stats.current_entries = 0;
        });
        info!("排名缓存已清空");
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_statistics(&self) -> CacheStatistics {
        self.statistics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.state.read().unwrap_or_else(|e| e.into_inner()).generation
    }

    fn record(&self, update: impl FnOnce(&mut CacheStatistics)) {
        let mut stats = self.statistics.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut stats);
    }
}

impl Default for RankCache {
    fn default() -> Self {
        Self::new(RankingOptions::default())
    }
}
