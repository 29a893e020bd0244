// 等级档位合并
// 开发心理：同一个体值在多个等级上限下的结果往往重复，按等级上限升序折叠为最少的条目
// 连续档位 (等级, 名次) 相同则合并，保留最低档位为 cap、最高档位为 cap_end
// 末条低于最大等级时标记 capped；末条恰为最大等级时与前一条重复，丢弃

use serde::{Deserialize, Serialize};

use crate::constants::PERCENTAGE_PRECISION;
use crate::pokemon::MAX_LEVEL;
use crate::pvp::ranking::round_float;
use crate::pvp::solver::PvpStat;

fn is_zero(value: &u16) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 查询结果中的一行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvpEntry {
    pub pokemon: u16,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub form: u16,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub evolution: u16,
    /// 合并区间内最低的等级上限；无上限联盟的条目为 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
    /// 合并区间内最高的等级上限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_end: Option<f64>,
    pub value: f64,
    pub level: f64,
    pub cp: u32,
    pub percentage: f64,
    pub rank: u16,
    #[serde(default, skip_serializing_if = "is_false")]
    pub capped: bool,
}

impl PvpEntry {
    /// 某个等级档位下的一行，value 向下取整，百分比按未取整的值计算
    pub fn bracket(
        pokemon: u16,
        form: u16,
        evolution: u16,
        level_cap: f64,
        stat: &PvpStat,
        rank: u16,
        top_value: f64,
    ) -> Self {
        Self {
            pokemon,
            form,
            evolution,
            cap: Some(level_cap),
            cap_end: Some(level_cap),
            value: stat.value.floor(),
            level: stat.level,
            cp: stat.cp,
            percentage: round_float(stat.value / top_value, PERCENTAGE_PRECISION),
            rank,
            capped: false,
        }
    }

    fn same_outcome(&self, other: &PvpEntry) -> bool {
        self.level == other.level && self.rank == other.rank
    }

    fn same_creature(&self, other: &PvpEntry) -> bool {
        self.pokemon == other.pokemon && self.form == other.form && self.evolution == other.evolution
    }
}

/// 折叠按等级上限升序排列的同一个体值的各档位条目
pub fn consolidate(entries: Vec<PvpEntry>) -> Vec<PvpEntry> {
    let mut result: Vec<PvpEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match result.last_mut() {
            Some(last) if last.same_outcome(&entry) => {
                last.cap_end = entry.cap_end;
            }
            _ => result.push(entry),
        }
    }

    let reaches_max = match result.last() {
        Some(last) => last.cap.map_or(false, |cap| cap >= MAX_LEVEL),
        None => return result,
    };
    if !reaches_max {
        if let Some(last) = result.last_mut() {
            last.capped = true;
        }
    } else if result.len() > 1 {
        result.pop();
    }

    result
}

/// 只保留与感兴趣的等级上限相关的条目
///
/// 条目区间 `[cap, cap_end]` 包含任一感兴趣的上限即保留；已封顶的条目只要有
/// 感兴趣的上限不低于 `cap` 也保留。无上限联盟的条目按 `level` 直接匹配。
/// 保留下来的相邻条目若属于同一宝可梦且 (等级, 名次) 相同则再次合并。
pub fn filter_level_caps(entries: &[PvpEntry], interested: &[f64]) -> Vec<PvpEntry> {
    let mut result: Vec<PvpEntry> = Vec::new();

    for entry in entries {
        let Some(cap) = entry.cap else {
            if interested.contains(&entry.level) {
                result.push(*entry);
            }
            continue;
        };
        let cap_end = entry.cap_end.unwrap_or(cap);
        let in_range = interested.iter().any(|&level| level >= cap && level <= cap_end);
        let capped_match = entry.capped && interested.iter().any(|&level| level >= cap);
        if !in_range && !capped_match {
            continue;
        }

        match result.last_mut() {
            Some(last)
                if last.cap.is_some() && last.same_creature(entry) && last.same_outcome(entry) =>
            {
                last.cap_end = entry.cap_end;
                last.capped |= entry.capped;
            }
            _ => result.push(*entry),
        }
    }

    result
}
