// 等级求解器
// 开发心理：CP随等级单调不减，在 [最低等级, 等级上限] 的半级域上二分
// 找到CP不超过联盟上限的最高等级，再计算该等级下的能力值乘积

use serde::{Deserialize, Serialize};

use crate::core::error::{PvpError, Result};
use crate::pokemon::{
    calculate_cp, calculate_stat_product, effective_attack, is_half_level, BaseStats, Ivs,
    MIN_LEVEL,
};

/// 单个个体值组合在某个联盟/等级档位下的评估结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvpStat {
    /// 能力值乘积
    pub value: f64,
    pub level: f64,
    pub cp: u32,
    pub ivs: Ivs,
    /// 实际攻击力
    pub attack_stat: f64,
}

impl PvpStat {
    pub fn index(&self) -> usize {
        self.ivs.index()
    }
}

// 0 表示无上限
fn effective_cap(cp_cap: u32) -> u32 {
    if cp_cap == 0 {
        u32::MAX
    } else {
        cp_cap
    }
}

/// 二分求解，不做输入校验；批量排名的热路径直接调用
pub(crate) fn calculate_pvp_stat(
    stats: &BaseStats,
    ivs: Ivs,
    cp_cap: u32,
    level_cap: f64,
    min_level: f64,
) -> Result<PvpStat> {
    let cap = effective_cap(cp_cap);
    let mut best_cp = calculate_cp(stats, ivs, min_level);
    if best_cp > cap {
        return Err(PvpError::BestCpExceedsCap { cp: best_cp, cap });
    }

    let mut lowest = min_level;
    let mut highest = level_cap;
    while lowest < highest {
        let mid = (lowest + highest).ceil() / 2.0;
        let cp = calculate_cp(stats, ivs, mid);
        if cp <= cap {
            lowest = mid;
            best_cp = cp;
        } else {
            highest = mid - 0.5;
        }
    }

    Ok(PvpStat {
        value: calculate_stat_product(stats, ivs, lowest),
        level: lowest,
        cp: best_cp,
        ivs,
        attack_stat: effective_attack(stats, ivs.attack, lowest),
    })
}

/// 评估一个个体值组合：在等级上限内找到CP不超过上限的最高等级
///
/// `cp_cap` 为 0 时视为无上限。最低等级的CP已超过上限时返回
/// [`PvpError::BestCpExceedsCap`]。
pub fn evaluate(
    stats: &BaseStats,
    ivs: Ivs,
    cp_cap: u32,
    level_cap: f64,
    min_level: f64,
) -> Result<PvpStat> {
    ivs.validate(min_level)?;
    if min_level < MIN_LEVEL || !is_half_level(min_level) {
        return Err(PvpError::InvalidLevel(min_level));
    }
    if level_cap < MIN_LEVEL || !is_half_level(level_cap) {
        return Err(PvpError::InvalidLevel(level_cap));
    }
    if min_level > level_cap {
        return Err(PvpError::LevelAboveCap {
            level: min_level,
            cap: level_cap,
        });
    }
    calculate_pvp_stat(stats, ivs, cp_cap, level_cap, min_level)
}
