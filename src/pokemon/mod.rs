// 宝可梦数值模块
// 开发心理：等级倍率表与能力值公式是排名引擎的最底层，全部为纯函数

pub mod cpm;
pub mod stats;

pub use cpm::{cp_multiplier, is_half_level, MAX_LEVEL, MAX_TABULATED_LEVEL, MIN_LEVEL};
pub use stats::{
    calculate_cp, calculate_hp, calculate_stat_product, effective_attack, BaseStats, Ivs,
};
