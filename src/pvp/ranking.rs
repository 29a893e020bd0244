// 全量个体值排名
// 开发心理：枚举全部个体值组合，逐个求解等级后排序并计算竞赛排名
// 排序在比较器相等时按打包索引升序，保证结果与平台排序实现无关
// 竞赛排名：名次 = 1 + 严格优于自己的组合数，并列共享名次

use std::cmp::Ordering;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::PERCENTAGE_PRECISION;
use crate::core::error::{PvpError, Result};
use crate::pokemon::{is_half_level, BaseStats, Ivs, MIN_LEVEL};
use crate::pvp::comparator::RankingComparator;
use crate::pvp::solver::{calculate_pvp_stat, PvpStat};

/// 排序后的单个组合：评估结果 + 名次 + 百分比
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedStat {
    #[serde(flatten)]
    pub stat: PvpStat,
    pub rank: u16,
    /// 能力值乘积 / 该档位最佳能力值乘积，保留5位小数
    pub percentage: f64,
}

/// 某个 (种族值, CP上限, 等级上限) 的完整排名
#[derive(Debug, Clone)]
pub struct RankingBucket {
    level_cap: f64,
    // 按打包索引寻址，0 表示该组合不存在
    ranks: Vec<u16>,
    sorted: Vec<RankedStat>,
    top_value: f64,
}

impl RankingBucket {
    pub fn level_cap(&self) -> f64 {
        self.level_cap
    }

    /// 组合的名次；不可行或低于个体值下限时为 None
    pub fn rank(&self, ivs: Ivs) -> Option<u16> {
        match self.ranks[ivs.index()] {
            0 => None,
            rank => Some(rank),
        }
    }

    pub fn ranks(&self) -> &[u16] {
        &self.ranks
    }

    pub fn sorted(&self) -> &[RankedStat] {
        &self.sorted
    }

    pub fn entry(&self, ivs: Ivs) -> Option<&RankedStat> {
        self.sorted.iter().find(|entry| entry.stat.ivs == ivs)
    }

    pub fn top_value(&self) -> f64 {
        self.top_value
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn into_ranks(self) -> Vec<u16> {
        self.ranks
    }
}

pub(crate) fn round_float(value: f64, precision: i32) -> f64 {
    let ratio = 10f64.powi(precision);
    (value * ratio).round() / ratio
}

/// 对 [iv_floor, 15]³ 内的全部组合求解并排名
///
/// 最低等级CP就超过上限的组合直接略去。`cp_cap` 为 0 时视为无上限。
pub fn rank_all(
    stats: &BaseStats,
    cp_cap: u32,
    level_cap: f64,
    iv_floor: u8,
    comparator: RankingComparator,
) -> Result<RankingBucket> {
    if iv_floor > Ivs::MAX {
        return Err(PvpError::InvalidIvFloor(iv_floor));
    }
    if level_cap < MIN_LEVEL || !is_half_level(level_cap) {
        return Err(PvpError::InvalidLevel(level_cap));
    }

    let mut evaluated: Vec<PvpStat> = (0..Ivs::COMBINATIONS)
        .into_par_iter()
        .map(Ivs::from_index)
        .filter(|ivs| ivs.attack >= iv_floor && ivs.defense >= iv_floor && ivs.stamina >= iv_floor)
        .filter_map(|ivs| calculate_pvp_stat(stats, ivs, cp_cap, level_cap, MIN_LEVEL).ok())
        .collect();

    evaluated.sort_unstable_by(|a, b| {
        comparator
            .compare(a, b)
            .then_with(|| a.index().cmp(&b.index()))
    });

    let top_value = evaluated.first().map_or(0.0, |best| best.value);
    let mut ranks = vec![0u16; Ivs::COMBINATIONS];
    let mut sorted = Vec::with_capacity(evaluated.len());
    let mut group_start = 0;

    for (position, stat) in evaluated.iter().enumerate() {
        if comparator.compare(&evaluated[group_start], stat) != Ordering::Equal {
            group_start = position;
        }
        let rank = (group_start + 1) as u16;
        ranks[stat.index()] = rank;
        sorted.push(RankedStat {
            stat: *stat,
            rank,
            percentage: round_float(stat.value / top_value, PERCENTAGE_PRECISION),
        });
    }

    debug!(
        "排名完成: 种族值 {:?}, CP上限 {}, 等级上限 {}, 有效组合 {}",
        stats,
        cp_cap,
        level_cap,
        sorted.len()
    );

    Ok(RankingBucket {
        level_cap,
        ranks,
        sorted,
        top_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU: BaseStats = BaseStats::new(112, 96, 111);
    const ELGYEM: BaseStats = BaseStats::new(148, 100, 146);

    fn ranked(stats: &BaseStats, cp_cap: u32, level_cap: f64, iv_floor: u8) -> RankingBucket {
        rank_all(stats, cp_cap, level_cap, iv_floor, RankingComparator::Default).unwrap()
    }

    #[test]
    fn test_combination_entries() {
        let cases = [
            (PIKACHU, Ivs::ZERO, 439598.41793819424, 29.0, 598, 0.92505, 1994),
            (PIKACHU, Ivs::new(15, 0, 0), 410559.4224700931, 25.5, 596, 0.86395, 4089),
            (PIKACHU, Ivs::new(15, 15, 0), 419733.0878105161, 23.5, 591, 0.88325, 3924),
            (PIKACHU, Ivs::PERFECT, 431674.6163042061, 22.0, 589, 0.90838, 2984),
            (ELGYEM, Ivs::ZERO, 405531.30261898035, 18.5, 590, 0.9177, 2959),
            (ELGYEM, Ivs::new(15, 0, 0), 395597.85979182937, 17.0, 597, 0.89522, 3886),
            (ELGYEM, Ivs::new(15, 15, 0), 394072.0167082542, 15.5, 584, 0.89177, 3951),
            (ELGYEM, Ivs::PERFECT, 416491.5778971401, 15.0, 593, 0.9425, 1315),
        ];

        for (stats, ivs, value, level, cp, percentage, rank) in cases {
            let bucket = ranked(&stats, 600, 30.0, 0);
            let entry = bucket.entry(ivs).unwrap();
            assert_eq!(entry.stat.value, value, "{:?} {}", stats, ivs);
            assert_eq!(entry.stat.level, level);
            assert_eq!(entry.stat.cp, cp);
            assert_eq!(entry.percentage, percentage);
            assert_eq!(entry.rank, rank);
            assert_eq!(bucket.rank(ivs), Some(rank));
        }
    }

    #[test]
    fn test_sorted_entries() {
        let cases = [
            (PIKACHU, 100, 10.0, 0, 32189.76897186037, 4.5, 100, 1.0, 1),
            (PIKACHU, 100, 10.0, 4095, 23253.65960055367, 4.0, 88, 0.72239, 4096),
            (PIKACHU, 600, 30.0, 1, 472634.34117978957, 26.0, 600, 0.99457, 2),
            (PIKACHU, 600, 30.0, 100, 461712.0022201541, 26.5, 600, 0.97159, 101),
            (PIKACHU, 600, 30.0, 4095, 406700.0985435657, 25.0, 590, 0.85582, 4096),
            (ELGYEM, 100, 10.0, 0, 29115.735973629493, 3.0, 100, 1.0, 1),
            (ELGYEM, 100, 10.0, 4095, 20145.311247780945, 2.5, 80, 0.6919, 4096),
            (ELGYEM, 600, 30.0, 0, 441901.18212997954, 16.5, 600, 1.0, 1),
            (ELGYEM, 600, 30.0, 4095, 382959.52940267365, 16.5, 584, 0.86662, 4096),
        ];

        for (stats, cp_cap, level_cap, position, value, level, cp, percentage, rank) in cases {
            let bucket = ranked(&stats, cp_cap, level_cap, 0);
            let entry = &bucket.sorted()[position];
            assert_eq!(entry.stat.value, value, "{:?} {} #{}", stats, cp_cap, position);
            assert_eq!(entry.stat.level, level);
            assert_eq!(entry.stat.cp, cp);
            assert_eq!(entry.percentage, percentage);
            assert_eq!(entry.rank, rank);
        }
    }

    #[test]
    fn test_iv_floor_and_infeasible_spreads() {
        let bucket = ranked(&PIKACHU, 40, 1.0, 0);
        assert_eq!(bucket.rank(Ivs::ZERO), Some(4090));
        assert_eq!(bucket.ranks()[454], 3237);

        let bucket = ranked(&PIKACHU, 40, 1.0, 1);
        assert_eq!(bucket.ranks()[272], 0);
        assert_eq!(bucket.ranks()[273], 3370);
        assert_eq!(bucket.ranks()[279], 2983);
        let best = &bucket.sorted()[0];
        assert_eq!((best.stat.value, best.stat.level, best.stat.cp), (1370.171918167975, 1.0, 12));
        assert_eq!(best.stat.index(), 4087);
    }

    #[test]
    fn test_iv_floor_great_league() {
        let bucket = ranked(&PIKACHU, 1500, 30.0, 1);
        assert_eq!(bucket.len(), 15 * 15 * 15);
        assert_eq!(bucket.ranks()[1500], 770);
        assert_eq!(bucket.ranks()[2500], 1346);
        assert_eq!(bucket.ranks()[3500], 311);

        let sorted = bucket.sorted();
        assert_eq!((sorted[0].stat.value, sorted[0].stat.index()), (694353.519051347, 4095));
        assert_eq!((sorted[15].stat.value, sorted[15].stat.index()), (675259.5521701364, 3822));
        assert_eq!((sorted[2547].stat.value, sorted[2547].stat.index()), (549931.3021919342, 349));
    }

    #[test]
    fn test_competition_ranking_properties() {
        let comparator = RankingComparator::Default;
        let bucket = ranked(&ELGYEM, 1500, 50.0, 0);
        let sorted = bucket.sorted();

        assert_eq!(sorted[0].rank, 1);
        assert_eq!(sorted[0].percentage, 1.0);
        for (position, entry) in sorted.iter().enumerate() {
            let better = sorted[..position]
                .iter()
                .filter(|other| comparator.compare(&other.stat, &entry.stat) == Ordering::Less)
                .count();
            assert_eq!(entry.rank as usize, better + 1);
            assert!(entry.percentage > 0.0 && entry.percentage <= 1.0);
            if position > 0 {
                assert!(sorted[position - 1].rank <= entry.rank);
            }
            assert_eq!(bucket.ranks()[entry.stat.index()], entry.rank);
        }
    }

    #[test]
    fn test_ties_share_rank() {
        // 高CP联盟中所有组合都达到等级上限，乘积相同的组合并列
        let bucket = ranked(&PIKACHU, 5000, 40.0, 0);
        let sorted = bucket.sorted();
        let ties = sorted
            .windows(2)
            .filter(|pair| RankingComparator::Default.compare(&pair[0].stat, &pair[1].stat) == Ordering::Equal)
            .count();
        for pair in sorted.windows(2) {
            if RankingComparator::Default.compare(&pair[0].stat, &pair[1].stat) == Ordering::Equal {
                assert_eq!(pair[0].rank, pair[1].rank);
                assert!(pair[0].stat.index() < pair[1].stat.index());
            }
        }
        // HP 向下取整使不同耐力值得到相同乘积
        assert_eq!(ties, 847);
        assert_eq!(sorted.len(), 4096);
        assert_eq!(sorted[0].stat.ivs, Ivs::PERFECT);
    }

    #[test]
    fn test_cp_variants_break_ties() {
        // 15/15/3 与 15/15/4 乘积与攻击力相同，只有CP不同
        let low = Ivs::new(15, 15, 3).index();
        let high = Ivs::new(15, 15, 4).index();

        let bucket = ranked(&PIKACHU, 5000, 40.0, 0);
        assert_eq!((bucket.ranks()[low], bucket.ranks()[high]), (349, 349));
        assert_eq!(bucket.sorted()[348].stat.index(), low);
        assert_eq!(bucket.sorted()[349].stat.index(), high);

        let bucket = rank_all(&PIKACHU, 5000, 40.0, 0, RankingComparator::PreferHigherCp).unwrap();
        assert_eq!((bucket.ranks()[low], bucket.ranks()[high]), (350, 349));
        let (first, second) = (&bucket.sorted()[348], &bucket.sorted()[349]);
        assert_eq!((first.stat.index(), first.stat.cp), (high, 896));
        assert_eq!((second.stat.index(), second.stat.cp), (low, 892));

        let bucket = rank_all(&PIKACHU, 5000, 40.0, 0, RankingComparator::PreferLowerCp).unwrap();
        assert_eq!((bucket.ranks()[low], bucket.ranks()[high]), (349, 350));
        let (first, second) = (&bucket.sorted()[348], &bucket.sorted()[349]);
        assert_eq!((first.stat.index(), first.stat.cp), (low, 892));
        assert_eq!((second.stat.index(), second.stat.cp), (high, 896));
    }

    #[test]
    fn test_deterministic() {
        let first = ranked(&ELGYEM, 500, 50.0, 0);
        let second = ranked(&ELGYEM, 500, 50.0, 0);
        assert_eq!(first.ranks(), second.ranks());
        assert_eq!(first.sorted(), second.sorted());
        assert_eq!(first.top_value(), 337248.95363088587);
    }

    #[test]
    fn test_nothing_fits_under_cap() {
        let bucket = ranked(&ELGYEM, 10, 50.0, 0);
        assert!(bucket.is_empty());
        assert_eq!(bucket.top_value(), 0.0);
        assert!(bucket.ranks().iter().all(|&rank| rank == 0));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            rank_all(&PIKACHU, 1500, 50.0, 16, RankingComparator::Default),
            Err(PvpError::InvalidIvFloor(16))
        ));
        assert!(matches!(
            rank_all(&PIKACHU, 1500, 0.0, 0, RankingComparator::Default),
            Err(PvpError::InvalidLevel(_))
        ));
    }
}
