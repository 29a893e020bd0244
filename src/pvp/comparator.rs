// 排名比较器
// 开发心理：排名规则可插拔，默认按能力值乘积降序、实际攻击降序
// 两个变体在此基础上再按CP高/低区分，比较器必须是全序

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::pvp::solver::PvpStat;

/// 三路比较：`Less` 表示 a 排在 b 前面
pub type CompareFn = fn(&PvpStat, &PvpStat) -> Ordering;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingComparator {
    /// 能力值乘积降序，相同时实际攻击降序
    #[default]
    Default,
    /// 默认规则之后CP高者优先
    PreferHigherCp,
    /// 默认规则之后CP低者优先
    PreferLowerCp,
    /// 调用方提供的比较函数
    #[serde(skip)]
    Custom(CompareFn),
}

impl RankingComparator {
    pub fn compare(&self, a: &PvpStat, b: &PvpStat) -> Ordering {
        match self {
            RankingComparator::Default => compare_default(a, b),
            RankingComparator::PreferHigherCp => {
                compare_default(a, b).then_with(|| b.cp.cmp(&a.cp))
            }
            RankingComparator::PreferLowerCp => compare_default(a, b).then_with(|| a.cp.cmp(&b.cp)),
            RankingComparator::Custom(compare) => compare(a, b),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RankingComparator::Default => "default",
            RankingComparator::PreferHigherCp => "prefer_higher_cp",
            RankingComparator::PreferLowerCp => "prefer_lower_cp",
            RankingComparator::Custom(_) => "custom",
        }
    }
}

fn compare_default(a: &PvpStat, b: &PvpStat) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| b.attack_stat.total_cmp(&a.attack_stat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::Ivs;

    fn stat(value: f64, attack_stat: f64, cp: u32) -> PvpStat {
        PvpStat {
            value,
            level: 20.0,
            cp,
            ivs: Ivs::ZERO,
            attack_stat,
        }
    }

    #[test]
    fn test_default_orders_by_value_then_attack() {
        let comparator = RankingComparator::Default;
        assert_eq!(comparator.compare(&stat(2.0, 1.0, 10), &stat(1.0, 5.0, 10)), Ordering::Less);
        assert_eq!(comparator.compare(&stat(1.0, 5.0, 10), &stat(1.0, 4.0, 10)), Ordering::Less);
        assert_eq!(comparator.compare(&stat(1.0, 4.0, 10), &stat(1.0, 4.0, 99)), Ordering::Equal);
    }

    #[test]
    fn test_cp_variants() {
        let high = stat(1.0, 4.0, 500);
        let low = stat(1.0, 4.0, 490);

        assert_eq!(RankingComparator::PreferHigherCp.compare(&high, &low), Ordering::Less);
        assert_eq!(RankingComparator::PreferLowerCp.compare(&high, &low), Ordering::Greater);
        // 主排序键不受变体影响
        assert_eq!(
            RankingComparator::PreferLowerCp.compare(&stat(2.0, 0.0, 500), &low),
            Ordering::Less
        );
    }

    #[test]
    fn test_custom_comparator() {
        fn by_cp(a: &PvpStat, b: &PvpStat) -> Ordering {
            b.cp.cmp(&a.cp)
        }
        let comparator = RankingComparator::Custom(by_cp);
        assert_eq!(comparator.compare(&stat(1.0, 1.0, 600), &stat(9.0, 9.0, 500)), Ordering::Less);
        assert_eq!(comparator.name(), "custom");
    }

    #[test]
    fn test_comparator_serde_names() {
        let parsed: RankingComparator = serde_json::from_str("\"prefer_lower_cp\"").unwrap();
        assert_eq!(parsed.name(), "prefer_lower_cp");
        assert_eq!(serde_json::to_string(&RankingComparator::Default).unwrap(), "\"default\"");
    }
}
