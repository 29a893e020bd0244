// PvP 排名核心
// 开发心理：求解器 -> 比较器 -> 全量排名 -> 档位合并，自底向上组合

pub mod comparator;
pub mod consolidate;
pub mod ranking;
pub mod solver;

pub use comparator::{CompareFn, RankingComparator};
pub use consolidate::{consolidate, filter_level_caps, PvpEntry};
pub use ranking::{rank_all, RankedStat, RankingBucket};
pub use solver::{evaluate, PvpStat};
