// 宝可梦GO PvP 个体值排名引擎入口
// 开发心理：纯计算核心(pokemon/pvp) + 缓存与数据层(data) + 编排层(ranker)
// 架构：底层模块不依赖上层，排名器只组合，不重复实现算法

pub mod core;
pub mod data;
pub mod pokemon;
pub mod pvp;
pub mod ranker;

// 重新导出常用类型
pub use crate::core::{ErrorCategory, League, PvpError, RankerConfig, Result};
pub use crate::data::{
    CacheStatistics, CompactRanking, MasterFileWatcher, PokemonData, RankCache, RankingOptions,
};
pub use crate::pokemon::{calculate_cp, calculate_hp, cp_multiplier, BaseStats, Ivs};
pub use crate::pvp::{
    consolidate, evaluate, filter_level_caps, rank_all, PvpEntry, PvpStat, RankingBucket,
    RankingComparator,
};
pub use crate::ranker::{PvpQuery, PvpRanker, TopRankEntry};

// 版本信息
pub const VERSION: &str = "0.1.0";
pub const NAME: &str = "pvprank";

pub mod constants {
    /// 个体值组合总数 (16³)
    pub const IV_COMBINATIONS: usize = crate::pokemon::Ivs::COMBINATIONS;
    pub const MAX_IV: u8 = crate::pokemon::Ivs::MAX;

    // 联盟CP上限
    pub const LITTLE_CUP_CAP: u32 = 500;
    pub const GREAT_LEAGUE_CAP: u32 = 1500;
    pub const ULTRA_LEAGUE_CAP: u32 = 2500;
    pub const MASTER_LEAGUE_CAP: u32 = 0;

    pub const DEFAULT_LEVEL_CAPS: [f64; 2] = [50.0, 51.0];

    /// 百分比保留的小数位数
    pub const PERCENTAGE_PRECISION: i32 = 5;
}

// 初始化日志，可重复调用
pub fn init() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("pvprank=info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::info!("{} v{} 初始化完成", NAME, VERSION);
    }
    Ok(())
}

// 性能分析工具
pub struct PerformanceProfiler {
    start_time: std::time::Instant,
    name: String,
}

impl PerformanceProfiler {
    pub fn new(name: &str) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Drop for PerformanceProfiler {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        if elapsed.as_millis() > 1 {
            log::debug!("性能: {} 耗时 {:.2}ms", self.name, elapsed.as_secs_f64() * 1000.0);
        }
    }
}

// 便利宏
#[macro_export]
macro_rules! profile {
    ($name:expr, $code:block) => {{
        let _profiler = $crate::PerformanceProfiler::new($name);
        $code
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init().unwrap();
        init().unwrap();
    }

    #[test]
    fn test_constants() {
        assert_eq!(constants::IV_COMBINATIONS, 4096);
        assert_eq!(constants::MAX_IV, 15);
        assert!(constants::GREAT_LEAGUE_CAP < constants::ULTRA_LEAGUE_CAP);

        let config = RankerConfig::default();
        assert_eq!(config.level_caps, constants::DEFAULT_LEVEL_CAPS.to_vec());
        assert_eq!(config.leagues["great"].cap, constants::GREAT_LEAGUE_CAP);
        assert_eq!(config.leagues["little"].cap, constants::LITTLE_CUP_CAP);
        assert_eq!(config.leagues["master"].cap, constants::MASTER_LEAGUE_CAP);
    }

    #[test]
    fn test_performance_profiler() {
        let profiler = PerformanceProfiler::new("test");
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(profiler.elapsed().as_millis() >= 1);
    }

    #[test]
    fn test_profile_macro_returns_value() {
        let value = profile!("求和", { (1..=10).sum::<u32>() });
        assert_eq!(value, 55);
    }

    #[test]
    fn test_version_info() {
        assert_eq!(VERSION, "0.1.0");
        assert_eq!(NAME, "pvprank");
    }
}
