// 数据层
// 开发心理：数据文件的解析与热重载，以及按种族值缓存的全量排名

pub mod cache;
pub mod masterfile;
pub mod watcher;

pub use cache::{
    compute_all_ranks, CacheStatistics, CompactBucket, CompactRanking, RankCache, RankingOptions,
};
pub use masterfile::{Evolution, Form, Pokemon, PokemonData, TempEvolution};
pub use watcher::{reload_if_changed, MasterFileWatcher};
