// PvP 排名查询入口
// 开发心理：持有配置、数据集快照和排名缓存，把核心算法组合成面向调用方的查询
// 数据集以 Arc 快照形式替换，替换与清空缓存在同一把写锁下完成
// 查询会沿进化链递归，同时处理性别限定、服装锁进化、无畏小子个体值规则和地区形态

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::config::{League, RankerConfig};
use crate::core::error::{PvpError, Result};
use crate::data::cache::{compute_all_ranks, CompactRanking, RankCache, RankingOptions};
use crate::data::masterfile::{Form, PokemonData};
use crate::pokemon::{
    calculate_cp, calculate_hp, calculate_stat_product, is_half_level, BaseStats, Ivs, MAX_LEVEL,
    MIN_LEVEL,
};
use crate::pvp::{consolidate, evaluate, rank_all, PvpEntry};

lazy_static! {
    // 进化时可以选择的地区形态
    static ref REGIONAL_EVOLUTION_FORMS: HashMap<u16, u16> = {
        let mut forms = HashMap::new();
        forms.insert(26, 50); // 阿罗拉雷丘
        forms.insert(103, 78); // 阿罗拉椰蛋树
        forms.insert(105, 80); // 阿罗拉嘎啦嘎啦
        forms.insert(110, 944); // 伽勒尔双弹瓦斯
        forms
    };
}

// 无畏小子的进化方向由最高的个体值决定
fn tyrogue_allows(evolution: u16, ivs: Ivs) -> bool {
    match evolution {
        106 => ivs.attack >= ivs.defense && ivs.attack >= ivs.stamina,
        107 => ivs.defense >= ivs.attack && ivs.defense >= ivs.stamina,
        237 => ivs.stamina >= ivs.attack && ivs.stamina >= ivs.defense,
        _ => true,
    }
}

/// 单只宝可梦的查询参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvpQuery {
    pub pokemon: u16,
    #[serde(default)]
    pub form: u16,
    #[serde(default)]
    pub costume: u16,
    #[serde(default)]
    pub gender: u8,
    pub ivs: Ivs,
    pub level: f64,
}

impl PvpQuery {
    pub fn new(pokemon: u16, ivs: Ivs, level: f64) -> Self {
        Self {
            pokemon,
            form: 0,
            costume: 0,
            gender: 0,
            ivs,
            level,
        }
    }

    pub fn with_form(mut self, form: u16) -> Self {
        self.form = form;
        self
    }

    pub fn with_costume(mut self, costume: u16) -> Self {
        self.costume = costume;
        self
    }

    pub fn with_gender(mut self, gender: u8) -> Self {
        self.gender = gender;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.ivs.is_valid() || self.level < MIN_LEVEL {
            return Err(PvpError::InputOutOfRange {
                attack: self.ivs.attack,
                defense: self.ivs.defense,
                stamina: self.ivs.stamina,
                level: self.level,
            });
        }
        if !is_half_level(self.level) {
            return Err(PvpError::InvalidLevel(self.level));
        }
        Ok(())
    }
}

/// 排行榜中的一行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopRankEntry {
    #[serde(flatten)]
    pub ivs: Ivs,
    pub value: f64,
    pub level: f64,
    pub cp: u32,
    pub percentage: f64,
    pub rank: u16,
    /// 产生这一行的等级上限
    pub cap: f64,
    #[serde(default)]
    pub capped: bool,
}

pub struct PvpRanker {
    config: RankerConfig,
    data: RwLock<Option<Arc<PokemonData>>>,
    cache: RankCache,
}

impl PvpRanker {
    pub fn new(config: RankerConfig) -> Result<Self> {
        let config = config.normalized()?;
        let cache = RankCache::new(RankingOptions::from(&config));
        Ok(Self {
            config,
            data: RwLock::new(None),
            cache,
        })
    }

    pub fn with_data(config: RankerConfig, data: PokemonData) -> Result<Self> {
        let ranker = Self::new(config)?;
        ranker.replace_pokemon_data(data);
        Ok(ranker)
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub fn cache(&self) -> &RankCache {
        &self.cache
    }

    pub fn load_pokemon_data(&self, path: &Path) -> Result<()> {
        let data = PokemonData::load(path)?;
        self.replace_pokemon_data(data);
        Ok(())
    }

    pub fn save_pokemon_data(&self, path: &Path) -> Result<()> {
        self.snapshot()?.save(path)
    }

    /// 替换数据集并清空缓存，两步在同一把写锁下完成
    pub fn replace_pokemon_data(&self, data: PokemonData) {
        let mut guard = self.data.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(data));
        self.cache.clear();
        info!("数据集已替换");
    }

    pub fn pokemon_data(&self) -> Option<Arc<PokemonData>> {
        self.data.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn snapshot(&self) -> Result<Arc<PokemonData>> {
        self.pokemon_data().ok_or(PvpError::MasterFileUnloaded)
    }

    /// 全部等级上限档位的紧凑排名，按配置决定是否经过缓存
    pub fn calculate_all_ranks_compact(
        &self,
        stats: &BaseStats,
        cp_cap: u32,
    ) -> Result<Option<Arc<CompactRanking>>> {
        if self.config.disable_cache {
            Ok(compute_all_ranks(stats, cp_cap, self.cache.options())?.map(Arc::new))
        } else {
            self.cache.get_or_compute(stats, cp_cap)
        }
    }

    pub fn calculate_cp(
        &self,
        pokemon: u16,
        form: u16,
        evolution: u16,
        ivs: Ivs,
        level: f64,
    ) -> Result<u32> {
        ivs.validate(level)?;
        if level < MIN_LEVEL || !is_half_level(level) {
            return Err(PvpError::InvalidLevel(level));
        }
        let stats = self.find_base_stats(pokemon, form, evolution)?;
        Ok(calculate_cp(&stats, ivs, level))
    }

    pub fn find_base_stats(&self, pokemon: u16, form: u16, evolution: u16) -> Result<BaseStats> {
        self.snapshot()?.resolve_base_stats(pokemon, form, evolution)
    }

    /// 超级进化的种族值是否仍为推测值
    pub fn is_mega_unreleased(&self, pokemon: u16, evolution: u16) -> Result<bool> {
        let data = self.snapshot()?;
        Ok(data
            .pokemon
            .get(&pokemon)
            .and_then(|master| master.temp_evolutions.get(&evolution))
            .map_or(false, |temp| temp.unreleased))
    }

    /// 查询一只宝可梦及其全部可能进化在各联盟中的排名
    pub fn query_pvp_rank(&self, query: &PvpQuery) -> Result<BTreeMap<String, Vec<PvpEntry>>> {
        let data = self.snapshot()?;
        query.validate()?;

        let mut result = BTreeMap::new();
        let mut visited = HashSet::new();
        self.query_recursive(&data, query.pokemon, query.form, query, &mut visited, &mut result)?;
        Ok(result)
    }

    fn query_recursive(
        &self,
        data: &PokemonData,
        pokemon: u16,
        form: u16,
        query: &PvpQuery,
        visited: &mut HashSet<(u16, u16)>,
        result: &mut BTreeMap<String, Vec<PvpEntry>>,
    ) -> Result<()> {
        // 数据文件中的进化环只展开一次
        if !visited.insert((pokemon, form)) {
            warn!("进化链重复访问 {}/{}，已跳过", pokemon, form);
            return Ok(());
        }
        let master = data.get(pokemon)?;
        let master_form = master.resolve_form(form);
        let entry_form = if master.form(form).is_some() { form } else { 0 };
        let little = master_form.little || master.little;

        let stats = master_form.base_stats().unwrap_or_else(|| master.base_stats());
        let target = EntryTarget {
            pokemon,
            form: entry_form,
            evolution: 0,
            little,
        };
        self.push_all_entries(&stats, target, query, result)?;

        if self.can_evolve(data, &master_form, query.costume) {
            for evolution in &master_form.evolutions {
                if !tyrogue_allows(evolution.pokemon, query.ivs) {
                    continue;
                }
                if evolution.gender_requirement != 0 && query.gender != evolution.gender_requirement {
                    continue;
                }

                let mut forms = vec![evolution.form];
                if let Some(&regional) = REGIONAL_EVOLUTION_FORMS.get(&evolution.pokemon) {
                    if regional != evolution.form {
                        forms.push(regional);
                    }
                }
                for evolved_form in forms {
                    let evolved = self.query_recursive(
                        data,
                        evolution.pokemon,
                        evolved_form,
                        query,
                        visited,
                        result,
                    );
                    match evolved {
                        Err(PvpError::MissingPokemon(missing)) => {
                            warn!("进化目标 {} 不在数据文件中，已跳过", missing);
                        }
                        other => other?,
                    }
                }
            }
        }

        let mut temp_evolutions: Vec<u16> = master_form.temp_evolutions.keys().copied().collect();
        temp_evolutions.sort_unstable();
        for evolution in temp_evolutions {
            let Some(stats) = master.temp_evolution_stats(&master_form, evolution) else {
                continue;
            };
            let target = EntryTarget {
                evolution,
                ..target
            };
            self.push_all_entries(&stats, target, query, result)?;
        }

        Ok(())
    }

    fn can_evolve(&self, data: &PokemonData, form: &Form, costume: u16) -> bool {
        costume == 0
            || !data.costume_locks_evolution(costume)
            || form.costume_override_evos.contains(&costume)
    }

    fn push_all_entries(
        &self,
        stats: &BaseStats,
        target: EntryTarget,
        query: &PvpQuery,
        result: &mut BTreeMap<String, Vec<PvpEntry>>,
    ) -> Result<()> {
        for (name, league) in &self.config.leagues {
            let entries = if league.is_uncapped() {
                self.functionally_perfect_entries(stats, target, query)
            } else {
                if league.little_cup_rules && !target.little {
                    continue;
                }
                self.capped_league_entries(stats, league, target, query)?
            };

            if !entries.is_empty() {
                result.entry(name.clone()).or_default().extend(entries);
            }
        }
        Ok(())
    }

    fn capped_league_entries(
        &self,
        stats: &BaseStats,
        league: &League,
        target: EntryTarget,
        query: &PvpQuery,
    ) -> Result<Vec<PvpEntry>> {
        let Some(ranking) = self.calculate_all_ranks_compact(stats, league.cap)? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(ranking.len());
        for (level_cap, bucket) in ranking.iter() {
            let stat = match evaluate(stats, query.ivs, league.cap, level_cap, query.level) {
                Ok(stat) => stat,
                Err(e) if e.is_infeasible() => continue,
                Err(e) => return Err(e),
            };
            let Some(rank) = bucket.rank(query.ivs) else {
                continue;
            };
            entries.push(PvpEntry::bracket(
                target.pokemon,
                target.form,
                target.evolution,
                level_cap,
                &stat,
                rank,
                bucket.top_value(),
            ));
        }
        Ok(consolidate(entries))
    }

    // 无上限联盟：15/15/x 且 HP 与 15/15/15 相同的组合视为满分
    fn functionally_perfect_entries(
        &self,
        stats: &BaseStats,
        target: EntryTarget,
        query: &PvpQuery,
    ) -> Vec<PvpEntry> {
        let ivs = query.ivs;
        let candidate = ivs.attack == Ivs::MAX && ivs.defense == Ivs::MAX && ivs.stamina < Ivs::MAX;
        if target.evolution != 0 || !candidate {
            return Vec::new();
        }

        self.config
            .level_caps
            .iter()
            .filter(|&&level_cap| {
                calculate_hp(stats, ivs.stamina, level_cap) == calculate_hp(stats, Ivs::MAX, level_cap)
            })
            .map(|&level_cap| PvpEntry {
                pokemon: target.pokemon,
                form: target.form,
                evolution: target.evolution,
                cap: None,
                cap_end: None,
                value: calculate_stat_product(stats, ivs, level_cap).floor(),
                level: level_cap,
                cp: calculate_cp(stats, ivs, level_cap),
                percentage: 1.0,
                rank: 1,
                capped: false,
            })
            .collect()
    }

    /// 各联盟中名次不超过 `max_rank` 的个体值组合
    ///
    /// 按等级上限升序逐档生成；同一组合在更高档位 (等级, 名次) 不变时不重复列出，
    /// 而是在确认后续档位不再改变结果时标记为 capped。
    pub fn calculate_top_ranks(
        &self,
        max_rank: u16,
        pokemon: u16,
        form: u16,
        evolution: u16,
        iv_floor: u8,
    ) -> Result<BTreeMap<String, Vec<TopRankEntry>>> {
        let data = self.snapshot()?;
        if iv_floor > Ivs::MAX {
            return Err(PvpError::InvalidIvFloor(iv_floor));
        }

        let master = data.get(pokemon)?;
        let master_form = master.resolve_form(form);
        let little = master_form.little || master.little;
        let stats = data.resolve_base_stats(pokemon, form, evolution)?;

        let mut result = BTreeMap::new();
        for (name, league) in &self.config.leagues {
            if league.little_cup_rules && !little {
                continue;
            }
            let rows = if league.is_uncapped() {
                self.perfect_top_rows(&stats, iv_floor)
            } else {
                self.capped_top_rows(&stats, league.cap, max_rank, iv_floor)?
            };
            if !rows.is_empty() {
                result.insert(name.clone(), rows);
            }
        }
        Ok(result)
    }

    fn perfect_top_rows(&self, stats: &BaseStats, iv_floor: u8) -> Vec<TopRankEntry> {
        let mut rows = Vec::new();
        for &level_cap in &self.config.level_caps {
            let max_hp = calculate_hp(stats, Ivs::MAX, level_cap);
            for stamina in iv_floor..=Ivs::MAX {
                if calculate_hp(stats, stamina, level_cap) != max_hp {
                    continue;
                }
                let ivs = Ivs::new(Ivs::MAX, Ivs::MAX, stamina);
                rows.push(TopRankEntry {
                    ivs,
                    value: calculate_stat_product(stats, ivs, level_cap).floor(),
                    level: level_cap,
                    cp: calculate_cp(stats, ivs, level_cap),
                    percentage: 1.0,
                    rank: 1,
                    cap: level_cap,
                    capped: false,
                });
            }
        }
        rows
    }

    fn capped_top_rows(
        &self,
        stats: &BaseStats,
        cp_cap: u32,
        max_rank: u16,
        iv_floor: u8,
    ) -> Result<Vec<TopRankEntry>> {
        let mut rows: Vec<TopRankEntry> = Vec::new();
        // 个体值打包索引 -> 该组合最近一行的位置
        let mut latest: HashMap<usize, usize> = HashMap::new();
        let mut maxed = false;

        // 返回本档位中仍在榜上的行的位置
        let mut process = |rows: &mut Vec<TopRankEntry>,
                           level_cap: f64,
                           duplicates_only: bool|
         -> Result<Vec<usize>> {
            let bucket = rank_all(stats, cp_cap, level_cap, iv_floor, self.config.comparator)?;
            let mut touched = Vec::new();
            for entry in bucket.sorted() {
                if entry.rank > max_rank {
                    break;
                }
                let index = entry.stat.index();
                if let Some(&position) = latest.get(&index) {
                    let row = &rows[position];
                    if row.level == entry.stat.level && row.rank == entry.rank {
                        touched.push(position);
                        continue;
                    }
                }
                if duplicates_only {
                    continue;
                }
                rows.push(TopRankEntry {
                    ivs: entry.stat.ivs,
                    value: entry.stat.value.floor(),
                    level: entry.stat.level,
                    cp: entry.stat.cp,
                    percentage: entry.percentage,
                    rank: entry.rank,
                    cap: level_cap,
                    capped: false,
                });
                latest.insert(index, rows.len() - 1);
                touched.push(rows.len() - 1);
            }
            Ok(touched)
        };

        let floor = Ivs::uniform(iv_floor);
        for &level_cap in &self.config.level_caps {
            if !self.config.include_hundos_under_cap
                && calculate_cp(stats, Ivs::PERFECT, level_cap) <= cp_cap
            {
                continue;
            }
            let touched = process(&mut rows, level_cap, false)?;
            if calculate_cp(stats, floor, level_cap + 0.5) > cp_cap {
                maxed = true;
                for position in touched {
                    rows[position].capped = true;
                }
                break;
            }
        }
        if !rows.is_empty() && !maxed {
            for position in process(&mut rows, MAX_LEVEL, true)? {
                rows[position].capped = true;
            }
        }

        debug!("排行榜生成完成: CP上限 {}, 共 {} 行", cp_cap, rows.len());
        Ok(rows)
    }
}

#[derive(Debug, Clone, Copy)]
struct EntryTarget {
    pokemon: u16,
    form: u16,
    evolution: u16,
    little: bool,
}
