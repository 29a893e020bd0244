/*
* 开发心理过程：
* 1. 排名引擎的配置：联盟CP上限、等级上限档位、缓存开关和比较器
* 2. 支持 TOML 和 JSON 两种文件格式，按扩展名区分
* 3. 加载后立即校验，配置错误在计算之前暴露
* 4. 等级上限统一排序去重，后续按升序遍历
*/

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use log::{debug, info};

use crate::core::error::{PvpError, Result};
use crate::pokemon::{is_half_level, MAX_LEVEL, MIN_LEVEL};
use crate::pvp::RankingComparator;

/// 单个联盟的设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    /// CP上限，0 表示无上限
    pub cap: u32,
    /// 只有可参加小小杯的宝可梦才计算此联盟
    #[serde(default)]
    pub little_cup_rules: bool,
}

impl League {
    pub const fn new(cap: u32) -> Self {
        Self {
            cap,
            little_cup_rules: false,
        }
    }

    pub const fn little(cap: u32) -> Self {
        Self {
            cap,
            little_cup_rules: true,
        }
    }

    pub fn is_uncapped(&self) -> bool {
        self.cap == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub leagues: BTreeMap<String, League>,
    pub level_caps: Vec<f64>,
    pub disable_cache: bool,
    pub include_hundos_under_cap: bool,
    pub comparator: RankingComparator,
}

impl Default for RankerConfig {
    fn default() -> Self {
        let mut leagues = BTreeMap::new();
        leagues.insert("little".to_string(), League::little(500));
        leagues.insert("great".to_string(), League::new(1500));
        leagues.insert("ultra".to_string(), League::new(2500));
        leagues.insert("master".to_string(), League::new(0));

        Self {
            leagues,
            level_caps: vec![50.0, 51.0],
            disable_cache: false,
            include_hundos_under_cap: false,
            comparator: RankingComparator::Default,
        }
    }
}

impl RankerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.leagues.is_empty() {
            return Err(PvpError::LeaguesMissing);
        }
        if self.level_caps.is_empty() {
            return Err(PvpError::LevelCapsMissing);
        }
        for &level_cap in &self.level_caps {
            if level_cap < MIN_LEVEL || level_cap > MAX_LEVEL || !is_half_level(level_cap) {
                return Err(PvpError::InvalidConfig(format!("无效的等级上限: {}", level_cap)));
            }
        }
        Ok(())
    }

    /// 校验并把等级上限整理为严格升序
    pub fn normalized(mut self) -> Result<Self> {
        self.validate()?;
        self.level_caps.sort_by(f64::total_cmp);
        self.level_caps.dedup();
        Ok(self)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PvpError::ConfigParse(format!("读取配置文件失败 {:?}: {}", path, e)))?;

        let config: RankerConfig = if is_json(path) {
            serde_json::from_str(&content)
                .map_err(|e| PvpError::ConfigParse(format!("解析配置文件失败: {}", e)))?
        } else {
            toml::from_str(&content)
                .map_err(|e| PvpError::ConfigParse(format!("解析配置文件失败: {}", e)))?
        };

        let config = config.normalized()?;
        info!("成功加载配置文件: {:?}", path);
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)
                .map_err(|e| PvpError::ConfigParse(format!("序列化配置失败: {}", e)))?
        } else {
            toml::to_string_pretty(self)
                .map_err(|e| PvpError::ConfigParse(format!("序列化配置失败: {}", e)))?
        };

        fs::write(path, content)
            .map_err(|e| PvpError::ConfigParse(format!("写入配置文件失败 {:?}: {}", path, e)))?;
        debug!("配置已保存到: {:?}", path);
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map_or(false, |extension| extension.eq_ignore_ascii_case("json"))
}
