// 宝可梦数据文件
// 开发心理：种族值、形态、进化和超级进化的只读数据集，JSON 格式读写
// 形态缺少种族值时沿用宝可梦本身的种族值，超级进化同理

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::error::{PvpError, Result};
use crate::pokemon::BaseStats;

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evolution {
    pub pokemon: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub form: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub gender_requirement: u8,
}

/// 超级进化等临时进化的种族值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempEvolution {
    #[serde(default, skip_serializing_if = "is_default")]
    pub attack: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub defense: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub stamina: u16,
    /// 种族值为推测值，尚未正式实装
    #[serde(default, skip_serializing_if = "is_default")]
    pub unreleased: bool,
}

impl TempEvolution {
    pub fn base_stats(&self) -> Option<BaseStats> {
        (self.attack != 0).then(|| BaseStats::new(self.attack, self.defense, self.stamina))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default, skip_serializing_if = "is_default")]
    pub attack: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub defense: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub stamina: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub little: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evolutions: Vec<Evolution>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub temp_evolutions: HashMap<u16, TempEvolution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub costume_override_evos: Vec<u16>,
}

impl Form {
    pub fn base_stats(&self) -> Option<BaseStats> {
        (self.attack != 0).then(|| BaseStats::new(self.attack, self.defense, self.stamina))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub attack: u16,
    pub defense: u16,
    pub stamina: u16,
    #[serde(default, skip_serializing_if = "is_default")]
    pub little: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evolutions: Vec<Evolution>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub temp_evolutions: HashMap<u16, TempEvolution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub costume_override_evos: Vec<u16>,
    #[serde(default)]
    pub forms: HashMap<u16, Form>,
}

impl Pokemon {
    pub fn base_stats(&self) -> BaseStats {
        BaseStats::new(self.attack, self.defense, self.stamina)
    }

    /// 形态 0 或不存在的形态视为宝可梦本身
    pub fn form(&self, form: u16) -> Option<&Form> {
        if form == 0 {
            None
        } else {
            self.forms.get(&form)
        }
    }

    /// 查询用的形态视图：存在该形态时取形态数据，否则由宝可梦本身的数据构造
    pub fn resolve_form(&self, form: u16) -> Cow<'_, Form> {
        match self.form(form) {
            Some(found) => Cow::Borrowed(found),
            None => Cow::Owned(Form {
                attack: self.attack,
                defense: self.defense,
                stamina: self.stamina,
                little: self.little,
                evolutions: self.evolutions.clone(),
                temp_evolutions: self.temp_evolutions.clone(),
                costume_override_evos: self.costume_override_evos.clone(),
            }),
        }
    }

    /// 临时进化的种族值，形态上没有时回退到宝可梦本身
    pub fn temp_evolution_stats(&self, form: &Form, evolution: u16) -> Option<BaseStats> {
        form.temp_evolutions
            .get(&evolution)
            .and_then(TempEvolution::base_stats)
            .or_else(|| self.temp_evolutions.get(&evolution).and_then(TempEvolution::base_stats))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonData {
    pub pokemon: HashMap<u16, Pokemon>,
    /// 服装 ID -> 是否禁止进化
    #[serde(default)]
    pub costumes: HashMap<u16, bool>,
}

impl PokemonData {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(PvpError::MasterFileOpen)?;
        let data = Self::from_json_str(&content)?;
        info!("数据文件已加载: {:?}, 共 {} 个宝可梦", path, data.pokemon.len());
        Ok(data)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string(self)?;
        fs::write(path, content).map_err(PvpError::MasterFileSave)?;
        info!("数据文件已保存: {:?}", path);
        Ok(())
    }

    pub fn get(&self, pokemon: u16) -> Result<&Pokemon> {
        self.pokemon.get(&pokemon).ok_or(PvpError::MissingPokemon(pokemon))
    }

    /// 服装是否阻止进化
    pub fn costume_locks_evolution(&self, costume: u16) -> bool {
        self.costumes.get(&costume).copied().unwrap_or(false)
    }

    /// 按 (宝可梦, 形态, 临时进化) 查找种族值
    ///
    /// 临时进化优先，其次是形态，最后是宝可梦本身。
    pub fn resolve_base_stats(&self, pokemon: u16, form: u16, evolution: u16) -> Result<BaseStats> {
        let master = self.get(pokemon)?;
        let master_form = master.resolve_form(form);

        if evolution != 0 {
            if let Some(stats) = master.temp_evolution_stats(&master_form, evolution) {
                return Ok(stats);
            }
        }
        Ok(master_form.base_stats().unwrap_or_else(|| master.base_stats()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) const SAMPLE_MASTERFILE: &str = r#"{
        "pokemon": {
            "4": {"attack": 116, "defense": 93, "stamina": 118, "little": true,
                  "evolutions": [{"pokemon": 5}], "forms": {}},
            "5": {"attack": 158, "defense": 126, "stamina": 151,
                  "evolutions": [{"pokemon": 6}], "forms": {}},
            "6": {"attack": 223, "defense": 173, "stamina": 186,
                  "temp_evolutions": {
                      "1": {"attack": 273, "defense": 213, "stamina": 186},
                      "2": {"attack": 319, "defense": 212, "stamina": 186},
                      "3": {"attack": 300, "defense": 200, "stamina": 186, "unreleased": true}
                  },
                  "forms": {"950": {"attack": 0}}},
            "25": {"attack": 112, "defense": 96, "stamina": 111,
                   "evolutions": [{"pokemon": 26}],
                   "costume_override_evos": [7],
                   "forms": {"598": {"attack": 112, "defense": 96, "stamina": 111,
                                     "evolutions": [{"pokemon": 26, "form": 49}]}}},
            "26": {"attack": 193, "defense": 151, "stamina": 155,
                   "forms": {"49": {"attack": 193, "defense": 151, "stamina": 155},
                             "50": {"attack": 201, "defense": 154, "stamina": 155}}},
            "106": {"attack": 224, "defense": 181, "stamina": 137, "forms": {}},
            "107": {"attack": 193, "defense": 197, "stamina": 137, "forms": {}},
            "236": {"attack": 64, "defense": 64, "stamina": 111, "little": true,
                    "evolutions": [{"pokemon": 106}, {"pokemon": 107}, {"pokemon": 237}],
                    "forms": {}},
            "237": {"attack": 173, "defense": 207, "stamina": 137, "forms": {}},
            "415": {"attack": 59, "defense": 83, "stamina": 102, "little": true,
                    "evolutions": [{"pokemon": 416, "gender_requirement": 2}], "forms": {}},
            "416": {"attack": 149, "defense": 190, "stamina": 172, "forms": {}},
            "605": {"attack": 148, "defense": 100, "stamina": 146, "little": true,
                    "evolutions": [{"pokemon": 606}], "forms": {}},
            "606": {"attack": 221, "defense": 163, "stamina": 181, "forms": {}}
        },
        "costumes": {"5": true, "7": true, "8": false}
    }"#;

    pub(crate) fn sample_data() -> PokemonData {
        PokemonData::from_json_str(SAMPLE_MASTERFILE).unwrap()
    }

    #[test]
    fn test_parse_masterfile() {
        let data = sample_data();
        assert_eq!(data.pokemon.len(), 13);
        assert_eq!(data.get(25).unwrap().base_stats(), BaseStats::new(112, 96, 111));
        assert!(data.get(605).unwrap().little);
        assert_eq!(data.get(415).unwrap().evolutions[0].gender_requirement, 2);
        assert!(matches!(data.get(9999), Err(PvpError::MissingPokemon(9999))));
    }

    #[test]
    fn test_resolve_base_stats() {
        let data = sample_data();
        assert_eq!(data.resolve_base_stats(26, 50, 0).unwrap(), BaseStats::new(201, 154, 155));
        assert_eq!(data.resolve_base_stats(26, 0, 0).unwrap(), BaseStats::new(193, 151, 155));
        // 未知形态回退到宝可梦本身
        assert_eq!(data.resolve_base_stats(26, 12345, 0).unwrap(), BaseStats::new(193, 151, 155));
        // 形态缺少种族值
        assert_eq!(data.resolve_base_stats(6, 950, 0).unwrap(), BaseStats::new(223, 173, 186));
        // 形态上没有临时进化时使用宝可梦本身的
        assert_eq!(data.resolve_base_stats(6, 950, 2).unwrap(), BaseStats::new(319, 212, 186));
        assert_eq!(data.resolve_base_stats(6, 0, 1).unwrap(), BaseStats::new(273, 213, 186));
        // 不存在的临时进化
        assert_eq!(data.resolve_base_stats(6, 0, 9).unwrap(), BaseStats::new(223, 173, 186));
    }

    #[test]
    fn test_resolve_form_view() {
        let data = sample_data();
        let pikachu = data.get(25).unwrap();
        assert!(matches!(pikachu.resolve_form(0), Cow::Owned(_)));
        assert_eq!(pikachu.resolve_form(0).costume_override_evos, vec![7]);
        assert_eq!(pikachu.resolve_form(598).evolutions[0].form, 49);
    }

    #[test]
    fn test_costumes() {
        let data = sample_data();
        assert!(data.costume_locks_evolution(5));
        assert!(!data.costume_locks_evolution(8));
        assert!(!data.costume_locks_evolution(100));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("masterfile.json");

        let data = sample_data();
        data.save(&path).unwrap();
        let loaded = PokemonData::load(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(PokemonData::load(&missing), Err(PvpError::MasterFileOpen(_))));

        let broken = temp_dir.path().join("broken.json");
        fs::write(&broken, "{\"pokemon\": [").unwrap();
        assert!(matches!(PokemonData::load(&broken), Err(PvpError::MasterFileParse(_))));
    }
}
