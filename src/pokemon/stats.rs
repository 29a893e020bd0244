// 能力值与数值公式
// 开发心理：种族值 + 个体值 + 等级倍率决定CP、HP和能力值乘积
// 三个公式都是纯函数，按双精度浮点计算，取整顺序必须保持一致

use serde::{Deserialize, Serialize};

use crate::core::error::{PvpError, Result};
use crate::pokemon::cpm::cp_multiplier;

/// 种族值 (攻击/防御/耐力)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: u16,
    pub defense: u16,
    pub stamina: u16,
}

impl BaseStats {
    pub const fn new(attack: u16, defense: u16, stamina: u16) -> Self {
        Self {
            attack,
            defense,
            stamina,
        }
    }

    /// 缓存键：CP上限与三项种族值的混合进制编码，种族值 < 999 时无碰撞
    pub fn fingerprint(&self, cp_cap: u32) -> u64 {
        const RADIX: u64 = 999;
        cp_cap as u64 * RADIX * RADIX * RADIX
            + self.attack as u64 * RADIX * RADIX
            + self.defense as u64 * RADIX
            + self.stamina as u64
    }
}

/// 个体值组合，每项 0-15，共 16×16×16 = 4096 种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ivs {
    pub attack: u8,
    pub defense: u8,
    pub stamina: u8,
}

impl Ivs {
    pub const MAX: u8 = 15;
    pub const COMBINATIONS: usize = 4096;
    pub const ZERO: Ivs = Ivs::new(0, 0, 0);
    pub const PERFECT: Ivs = Ivs::new(15, 15, 15);

    pub const fn new(attack: u8, defense: u8, stamina: u8) -> Self {
        Self {
            attack,
            defense,
            stamina,
        }
    }

    pub const fn uniform(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// 打包索引 (attack*16 + defense)*16 + stamina
    pub const fn index(&self) -> usize {
        (self.attack as usize * 16 + self.defense as usize) * 16 + self.stamina as usize
    }

    pub const fn from_index(index: usize) -> Self {
        Self::new(
            ((index >> 8) & 0xF) as u8,
            ((index >> 4) & 0xF) as u8,
            (index & 0xF) as u8,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.attack <= Self::MAX && self.defense <= Self::MAX && self.stamina <= Self::MAX
    }

    pub fn validate(&self, level: f64) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(PvpError::InputOutOfRange {
                attack: self.attack,
                defense: self.defense,
                stamina: self.stamina,
                level,
            })
        }
    }

    /// 枚举每项都在 [floor, 15] 内的全部组合，按打包索引升序
    pub fn all_from(floor: u8) -> impl Iterator<Item = Ivs> {
        (0..Self::COMBINATIONS)
            .map(Ivs::from_index)
            .filter(move |ivs| ivs.attack >= floor && ivs.defense >= floor && ivs.stamina >= floor)
    }
}

impl std::fmt::Display for Ivs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.attack, self.defense, self.stamina)
    }
}

impl std::str::FromStr for Ivs {
    type Err = PvpError;

    // 格式 "A/D/S"
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 {
            return Err(PvpError::InvalidConfig(format!("个体值格式应为 A/D/S: {}", s)));
        }
        let mut values = [0u8; 3];
        for (value, part) in values.iter_mut().zip(parts) {
            *value = part
                .trim()
                .parse()
                .map_err(|_| PvpError::InvalidConfig(format!("个体值不是数字: {}", part)))?;
        }
        let ivs = Ivs::new(values[0], values[1], values[2]);
        ivs.validate(0.0)?;
        Ok(ivs)
    }
}

// 在浮点域相加，种族值接近上限时不会溢出
fn stat_sum(base: u16, iv: u8) -> f64 {
    f64::from(base) + f64::from(iv)
}

/// CP = floor(cpm² · A · sqrt(D·S) / 10)，最小为10
pub fn calculate_cp(stats: &BaseStats, ivs: Ivs, level: f64) -> u32 {
    let multiplier = cp_multiplier(level);

    let attack = stat_sum(stats.attack, ivs.attack);
    let defense = stat_sum(stats.defense, ivs.defense);
    let stamina = stat_sum(stats.stamina, ivs.stamina);

    let cp = (multiplier * multiplier * attack * (defense * stamina).sqrt() / 10.0).floor() as u32;
    cp.max(10)
}

/// HP = floor(S · cpm)，最小为10
pub fn calculate_hp(stats: &BaseStats, stamina: u8, level: f64) -> u32 {
    let stamina_sum = stat_sum(stats.stamina, stamina);
    let hp = (stamina_sum * cp_multiplier(level)).floor() as u32;
    hp.max(10)
}

/// 实际攻击力，作为能力值乘积相同时的次级排序依据
pub fn effective_attack(stats: &BaseStats, attack: u8, level: f64) -> f64 {
    stat_sum(stats.attack, attack) * cp_multiplier(level)
}

/// 能力值乘积 = 实际攻击 × 实际防御 × HP
pub fn calculate_stat_product(stats: &BaseStats, ivs: Ivs, level: f64) -> f64 {
    let multiplier = cp_multiplier(level);
    let hp = calculate_hp(stats, ivs.stamina, level) as f64;
    stat_sum(stats.attack, ivs.attack)
        * multiplier
        * stat_sum(stats.defense, ivs.defense)
        * multiplier
        * hp
}
