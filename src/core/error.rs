// 错误处理系统
// 开发心理：统一的错误类型，区分输入校验、不可行组合、数据缺失和IO四类问题
// 单个组合不可行只是局部结果，调用方据此跳过，不中断整批计算

use thiserror::Error;

// 排名引擎主要错误类型
#[derive(Debug, Error)]
pub enum PvpError {
    // 输入校验
    #[error("输入参数超出范围: attack={attack}, defense={defense}, stamina={stamina}, level={level}")]
    InputOutOfRange {
        attack: u8,
        defense: u8,
        stamina: u8,
        level: f64,
    },

    #[error("等级无效: {0} (必须 >= 1 且为0.5的整数倍)")]
    InvalidLevel(f64),

    #[error("个体值下限无效: {0} (必须 <= 15)")]
    InvalidIvFloor(u8),

    #[error("联盟配置为空")]
    LeaguesMissing,

    #[error("等级上限配置为空")]
    LevelCapsMissing,

    #[error("配置错误: {0}")]
    InvalidConfig(String),

    #[error("无CP上限的联盟不能进行全量排名")]
    UncappedLeague,

    // 不可行组合
    #[error("最低等级CP {cp} 已超过上限 {cap}")]
    BestCpExceedsCap { cp: u32, cap: u32 },

    #[error("当前等级 {level} 高于等级上限 {cap}")]
    LevelAboveCap { level: f64, cap: f64 },

    // 数据缺失
    #[error("数据文件中不存在宝可梦: {0}")]
    MissingPokemon(u16),

    #[error("数据文件尚未加载")]
    MasterFileUnloaded,

    // IO 与格式
    #[error("无法打开数据文件: {0}")]
    MasterFileOpen(#[source] std::io::Error),

    #[error("无法保存数据文件: {0}")]
    MasterFileSave(#[source] std::io::Error),

    #[error("数据文件解析失败: {0}")]
    MasterFileParse(#[from] serde_json::Error),

    #[error("配置文件解析失败: {0}")]
    ConfigParse(String),

    #[error("文件监听错误: {0}")]
    Watcher(#[from] notify::Error),
}

// Result类型别名
pub type Result<T> = std::result::Result<T, PvpError>;

// 错误分类，对应调用方的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputValidation,
    Infeasible,
    UnavailableData,
    Io,
}

impl PvpError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PvpError::InputOutOfRange { .. }
            | PvpError::InvalidLevel(_)
            | PvpError::InvalidIvFloor(_)
            | PvpError::LeaguesMissing
            | PvpError::LevelCapsMissing
            | PvpError::InvalidConfig(_)
            | PvpError::UncappedLeague => ErrorCategory::InputValidation,
            PvpError::BestCpExceedsCap { .. } | PvpError::LevelAboveCap { .. } => {
                ErrorCategory::Infeasible
            }
            PvpError::MissingPokemon(_) | PvpError::MasterFileUnloaded => {
                ErrorCategory::UnavailableData
            }
            PvpError::MasterFileOpen(_)
            | PvpError::MasterFileSave(_)
            | PvpError::MasterFileParse(_)
            | PvpError::ConfigParse(_)
            | PvpError::Watcher(_) => ErrorCategory::Io,
        }
    }

    // 不可行组合在批量计算中被跳过
    pub fn is_infeasible(&self) -> bool {
        self.category() == ErrorCategory::Infeasible
    }
}
