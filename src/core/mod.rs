// 核心模块
// 开发心理：错误类型与配置是所有上层模块共享的基础

pub mod config;
pub mod error;

pub use config::{League, RankerConfig};
pub use error::{ErrorCategory, PvpError, Result};
