//! # 通用工具函数
//! - `path` - 配置文件路径
//! - `time` - 时间戳格式化

pub mod path;
pub mod time;
