//! # 通用工具模块
//!
//! - `path` - 配置文件路径相关的工具函数

pub mod path;
