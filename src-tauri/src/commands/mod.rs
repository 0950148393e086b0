//! # Tauri Command 处理模块
//!
//! 本模块包含所有注册到 Tauri 的 command 处理函数。
//! 每个子模块对应一个功能域：
//! - `config` - 应用配置的加载、读取和修改 commands
//! - `lifecycle` - 反代服务启停和状态查询 commands
//! - `api_key` - API 密钥两步重新生成 commands
//! - `catalog` - 模型目录和连接示例 commands

pub mod api_key;
pub mod catalog;
pub mod config;
pub mod lifecycle;
