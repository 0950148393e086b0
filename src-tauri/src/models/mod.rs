//! # 数据模型模块
//!
//! 定义了与前端 TypeScript 类型一一对应的 Rust 数据结构。
//! 所有结构体均派生 `Serialize`（及必要的 `Deserialize`），
//! 用于 Tauri IPC 传输和 JSON 配置文件读写。
//! - `config` - 应用配置信封、反代期望配置和配置补丁
//! - `status` - 反代服务实际运行状态和生命周期阶段
//! - `catalog` - 支持的模型目录（编译期固定）

pub mod catalog;
pub mod config;
pub mod status;
