//! # 业务逻辑服务模块
//!
//! 控制面核心逻辑的实现，与 Tauri command 层解耦：
//! - `bridge` - 后端命令桥接（配置存储、服务启停、状态查询、密钥生成）
//! - `config_store` - 配置同步器：期望状态的内存镜像与原子持久化
//! - `poller` - 状态轮询器：以固定周期观测实际运行状态
//! - `lifecycle` - 生命周期控制器：串行化的启停转换状态机
//! - `api_key` - API 密钥管理：两步确认的密钥重新生成
//! - `examples` - 连接示例生成：按模型生成 curl / Python 客户端片段
//! - `control_plane` - 以上组件的装配体（Tauri managed state）
//! - `error` - 控制面错误分类

pub mod api_key;
pub mod bridge;
pub mod config_store;
pub mod control_plane;
pub mod error;
pub mod examples;
pub mod lifecycle;
pub mod poller;
