//! # 配置数据模型
//!
//! 定义应用配置（ApplicationConfig）、反代服务期望配置（ProxyDesiredConfig）
//! 以及配置修改补丁（ProxyConfigPatch）的 Rust 结构体。
//!
//! 对应前端 TypeScript 中的 `ApplicationConfig`、`ProxyDesiredConfig`、
//! `ProxyConfigPatch` 接口。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 反代服务监听端口的下限
///
/// 1024 以下为系统保留端口，不允许用户配置。上限 65535 由 `u16` 类型天然保证。
pub const PORT_MIN: u16 = 1024;

/// 反代服务的默认监听端口
pub const DEFAULT_PORT: u16 = 8045;

/// 反代服务期望配置
///
/// 表示用户配置的**期望状态**（desired state）：用户编辑、持久化存储，
/// 不保证与服务的实际运行状态一致。所有修改必须通过配置同步器
/// （`services::config_store::ConfigStore`）进行。
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface ProxyDesiredConfig {
///   enabled: boolean;
///   port: number;      // 1024–65535
///   apiKey: string;
///   autoStart: boolean;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyDesiredConfig {
    /// 是否启用反代服务
    pub enabled: bool,

    /// 监听端口（1024–65535）：服务运行期间不允许修改
    pub port: u16,

    /// API 密钥：客户端连接反代服务时使用的 Bearer 凭证
    pub api_key: String,

    /// 应用启动时是否自动拉起反代服务（需同时满足 `enabled == true`）
    pub auto_start: bool,
}

impl Default for ProxyDesiredConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_PORT,
            api_key: format!("sk-{}", uuid::Uuid::new_v4().simple()),
            auto_start: false,
        }
    }
}

/// 反代配置修改补丁
///
/// 所有字段均为可选：`None` 表示该字段保持不变，`Some` 表示按字段覆盖。
/// 配置同步器按字段浅合并补丁，不做深层合并。
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface ProxyConfigPatch {
///   enabled?: boolean;
///   port?: number;
///   apiKey?: string;
///   autoStart?: boolean;
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfigPatch {
    /// 是否启用反代服务
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// 监听端口：服务运行期间提交此字段将被整体拒绝
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// API 密钥（通常由密钥管理器写入，而非用户手工编辑）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// 是否自动启动
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

/// 应用配置（持久化信封）
///
/// 对应 `~/.mo/GPD/config.json` 文件的完整内容。
///
/// 设计决策：
/// - 控制面只读写 `proxy` 字段；其余全局设置（语言、主题等）属于应用
///   其他功能域，通过 `#[serde(flatten)]` 的 `extra` 映射原样保留，
///   保证读取后再保存时未知字段不会丢失。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig {
    /// 反代服务期望配置：控制面唯一读写的字段
    #[serde(default)]
    pub proxy: ProxyDesiredConfig,

    /// 其余全局设置：控制面不解释、不修改，持久化时原样回写
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
