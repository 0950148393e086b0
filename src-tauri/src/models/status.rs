//! # 运行状态数据模型
//!
//! 定义反代服务的实际运行状态（RuntimeStatus）和生命周期阶段
//! （LifecyclePhase）的数据结构。
//!
//! 对应前端 TypeScript 中的 `RuntimeStatus` 和 `LifecyclePhase` 类型。

use serde::{Deserialize, Serialize};

/// 反代服务实际运行状态
///
/// 表示轮询观测到的**实际状态**（actual state），与期望配置相互独立：
/// - 只由状态轮询器写入，控制面其他部分只读
/// - 每次轮询整体重建，不做增量修改
/// - 期望状态与实际状态允许短暂不一致（如启动命令发出后、
///   轮询器观测到变化前的窗口期）
///
/// 首次轮询成功前使用 `Default`（未运行、端口 0、空地址、0 个账号）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatus {
    /// 服务是否正在运行
    pub running: bool,

    /// 实际监听端口：服务未运行时为 0
    pub port: u16,

    /// 服务基础地址（如 `http://127.0.0.1:8045`）：服务未运行时为空字符串
    pub base_url: String,

    /// 当前账号池中可用账号数量
    pub active_account_count: u32,
}

/// 生命周期阶段
///
/// 生命周期控制器的状态机：
/// `Stopped --start--> Starting --确认--> Running --stop--> Stopping --确认--> Stopped`
///
/// 后端调用失败时回退到转换前的稳定状态
/// （`Starting` 失败回到 `Stopped`，`Stopping` 失败回到 `Running`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecyclePhase {
    /// 已停止：可以发起启动
    Stopped,
    /// 启动中：等待后端确认
    Starting,
    /// 运行中：可以发起停止
    Running,
    /// 停止中：等待后端确认
    Stopping,
}

impl LifecyclePhase {
    /// 是否有转换正在进行中
    ///
    /// `busy == true` 期间所有 `toggle()` 调用都会被拒绝，
    /// 保证同一时刻最多只有一个启停命令在途。
    pub fn busy(self) -> bool {
        matches!(self, LifecyclePhase::Starting | LifecyclePhase::Stopping)
    }
}
