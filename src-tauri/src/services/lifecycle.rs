//! # 生命周期控制服务
//!
//! 负责反代服务的启停转换，核心保证是**互斥**：
//! 同一时刻最多只有一个启停命令在途，靠控制面自身的异步锁实现，
//! 不依赖后端侧的加锁。
//!
//! ## 转换规则
//! - `Stopped` 时 `toggle()` 发起启动，`Running` 时发起停止
//! - 转换在途（`busy`）或配置尚未加载时，`toggle()` 直接拒绝，不排队
//! - 后端调用失败时回退到转换前的稳定状态，错误同步返回给调用者，
//!   不做自动重试
//! - 启动命令携带**调用时刻**的期望配置快照；启动在途期间的后续编辑
//!   不会追溯影响该次启动
//! - 转换结束（无论成败）立即触发一次带外状态轮询，
//!   前端不必等满一个轮询周期就能看到新的实际状态

use std::sync::Arc;

use tokio::sync::{watch, Mutex, Notify};

use crate::models::config::ApplicationConfig;
use crate::models::status::LifecyclePhase;
use crate::services::bridge::ProxyBridge;
use crate::services::error::{ControlError, ControlResult};

/// 生命周期控制器
pub struct LifecycleController<B: ProxyBridge> {
    /// 后端桥接：启停命令走这里
    bridge: Arc<B>,

    /// 配置镜像订阅端：启动时取当前期望配置
    config_rx: watch::Receiver<Option<ApplicationConfig>>,

    /// 当前生命周期阶段（发布给观察者）
    phase_tx: watch::Sender<LifecyclePhase>,

    /// 转换互斥锁：`try_lock` 失败即为 `Busy`
    gate: Mutex<()>,

    /// 状态轮询器的带外唤醒信号
    poll_wake: Arc<Notify>,
}

impl<B: ProxyBridge> LifecycleController<B> {
    /// 创建生命周期控制器
    ///
    /// # 参数
    /// - `bridge` - 后端桥接
    /// - `config_rx` - 配置镜像订阅端
    /// - `poll_wake` - 与状态轮询器共享的带外唤醒信号
    pub fn new(
        bridge: Arc<B>,
        config_rx: watch::Receiver<Option<ApplicationConfig>>,
        poll_wake: Arc<Notify>,
    ) -> Self {
        let (phase_tx, _) = watch::channel(LifecyclePhase::Stopped);
        Self {
            bridge,
            config_rx,
            phase_tx,
            gate: Mutex::new(()),
            poll_wake,
        }
    }

    /// 获取当前生命周期阶段
    pub fn phase(&self) -> LifecyclePhase {
        *self.phase_tx.borrow()
    }

    /// 订阅生命周期阶段变更
    pub fn subscribe(&self) -> watch::Receiver<LifecyclePhase> {
        self.phase_tx.subscribe()
    }

    /// 切换反代服务的运行状态（唯一对外暴露的转换操作）
    ///
    /// # 返回值
    /// 返回转换完成后的稳定阶段（`Running` 或 `Stopped`）
    ///
    /// # 错误
    /// - `Busy` - 已有转换在途，本次调用被拒绝
    /// - `ConfigUnavailable` - 期望配置尚未加载
    /// - `OperationFailed` - 后端拒绝启停命令，阶段已回退到转换前状态
    pub async fn toggle(&self) -> ControlResult<LifecyclePhase> {
        // 互斥保证：转换期间锁被持有，并发的 toggle 拿不到锁直接拒绝
        let _guard = self.gate.try_lock().map_err(|_| ControlError::Busy)?;

        // 取调用时刻的期望配置快照；之后的编辑不影响本次转换
        let desired = self.config_rx.borrow().clone().ok_or_else(|| {
            ControlError::ConfigUnavailable("配置尚未加载，无法切换服务状态".to_string())
        })?;

        let phase = self.phase();
        let result = match phase {
            LifecyclePhase::Stopped => {
                self.phase_tx.send_replace(LifecyclePhase::Starting);
                match self.bridge.start_service(&desired.proxy).await {
                    Ok(()) => {
                        self.phase_tx.send_replace(LifecyclePhase::Running);
                        Ok(LifecyclePhase::Running)
                    }
                    Err(reason) => {
                        // 启动失败：回到 Stopped
                        self.phase_tx.send_replace(LifecyclePhase::Stopped);
                        Err(ControlError::OperationFailed { reason })
                    }
                }
            }
            LifecyclePhase::Running => {
                self.phase_tx.send_replace(LifecyclePhase::Stopping);
                match self.bridge.stop_service().await {
                    Ok(()) => {
                        self.phase_tx.send_replace(LifecyclePhase::Stopped);
                        Ok(LifecyclePhase::Stopped)
                    }
                    Err(reason) => {
                        // 停止失败：服务仍在运行，回到 Running
                        self.phase_tx.send_replace(LifecyclePhase::Running);
                        Err(ControlError::OperationFailed { reason })
                    }
                }
            }
            LifecyclePhase::Starting | LifecyclePhase::Stopping => Err(ControlError::Busy),
        };

        // 转换结束（成败皆然）立即触发带外轮询，尽快刷新实际状态
        self.poll_wake.notify_one();
        result
    }
}
