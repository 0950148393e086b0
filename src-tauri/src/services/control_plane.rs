//! # 控制面聚合
//!
//! 把配置同步器、状态轮询器、生命周期控制器和密钥管理器
//! 装配成一个整体，通过 Tauri 的 `manage()` 注册为应用状态，
//! 所有 command 函数经 `State<AppControl>` 访问。
//!
//! ## 装配关系
//! - 轮询器是实际状态的唯一写入端，其余组件只读
//! - 配置同步器是期望状态的唯一写入端，其余组件只读
//! - 生命周期控制器与轮询器共享带外唤醒信号（转换完成后立即刷新状态）

use std::sync::Arc;

use tokio::sync::{watch, Notify};

use crate::models::status::RuntimeStatus;
use crate::services::api_key::ApiKeyManager;
use crate::services::bridge::{ProxyBridge, ServiceBridge};
use crate::services::config_store::ConfigStore;
use crate::services::lifecycle::LifecycleController;
use crate::services::poller::{PollerHandle, StatusPoller};

/// 生产环境使用的控制面类型
pub type AppControl = ControlPlane<ServiceBridge>;

/// 控制面聚合体
pub struct ControlPlane<B: ProxyBridge> {
    /// 配置同步器
    pub config: ConfigStore<B>,

    /// 生命周期控制器
    pub lifecycle: LifecycleController<B>,

    /// API 密钥管理器
    pub keys: ApiKeyManager<B>,

    /// 实际状态订阅端（轮询器发布）
    status_rx: watch::Receiver<RuntimeStatus>,

    /// 轮询任务句柄：会话结束时释放
    poller: PollerHandle,
}

impl<B: ProxyBridge> ControlPlane<B> {
    /// 装配控制面并启动状态轮询
    ///
    /// 必须在 tokio 运行时上下文中调用（内部会 spawn 轮询任务）。
    pub fn new(bridge: B) -> Self {
        Self::with_bridge(Arc::new(bridge))
    }

    /// 用共享桥接装配控制面（测试中保留桥接引用以便断言）
    pub fn with_bridge(bridge: Arc<B>) -> Self {
        let (status_tx, status_rx) = watch::channel(RuntimeStatus::default());
        let wake = Arc::new(Notify::new());

        let config = ConfigStore::new(bridge.clone(), status_rx.clone());
        let poller = StatusPoller::new(
            bridge.clone(),
            status_tx,
            config.subscribe(),
            wake.clone(),
        )
        .spawn();
        let lifecycle = LifecycleController::new(bridge.clone(), config.subscribe(), wake);
        let keys = ApiKeyManager::new(bridge);

        Self {
            config,
            lifecycle,
            keys,
            status_rx,
            poller,
        }
    }

    /// 获取最近观测到的实际运行状态
    pub fn latest_status(&self) -> RuntimeStatus {
        self.status_rx.borrow().clone()
    }

    /// 订阅实际状态变更
    pub fn subscribe_status(&self) -> watch::Receiver<RuntimeStatus> {
        self.status_rx.clone()
    }

    /// 会话结束：释放轮询任务
    ///
    /// 释放后不再发起任何状态查询，在途查询的结果也不会被应用。
    pub fn release(&self) {
        self.poller.release();
    }
}
