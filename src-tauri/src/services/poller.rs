//! # 状态轮询服务
//!
//! 以固定周期查询反代服务的实际运行状态，结果通过 `watch` 通道
//! 发布给所有观察者。轮询是实际状态的**唯一来源**：
//! 实际状态永远不从期望配置推导。
//!
//! ## 轮询语义
//! - 周期固定（3 秒），单个循环内逐次 await，轮询天然串行，
//!   不会出现两次轮询并发、结果乱序应用的情况
//! - 轮询失败（瞬态）只记录日志并保留上次成功的观测结果，
//!   不向用户弹错，下个周期自动重试
//! - `poke()` 触发一次带外轮询（生命周期转换完成后立即刷新，
//!   不必等满一个周期）
//! - `release()` 终止轮询任务：之后不再发起任何查询，
//!   在途查询的结果也不会被应用

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;

use crate::models::config::{ApplicationConfig, DEFAULT_PORT};
use crate::models::status::RuntimeStatus;
use crate::services::bridge::ProxyBridge;

/// 轮询周期
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// 状态轮询器
///
/// `spawn()` 后整个结构体转移进后台任务，外部通过返回的
/// `PollerHandle` 控制它。
pub struct StatusPoller<B: ProxyBridge> {
    /// 后端桥接：状态查询走这里
    bridge: Arc<B>,

    /// 观测结果发布通道
    status_tx: watch::Sender<RuntimeStatus>,

    /// 配置镜像订阅端：查询时取期望端口定位服务
    config_rx: watch::Receiver<Option<ApplicationConfig>>,

    /// 带外轮询唤醒信号
    wake: Arc<Notify>,
}

/// 轮询任务句柄
///
/// 持有者负责在会话结束时调用 `release()` 显式释放定时任务；
/// 释放后任务立即终止，不会再发起查询，也不会应用在途结果。
pub struct PollerHandle {
    task: tokio::task::JoinHandle<()>,
    wake: Arc<Notify>,
}

impl PollerHandle {
    /// 触发一次带外轮询
    ///
    /// 若当前恰有一次轮询在途，唤醒信号会被保留，
    /// 在该次轮询结束后立即执行下一次。
    pub fn poke(&self) {
        self.wake.notify_one();
    }

    /// 释放轮询任务
    pub fn release(&self) {
        self.task.abort();
    }
}

impl<B: ProxyBridge> StatusPoller<B> {
    /// 创建状态轮询器
    ///
    /// # 参数
    /// - `bridge` - 后端桥接
    /// - `status_tx` - 观测结果发布通道（控制面持有对应的接收端）
    /// - `config_rx` - 配置镜像订阅端
    /// - `wake` - 带外轮询唤醒信号（生命周期控制器共享同一个实例）
    pub fn new(
        bridge: Arc<B>,
        status_tx: watch::Sender<RuntimeStatus>,
        config_rx: watch::Receiver<Option<ApplicationConfig>>,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            bridge,
            status_tx,
            config_rx,
            wake,
        }
    }

    /// 启动轮询后台任务
    ///
    /// # 返回值
    /// 返回任务句柄；会话结束时必须调用 `PollerHandle::release()`
    pub fn spawn(self) -> PollerHandle {
        let wake = self.wake.clone();
        let task = tokio::spawn(self.run());
        PollerHandle { task, wake }
    }

    /// 轮询主循环
    ///
    /// 周期到点或被带外唤醒时执行一次查询；逐次 await 保证串行。
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        // 轮询耗时超过周期时顺延下一次，而不是补偿连发
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }
            self.poll_once().await;
        }
    }

    /// 执行一次状态查询
    ///
    /// 成功时整体替换观测结果；失败时保留上次结果并记录 warn 日志。
    async fn poll_once(&mut self) {
        let port = self
            .config_rx
            .borrow()
            .as_ref()
            .map(|c| c.proxy.port)
            .unwrap_or(DEFAULT_PORT);

        match self.bridge.fetch_status(port).await {
            Ok(status) => {
                self.status_tx.send_replace(status);
            }
            Err(e) => {
                log::warn!("状态轮询失败（保留上次观测结果）: {}", e);
            }
        }
    }
}
