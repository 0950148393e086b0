//! # 配置同步服务
//!
//! 持有持久化配置的内存镜像，是期望状态的**唯一写入者**：
//! 所有配置修改（用户编辑、密钥重新生成）都必须经过本服务。
//!
//! ## 一致性保证
//! - 补丁整体应用或整体拒绝，不做部分应用
//! - 内存镜像只在持久化成功之后更新，保证内存与存储始终一致
//! - 每次成功更新通过 `watch` 通道发布给所有观察者
//!   （生命周期控制器、状态轮询器、前端事件转发器）
//!
//! ## 不变式
//! - 服务运行期间（最近一次观测 `running == true`）拒绝端口修改
//! - 信封中 `proxy` 以外的字段原样回写，永不改动

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::config::{ApplicationConfig, ProxyConfigPatch, PORT_MIN};
use crate::models::status::RuntimeStatus;
use crate::services::bridge::ProxyBridge;
use crate::services::error::{ControlError, ControlResult};

/// 配置同步器
///
/// 内存镜像存放在 `watch` 通道内部（`None` 表示尚未加载成功），
/// 读取方通过 `current()` 取快照、通过 `subscribe()` 订阅变更。
pub struct ConfigStore<B: ProxyBridge> {
    /// 后端桥接：配置的实际读写走这里
    bridge: Arc<B>,

    /// 配置镜像与发布通道：单写多读
    config_tx: watch::Sender<Option<ApplicationConfig>>,

    /// 最近观测到的运行状态（只读）：用于端口修改的运行期校验
    status_rx: watch::Receiver<RuntimeStatus>,
}

impl<B: ProxyBridge> ConfigStore<B> {
    /// 创建配置同步器
    ///
    /// # 参数
    /// - `bridge` - 后端桥接
    /// - `status_rx` - 状态轮询器的观测结果订阅端
    pub fn new(bridge: Arc<B>, status_rx: watch::Receiver<RuntimeStatus>) -> Self {
        let (config_tx, _) = watch::channel(None);
        Self {
            bridge,
            config_tx,
            status_rx,
        }
    }

    /// 从持久化存储加载配置并更新内存镜像
    ///
    /// 应用启动时调用一次；加载失败后控制面没有期望状态，
    /// 所有依赖配置的操作保持禁用，可重复调用本方法重试。
    ///
    /// # 返回值
    /// 加载成功时返回完整的应用配置
    ///
    /// # 错误
    /// 存储不可读或内容无法解析时返回 `ConfigUnavailable`
    pub async fn load(&self) -> ControlResult<ApplicationConfig> {
        let config = self
            .bridge
            .load_config()
            .await
            .map_err(ControlError::ConfigUnavailable)?;

        self.config_tx.send_replace(Some(config.clone()));
        Ok(config)
    }

    /// 获取当前内存镜像的快照
    ///
    /// # 返回值
    /// - `Some(config)` - 配置已加载
    /// - `None` - 尚未加载成功（启动早期或加载失败后）
    pub fn current(&self) -> Option<ApplicationConfig> {
        self.config_tx.borrow().clone()
    }

    /// 订阅配置变更
    pub fn subscribe(&self) -> watch::Receiver<Option<ApplicationConfig>> {
        self.config_tx.subscribe()
    }

    /// 应用配置补丁（按字段浅合并）并持久化
    ///
    /// 执行流程：
    /// 1. 校验补丁（端口范围、运行期端口锁定）
    /// 2. 在镜像的克隆上合并补丁，`proxy` 以外的字段不碰
    /// 3. 整体持久化新信封
    /// 4. 持久化成功后才更新内存镜像并发布给观察者
    ///
    /// # 参数
    /// - `patch` - 配置补丁，`None` 字段保持不变
    ///
    /// # 返回值
    /// 返回应用补丁后的完整配置
    ///
    /// # 错误
    /// - `ConfigUnavailable` - 配置尚未加载
    /// - `InvalidPatch` - 端口越界，或服务运行期间尝试修改端口
    /// - `PersistFailed` - 存储写入失败，内存镜像保持原状
    pub async fn apply_patch(&self, patch: ProxyConfigPatch) -> ControlResult<ApplicationConfig> {
        let mut next = self.current().ok_or_else(|| {
            ControlError::ConfigUnavailable("配置尚未加载，无法应用修改".to_string())
        })?;

        if let Some(port) = patch.port {
            if port < PORT_MIN {
                return Err(ControlError::InvalidPatch(format!(
                    "端口 {} 越界（允许范围 1024–65535）",
                    port
                )));
            }
            // 端口只在服务未运行时可改；以最近一次轮询观测为准
            if self.status_rx.borrow().running {
                return Err(ControlError::InvalidPatch(
                    "服务运行期间不允许修改端口".to_string(),
                ));
            }
            next.proxy.port = port;
        }
        if let Some(enabled) = patch.enabled {
            next.proxy.enabled = enabled;
        }
        if let Some(api_key) = patch.api_key {
            next.proxy.api_key = api_key;
        }
        if let Some(auto_start) = patch.auto_start {
            next.proxy.auto_start = auto_start;
        }

        self.bridge
            .save_config(&next)
            .await
            .map_err(ControlError::PersistFailed)?;

        self.config_tx.send_replace(Some(next.clone()));
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use tokio::sync::watch;

    use crate::models::config::ProxyDesiredConfig;
    use crate::services::bridge::testing::MockBridge;

    use super::*;

    /// 构造测试用同步器与配套的状态写入端
    fn store_with(
        bridge: Arc<MockBridge>,
    ) -> (ConfigStore<MockBridge>, watch::Sender<RuntimeStatus>) {
        let (status_tx, status_rx) = watch::channel(RuntimeStatus::default());
        (ConfigStore::new(bridge, status_rx), status_tx)
    }

    fn config_with_extras() -> ApplicationConfig {
        let raw = r#"{
            "language": "zh-CN",
            "theme": "dark",
            "proxy": { "enabled": false, "port": 8045, "apiKey": "sk-old", "autoStart": false }
        }"#;
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn test_load_failure_leaves_mirror_empty() {
        let bridge = Arc::new(MockBridge::default());
        bridge.load_fails.store(true, Ordering::SeqCst);
        let (store, _status_tx) = store_with(bridge);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, ControlError::ConfigUnavailable(_)));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_patch_before_load_rejected() {
        let bridge = Arc::new(MockBridge::default());
        let (store, _status_tx) = store_with(bridge.clone());

        let patch = ProxyConfigPatch {
            enabled: Some(true),
            ..Default::default()
        };
        let err = store.apply_patch(patch).await.unwrap_err();
        assert!(matches!(err, ControlError::ConfigUnavailable(_)));
        assert_eq!(bridge.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_patch_only_touches_proxy_field() {
        let bridge = Arc::new(MockBridge::default());
        *bridge.config.lock().unwrap() = config_with_extras();
        let (store, _status_tx) = store_with(bridge.clone());
        store.load().await.unwrap();

        let patch = ProxyConfigPatch {
            port: Some(9000),
            ..Default::default()
        };
        let updated = store.apply_patch(patch).await.unwrap();

        // proxy 内只有 port 变化，其余字段保持
        assert_eq!(updated.proxy.port, 9000);
        assert_eq!(updated.proxy.api_key, "sk-old");
        // 信封内的未知全局字段原样保留，且持久化内容与内存镜像一致
        assert_eq!(updated.extra.get("language").unwrap(), "zh-CN");
        assert_eq!(updated.extra.get("theme").unwrap(), "dark");
        let saved = bridge.saved.lock().unwrap().clone().unwrap();
        assert_eq!(saved, updated);
    }

    #[tokio::test]
    async fn test_port_patch_rejected_while_running() {
        let bridge = Arc::new(MockBridge::default());
        *bridge.config.lock().unwrap() = config_with_extras();
        let (store, status_tx) = store_with(bridge.clone());
        store.load().await.unwrap();

        // 轮询器观测到服务正在运行
        status_tx.send_replace(RuntimeStatus {
            running: true,
            port: 8045,
            base_url: "http://127.0.0.1:8045".to_string(),
            active_account_count: 1,
        });

        let patch = ProxyConfigPatch {
            port: Some(9000),
            ..Default::default()
        };
        let err = store.apply_patch(patch).await.unwrap_err();
        assert!(matches!(err, ControlError::InvalidPatch(_)));
        // 整个补丁被拒绝，没有发生持久化
        assert_eq!(bridge.save_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.current().unwrap().proxy.port, 8045);
    }

    #[tokio::test]
    async fn test_out_of_range_port_rejected() {
        let bridge = Arc::new(MockBridge::default());
        let (store, _status_tx) = store_with(bridge);
        store.load().await.unwrap();

        let patch = ProxyConfigPatch {
            port: Some(80),
            ..Default::default()
        };
        let err = store.apply_patch(patch).await.unwrap_err();
        assert!(matches!(err, ControlError::InvalidPatch(_)));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_mirror_unchanged() {
        let bridge = Arc::new(MockBridge::default());
        *bridge.config.lock().unwrap() = config_with_extras();
        let (store, _status_tx) = store_with(bridge.clone());
        store.load().await.unwrap();

        bridge.save_fails.store(true, Ordering::SeqCst);
        let patch = ProxyConfigPatch {
            enabled: Some(true),
            api_key: Some("sk-should-not-apply".to_string()),
            ..Default::default()
        };
        let err = store.apply_patch(patch).await.unwrap_err();
        assert!(matches!(err, ControlError::PersistFailed(_)));

        // 内存镜像保持在上一次已知良好状态
        let current = store.current().unwrap();
        assert!(!current.proxy.enabled);
        assert_eq!(current.proxy.api_key, "sk-old");
    }

    #[tokio::test]
    async fn test_successful_patch_notifies_subscribers() {
        let bridge = Arc::new(MockBridge::default());
        let (store, _status_tx) = store_with(bridge);
        store.load().await.unwrap();

        let mut rx = store.subscribe();
        rx.mark_unchanged();

        let patch = ProxyConfigPatch {
            enabled: Some(true),
            ..Default::default()
        };
        store.apply_patch(patch).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().as_ref().unwrap().proxy.enabled);
    }

    #[tokio::test]
    async fn test_default_config_shape() {
        // 首次启动（存储为空）时 MockBridge 返回默认配置
        let bridge = Arc::new(MockBridge::default());
        let (store, _status_tx) = store_with(bridge);
        let config = store.load().await.unwrap();

        assert!(!config.proxy.enabled);
        assert_eq!(config.proxy.port, ProxyDesiredConfig::default().port);
        assert!(config.proxy.api_key.starts_with("sk-"));
    }
}
