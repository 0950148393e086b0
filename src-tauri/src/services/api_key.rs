//! # API 密钥管理服务
//!
//! 负责 API 密钥的重新生成。旧密钥一旦被替换即对后续连接失效，
//! 属于不可逆的破坏性操作，因此采用显式两步协议而非阻塞式弹窗：
//!
//! 1. `request_regeneration()` 返回一个一次性确认令牌
//! 2. `confirm_regeneration(token)` 携带令牌确认后才真正执行
//!
//! 前端拿到令牌后展示确认界面；用户取消则调用 `cancel_regeneration()`
//! （或直接丢弃令牌），配置不会发生任何变化。
//!
//! ## 原子性
//! 新密钥通过配置同步器整体写入：生成失败或持久化失败时
//! 配置不变，旧密钥继续有效，不存在新旧密钥同时生效的窗口。

use std::sync::{Arc, Mutex};

use crate::models::config::ProxyConfigPatch;
use crate::services::bridge::ProxyBridge;
use crate::services::config_store::ConfigStore;
use crate::services::error::{ControlError, ControlResult};

/// API 密钥管理器
pub struct ApiKeyManager<B: ProxyBridge> {
    /// 后端桥接：密钥生成走这里
    bridge: Arc<B>,

    /// 当前待确认的令牌：同一时刻最多一个，新的请求会替换旧令牌
    pending: Mutex<Option<String>>,
}

impl<B: ProxyBridge> ApiKeyManager<B> {
    /// 创建密钥管理器
    pub fn new(bridge: Arc<B>) -> Self {
        Self {
            bridge,
            pending: Mutex::new(None),
        }
    }

    /// 发起密钥重新生成请求
    ///
    /// 只登记确认令牌，不做任何实际操作。
    /// 重复调用会使之前发出的令牌作废（后发请求替换先发请求）。
    ///
    /// # 返回值
    /// 返回一次性确认令牌，供 `confirm_regeneration` 使用
    ///
    /// # 错误
    /// 内部状态锁异常时返回 `KeyGenerationFailed`
    pub fn request_regeneration(&self) -> ControlResult<String> {
        let token = uuid::Uuid::new_v4().to_string();
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ControlError::KeyGenerationFailed("内部状态异常".to_string()))?;
        *pending = Some(token.clone());
        Ok(token)
    }

    /// 取消待确认的重新生成请求
    ///
    /// 用户在确认界面选择"否"时调用；没有待确认请求时为无操作。
    pub fn cancel_regeneration(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = None;
        }
    }

    /// 确认并执行密钥重新生成
    ///
    /// 校验令牌后向后端请求新密钥，再通过配置同步器原子替换。
    /// 令牌一经消费即作废，无论后续步骤成败。
    ///
    /// # 参数
    /// - `token` - `request_regeneration` 返回的确认令牌
    /// - `store` - 配置同步器（新密钥经由它持久化）
    ///
    /// # 返回值
    /// 返回新生成的 API 密钥
    ///
    /// # 错误
    /// - `KeyGenerationFailed` - 令牌无效/已作废，或后端生成失败；
    ///   原密钥保持有效
    /// - `PersistFailed` / `ConfigUnavailable` - 配置写入阶段失败，
    ///   原密钥同样保持有效
    pub async fn confirm_regeneration(
        &self,
        token: &str,
        store: &ConfigStore<B>,
    ) -> ControlResult<String> {
        {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| ControlError::KeyGenerationFailed("内部状态异常".to_string()))?;
            match pending.as_deref() {
                Some(expected) if expected == token => {
                    *pending = None;
                }
                _ => {
                    return Err(ControlError::KeyGenerationFailed(
                        "确认令牌无效或已作废".to_string(),
                    ));
                }
            }
        }

        let new_key = self
            .bridge
            .generate_api_key()
            .await
            .map_err(ControlError::KeyGenerationFailed)?;

        store
            .apply_patch(ProxyConfigPatch {
                api_key: Some(new_key.clone()),
                ..Default::default()
            })
            .await?;

        Ok(new_key)
    }
}

/// 生成密钥的遮蔽展示形式
///
/// 保留前 6 位和后 4 位，中间以 `…` 省略，
/// 供界面展示使用，避免完整密钥常驻前端。
/// 过短的密钥整体遮蔽。
pub fn mask_api_key(key: &str) -> String {
    const HEAD: usize = 6;
    const TAIL: usize = 4;

    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= HEAD + TAIL {
        return "••••".to_string();
    }
    let head: String = chars[..HEAD].iter().collect();
    let tail: String = chars[chars.len() - TAIL..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::sync::watch;

    use crate::models::status::RuntimeStatus;
    use crate::services::bridge::testing::MockBridge;

    use super::*;

    /// 构造已加载配置的同步器与密钥管理器
    async fn setup(bridge: Arc<MockBridge>) -> (ConfigStore<MockBridge>, ApiKeyManager<MockBridge>) {
        let (_status_tx, status_rx) = watch::channel(RuntimeStatus::default());
        let store = ConfigStore::new(bridge.clone(), status_rx);
        store.load().await.unwrap();
        let manager = ApiKeyManager::new(bridge);
        (store, manager)
    }

    #[tokio::test]
    async fn test_confirmed_regeneration_replaces_key() {
        let bridge = Arc::new(MockBridge::default());
        let (store, manager) = setup(bridge.clone()).await;

        let token = manager.request_regeneration().unwrap();
        let new_key = manager.confirm_regeneration(&token, &store).await.unwrap();

        assert_eq!(new_key, "sk-regenerated");
        assert_eq!(store.current().unwrap().proxy.api_key, "sk-regenerated");
        assert_eq!(bridge.save_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_declined_regeneration_keeps_key() {
        let bridge = Arc::new(MockBridge::default());
        let (store, manager) = setup(bridge.clone()).await;
        let old_key = store.current().unwrap().proxy.api_key;

        let token = manager.request_regeneration().unwrap();
        manager.cancel_regeneration();

        // 取消后令牌作废，确认被拒绝
        let err = manager.confirm_regeneration(&token, &store).await.unwrap_err();
        assert!(matches!(err, ControlError::KeyGenerationFailed(_)));
        assert_eq!(store.current().unwrap().proxy.api_key, old_key);
        assert_eq!(bridge.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_key() {
        let bridge = Arc::new(MockBridge::default());
        bridge.keygen_fails.store(true, Ordering::SeqCst);
        let (store, manager) = setup(bridge.clone()).await;
        let old_key = store.current().unwrap().proxy.api_key;

        let token = manager.request_regeneration().unwrap();
        let err = manager.confirm_regeneration(&token, &store).await.unwrap_err();

        assert!(matches!(err, ControlError::KeyGenerationFailed(_)));
        assert_eq!(store.current().unwrap().proxy.api_key, old_key);
    }

    #[tokio::test]
    async fn test_superseded_token_rejected() {
        let bridge = Arc::new(MockBridge::default());
        let (store, manager) = setup(bridge).await;

        let first = manager.request_regeneration().unwrap();
        let second = manager.request_regeneration().unwrap();

        // 先发令牌已被后发请求替换
        let err = manager.confirm_regeneration(&first, &store).await.unwrap_err();
        assert!(matches!(err, ControlError::KeyGenerationFailed(_)));

        // 后发令牌正常可用
        manager.confirm_regeneration(&second, &store).await.unwrap();
    }

    #[tokio::test]
    async fn test_token_single_use() {
        let bridge = Arc::new(MockBridge::default());
        let (store, manager) = setup(bridge).await;

        let token = manager.request_regeneration().unwrap();
        manager.confirm_regeneration(&token, &store).await.unwrap();

        // 令牌一经消费即作废
        let err = manager.confirm_regeneration(&token, &store).await.unwrap_err();
        assert!(matches!(err, ControlError::KeyGenerationFailed(_)));
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-123…cdef");
        assert_eq!(mask_api_key("sk-short"), "••••");
        assert_eq!(mask_api_key(""), "••••");
    }
}
