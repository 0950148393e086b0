//! # API 密钥 Tauri Commands
//!
//! 提供 API 密钥重新生成（两步确认协议）和遮蔽展示的
//! Tauri command 处理函数：
//! - `request_key_regeneration` - 第一步：获取一次性确认令牌
//! - `confirm_key_regeneration` - 第二步：携带令牌执行重新生成
//! - `cancel_key_regeneration` - 用户取消，令牌作废
//! - `get_masked_api_key` - 获取当前密钥的遮蔽展示形式

use tauri::State;

use crate::services::api_key::mask_api_key;
use crate::services::control_plane::AppControl;

/// 发起密钥重新生成请求（两步协议第一步）
///
/// 只登记确认令牌，不做任何实际操作；前端拿到令牌后展示确认界面。
/// 旧密钥被替换后即对后续连接失效，属于不可逆操作，
/// 因此必须经过第二步确认才会执行。
///
/// # 返回值
/// 返回一次性确认令牌
#[tauri::command]
pub async fn request_key_regeneration(plane: State<'_, AppControl>) -> Result<String, String> {
    plane.keys.request_regeneration().map_err(|e| e.to_string())
}

/// 确认并执行密钥重新生成（两步协议第二步）
///
/// 校验令牌后生成新密钥并原子替换配置中的旧密钥。
/// 任何一步失败都保持旧密钥有效。
///
/// # 参数
/// - `token` - 第一步返回的确认令牌
///
/// # 返回值
/// 返回新生成的 API 密钥
///
/// # 错误
/// 令牌无效/已作废、后端生成失败或配置写入失败时返回错误
#[tauri::command]
pub async fn confirm_key_regeneration(
    token: String,
    plane: State<'_, AppControl>,
) -> Result<String, String> {
    plane
        .keys
        .confirm_regeneration(&token, &plane.config)
        .await
        .map_err(|e| e.to_string())
}

/// 取消待确认的密钥重新生成请求
///
/// 用户在确认界面选择"否"时调用；配置不发生任何变化。
#[tauri::command]
pub async fn cancel_key_regeneration(plane: State<'_, AppControl>) -> Result<(), String> {
    plane.keys.cancel_regeneration();
    Ok(())
}

/// 获取当前 API 密钥的遮蔽展示形式
///
/// 保留前 6 位和后 4 位，中间省略，供界面常驻展示，
/// 避免完整密钥停留在前端 DOM 中。
///
/// # 错误
/// 配置尚未加载时返回错误
#[tauri::command]
pub async fn get_masked_api_key(plane: State<'_, AppControl>) -> Result<String, String> {
    let config = plane
        .config
        .current()
        .ok_or_else(|| "配置尚未加载".to_string())?;
    Ok(mask_api_key(&config.proxy.api_key))
}
