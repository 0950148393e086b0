//! # 配置 Tauri Commands
//!
//! 提供应用配置的读取、加载和修改的 Tauri command 处理函数：
//! - `load_app_config` - 从持久化存储（重新）加载配置
//! - `get_app_config` - 读取内存镜像的当前快照
//! - `update_proxy_config` - 应用反代配置补丁

use tauri::State;

use crate::models::config::{ApplicationConfig, ProxyConfigPatch};
use crate::services::control_plane::AppControl;

/// 从持久化存储加载应用配置
///
/// 应用启动时由后台引导流程调用一次；加载失败后前端可通过
/// 此 command 重试，成功前所有依赖配置的操作保持禁用。
///
/// # 返回值
/// 返回完整的应用配置
///
/// # 错误
/// 存储不可读或内容无法解析时返回错误
#[tauri::command]
pub async fn load_app_config(plane: State<'_, AppControl>) -> Result<ApplicationConfig, String> {
    plane.config.load().await.map_err(|e| e.to_string())
}

/// 读取内存镜像的当前配置快照
///
/// # 返回值
/// - `Some(config)` - 配置已加载
/// - `None` - 尚未加载成功
#[tauri::command]
pub async fn get_app_config(
    plane: State<'_, AppControl>,
) -> Result<Option<ApplicationConfig>, String> {
    Ok(plane.config.current())
}

/// 应用反代配置补丁
///
/// 补丁按字段浅合并到当前配置的 `proxy` 字段，其余字段不变；
/// 整体持久化成功后才更新内存并广播 `config://changed` 事件。
///
/// # 参数
/// - `patch` - 配置补丁（省略的字段保持不变）
///
/// # 返回值
/// 返回应用补丁后的完整配置
///
/// # 错误
/// 配置未加载、补丁不合法（如运行期间修改端口）或持久化失败时返回错误
#[tauri::command]
pub async fn update_proxy_config(
    patch: ProxyConfigPatch,
    plane: State<'_, AppControl>,
) -> Result<ApplicationConfig, String> {
    plane
        .config
        .apply_patch(patch)
        .await
        .map_err(|e| e.to_string())
}
