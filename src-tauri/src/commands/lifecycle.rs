//! # 生命周期 Tauri Commands
//!
//! 提供反代服务启停和状态查询的 Tauri command 处理函数：
//! - `toggle_proxy_service` - 切换服务运行状态（唯一的转换入口）
//! - `get_runtime_status` - 读取最近观测到的实际运行状态
//! - `get_lifecycle_phase` - 读取当前生命周期阶段

use tauri::State;

use crate::models::status::{LifecyclePhase, RuntimeStatus};
use crate::services::control_plane::AppControl;

/// 切换反代服务的运行状态
///
/// `Stopped` 时发起启动，`Running` 时发起停止。
/// 已有转换在途或配置尚未加载时直接拒绝（不排队），
/// 保证同一时刻最多一条启停命令在途。
///
/// # 返回值
/// 返回转换完成后的稳定阶段
///
/// # 错误
/// 转换在途、配置未加载或后端拒绝命令时返回错误；
/// 后端拒绝时阶段已回退到转换前状态
#[tauri::command]
pub async fn toggle_proxy_service(
    plane: State<'_, AppControl>,
) -> Result<LifecyclePhase, String> {
    plane.lifecycle.toggle().await.map_err(|e| e.to_string())
}

/// 读取最近观测到的实际运行状态
///
/// 返回的是轮询器最后一次成功观测的结果；轮询失败不会清空它
/// （宁可陈旧，不可缺失）。
#[tauri::command]
pub async fn get_runtime_status(plane: State<'_, AppControl>) -> Result<RuntimeStatus, String> {
    Ok(plane.latest_status())
}

/// 读取当前生命周期阶段
///
/// 前端据此渲染启停按钮的禁用态（`busy` 期间禁用）。
#[tauri::command]
pub async fn get_lifecycle_phase(plane: State<'_, AppControl>) -> Result<LifecyclePhase, String> {
    Ok(plane.lifecycle.phase())
}
