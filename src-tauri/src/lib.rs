//! # Gemini Proxy Desk - Tauri 应用核心初始化模块
//!
//! 本模块负责 Tauri 应用的完整初始化流程，包括：
//! - 注册 Tauri 官方插件（外部链接、日志）
//! - 注册自定义 Tauri commands（配置读写、服务启停、密钥管理、连接示例）
//! - 装配控制面（配置同步器、状态轮询器、生命周期控制器、密钥管理器）
//! - 启动后台引导流程（首次配置加载、按需自动启动、状态事件转发）
//!
//! ## 架构说明
//! 通过将核心逻辑放在 `lib.rs` 而非 `main.rs` 中，
//! Tauri 可以在桌面端（`main.rs`）和移动端入口之间共享此初始化代码。
//!
//! ## 模块结构
//! - `commands/` - Tauri command 处理函数（IPC 接口层）
//! - `models/` - 数据模型（对应前端 TypeScript 类型）
//! - `services/` - 核心业务逻辑（配置同步、状态轮询、生命周期控制）
//! - `utils/` - 通用工具函数

mod commands;
mod models;
mod services;
mod utils;

use tauri::{Emitter, Manager};

use services::bridge::ServiceBridge;
use services::control_plane::{AppControl, ControlPlane};

// `#[cfg_attr(mobile, tauri::mobile_entry_point)]`：条件编译属性
// 当目标平台为移动端（Android/iOS）时，此属性将 `run()` 函数标记为
// Tauri 移动端入口点。在桌面端编译时由 `main.rs` 直接调用。
#[cfg_attr(mobile, tauri::mobile_entry_point)]
/// Tauri 应用启动函数
///
/// 构建并运行 Tauri 应用实例。该函数完成以下工作：
/// 1. 创建 `tauri::Builder` 默认实例并注册所需插件
/// 2. 在 `setup` 钩子中装配控制面并注册为应用全局状态
/// 3. 启动后台引导任务（配置加载 + 自动启动 + 事件转发）
/// 4. 注册所有自定义 Tauri commands
/// 5. 在窗口销毁时释放状态轮询任务
/// 6. 生成应用上下文并启动主事件循环
///
/// # Panics
/// 如果 Tauri 应用启动失败（例如配置文件缺失或窗口创建失败），
/// 将通过 `.expect()` 触发 panic 并输出错误信息。
pub fn run() {
    tauri::Builder::default()
        // Opener 插件：供前端在系统浏览器中打开连接文档等外部链接
        .plugin(tauri_plugin_opener::init())
        // === 自定义 Tauri Commands 注册 ===
        // 所有 command 函数通过 `invoke_handler` 注册，前端通过 `invoke()` 调用
        .invoke_handler(tauri::generate_handler![
            // 配置 commands
            commands::config::load_app_config,
            commands::config::get_app_config,
            commands::config::update_proxy_config,
            // 生命周期 commands
            commands::lifecycle::toggle_proxy_service,
            commands::lifecycle::get_runtime_status,
            commands::lifecycle::get_lifecycle_phase,
            // API 密钥 commands
            commands::api_key::request_key_regeneration,
            commands::api_key::confirm_key_regeneration,
            commands::api_key::cancel_key_regeneration,
            commands::api_key::get_masked_api_key,
            // 模型目录与连接示例 commands
            commands::catalog::list_models,
            commands::catalog::build_client_examples,
        ])
        // `setup` 闭包：在应用窗口创建之前执行的初始化钩子
        .setup(|app| {
            // 仅在开发调试模式下启用日志插件
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            // === 控制面装配 ===
            // ControlPlane::new 内部会 spawn 状态轮询任务，
            // 必须在 Tauri 的异步运行时上下文中执行
            let plane = tauri::async_runtime::block_on(async {
                ControlPlane::new(ServiceBridge::new())
            });
            app.manage(plane);

            // 后台引导：首次配置加载、按需自动启动、状态事件转发
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(bootstrap(handle));

            Ok(())
        })
        // 会话结束：显式释放轮询任务，保证不再发起状态查询
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::Destroyed = event {
                window.state::<AppControl>().release();
            }
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// 后台引导流程
///
/// 1. 执行首次配置加载；失败只记日志，前端可随时通过
///    `load_app_config` command 重试
/// 2. 配置满足 `enabled && auto_start` 时发起一次启动；
///    启动失败按普通操作失败处理（记日志，不重试）
/// 3. 进入事件转发循环：把配置、实际状态、生命周期阶段的变更
///    以 Tauri 事件广播给前端
async fn bootstrap(app: tauri::AppHandle) {
    let plane = app.state::<AppControl>();

    match plane.config.load().await {
        Ok(config) => {
            if config.proxy.enabled && config.proxy.auto_start {
                if let Err(e) = plane.lifecycle.toggle().await {
                    log::warn!("自动启动反代服务失败: {}", e);
                }
            }
        }
        Err(e) => {
            log::warn!("启动时加载配置失败，等待前端重试: {}", e);
        }
    }

    // === 状态事件转发 ===
    // watch 通道只保留最新值，前端掉帧时自动跳过中间状态
    let mut config_rx = plane.config.subscribe();
    let mut status_rx = plane.subscribe_status();
    let mut phase_rx = plane.lifecycle.subscribe();

    loop {
        tokio::select! {
            changed = config_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let config = config_rx.borrow_and_update().clone();
                if let Err(e) = app.emit("config://changed", &config) {
                    log::warn!("广播配置变更事件失败: {}", e);
                }
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                if let Err(e) = app.emit("proxy://status-changed", &status) {
                    log::warn!("广播运行状态事件失败: {}", e);
                }
            }
            changed = phase_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let phase = *phase_rx.borrow_and_update();
                if let Err(e) = app.emit("proxy://phase-changed", &phase) {
                    log::warn!("广播生命周期阶段事件失败: {}", e);
                }
            }
        }
    }
}
