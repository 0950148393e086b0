//! # 后端命令桥接
//!
//! 控制面与外部协作者之间的全部交互汇聚在 `ProxyBridge` trait 上：
//! 配置存储的读写、反代服务的状态查询与启停、API 密钥生成。
//! 反代服务本身（请求路由、账号池、模型转换）不在本仓库范围内，
//! 控制面只通过这组命令接口与它交互。
//!
//! ## 实现
//! - `ServiceBridge` - 生产实现：配置存储为 `~/.mo/GPD/config.json`
//!   （临时文件 + 重命名的原子写入），反代服务以子进程方式拉起/终止，
//!   运行状态通过本地 HTTP 接口查询
//! - `MockBridge`（仅测试）- 各操作行为可编程、调用次数可断言的测试桩
//!
//! 桥接层的错误统一为 `String`（传输层错误描述），
//! 由各服务包装为对应的 `ControlError` 变体。

use std::future::Future;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::config::{ApplicationConfig, ProxyDesiredConfig, PORT_MIN};
use crate::models::status::RuntimeStatus;
use crate::utils::path;

/// 状态查询的超时时间
///
/// 查询目标是本机回环地址，正常情况下毫秒级返回；
/// 超时视为瞬态失败，由轮询器保留上次状态并在下个周期重试。
const STATUS_TIMEOUT: Duration = Duration::from_millis(1200);

/// 后端命令接口
///
/// 所有方法均为异步且可失败；返回的 `Err(String)` 是传输层错误描述。
/// 各方法的语义约定：
///
/// | 方法 | 语义 | 失败场景 |
/// |---|---|---|
/// | `load_config` | 读取持久化配置 | 存储不可读 |
/// | `save_config` | 整体持久化配置信封 | 存储不可写 |
/// | `fetch_status` | 查询实际运行状态 | 服务不可达（瞬态） |
/// | `start_service` | 按期望配置启动反代服务 | 端口占用、端口非法、已在运行 |
/// | `stop_service` | 停止反代服务 | 未在运行 |
/// | `generate_api_key` | 生成新的 API 密钥 | 生成失败 |
pub trait ProxyBridge: Send + Sync + 'static {
    /// 读取持久化的应用配置
    fn load_config(&self) -> impl Future<Output = Result<ApplicationConfig, String>> + Send;

    /// 持久化完整的应用配置信封
    fn save_config(
        &self,
        config: &ApplicationConfig,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// 查询反代服务的实际运行状态
    ///
    /// `port` 为期望配置中的监听端口，用于定位本地服务。
    fn fetch_status(&self, port: u16) -> impl Future<Output = Result<RuntimeStatus, String>> + Send;

    /// 按期望配置启动反代服务
    fn start_service(
        &self,
        config: &ProxyDesiredConfig,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// 停止反代服务
    fn stop_service(&self) -> impl Future<Output = Result<(), String>> + Send;

    /// 生成一个新的 API 密钥
    fn generate_api_key(&self) -> impl Future<Output = Result<String, String>> + Send;
}

/// 生产环境桥接实现
///
/// 反代服务作为随应用分发的 sidecar 程序（`gpd-proxyd`）以子进程方式管理，
/// 子进程句柄由桥接持有；运行状态不从子进程句柄推断，
/// 而是通过服务自身暴露的 `/internal/status` 接口独立观测。
pub struct ServiceBridge {
    /// 状态查询使用的 HTTP 客户端（带短超时）
    http: reqwest::Client,

    /// 当前反代服务子进程句柄：`None` 表示从未启动或已停止
    child: Mutex<Option<Child>>,
}

impl ServiceBridge {
    /// 创建生产桥接实例
    ///
    /// # Panics
    /// `reqwest::Client` 构建仅在 TLS 后端初始化失败等极端情况下失败，
    /// 此时应用无法继续，直接 panic。
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(STATUS_TIMEOUT)
                .build()
                .expect("构建 HTTP 客户端失败"),
            child: Mutex::new(None),
        }
    }
}

impl Default for ServiceBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// 定位反代服务 sidecar 程序（`gpd-proxyd`）
///
/// 按以下顺序查找：
/// 1. 打包布局：与主程序同目录，或同目录下的 `bin/` 子目录
/// 2. 开发布局：向上最多三层查找 `target/release/` 下的构建产物
fn locate_sidecar_binary() -> Option<PathBuf> {
    let name = if cfg!(windows) {
        "gpd-proxyd.exe"
    } else {
        "gpd-proxyd"
    };

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
            let candidate = dir.join("bin").join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    let mut dir = std::env::current_dir().ok()?;
    for _ in 0..3 {
        let candidate = dir.join("target").join("release").join(name);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?.to_path_buf();
    }
    None
}

impl ProxyBridge for ServiceBridge {
    fn load_config(&self) -> impl Future<Output = Result<ApplicationConfig, String>> + Send {
        async move {
            let config_path = path::get_config_file_path()?;

            // 配置文件不存在（首次启动）时返回默认配置，不视为错误
            if !config_path.exists() {
                return Ok(ApplicationConfig::default());
            }

            let content = tokio::fs::read_to_string(&config_path)
                .await
                .map_err(|e| format!("读取配置文件失败: {}", e))?;

            serde_json::from_str(&content).map_err(|e| format!("解析配置文件失败: {}", e))
        }
    }

    fn save_config(
        &self,
        config: &ApplicationConfig,
    ) -> impl Future<Output = Result<(), String>> + Send {
        let config = config.clone();
        async move {
            let dir = path::get_app_config_dir()?;

            // 确保配置目录存在，递归创建所有缺失的父目录
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(|e| format!("创建配置目录失败: {}", e))?;
            }

            let content = serde_json::to_string_pretty(&config)
                .map_err(|e| format!("序列化配置失败: {}", e))?;

            // 原子写入：先写临时文件，再重命名覆盖正式文件，
            // 避免写入中途失败留下半个配置文件
            let final_path = dir.join("config.json");
            let tmp_path = dir.join("config.json.tmp");

            tokio::fs::write(&tmp_path, content)
                .await
                .map_err(|e| format!("写入配置文件失败: {}", e))?;

            tokio::fs::rename(&tmp_path, &final_path)
                .await
                .map_err(|e| format!("替换配置文件失败: {}", e))
        }
    }

    fn fetch_status(&self, port: u16) -> impl Future<Output = Result<RuntimeStatus, String>> + Send {
        async move {
            let url = format!("http://127.0.0.1:{}/internal/status", port);

            match self.http.get(&url).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        return Err(format!("状态接口返回 {}", resp.status()));
                    }
                    resp.json::<RuntimeStatus>()
                        .await
                        .map_err(|e| format!("解析状态响应失败: {}", e))
                }
                // 连接被拒绝说明端口上没有服务在监听，这是对"未运行"的确定观测
                Err(e) if e.is_connect() => Ok(RuntimeStatus::default()),
                // 超时、响应中断等视为瞬态失败，交由轮询器保留上次状态
                Err(e) => Err(format!("状态查询失败: {}", e)),
            }
        }
    }

    fn start_service(
        &self,
        config: &ProxyDesiredConfig,
    ) -> impl Future<Output = Result<(), String>> + Send {
        let config = config.clone();
        async move {
            // 已在运行？（子进程存活即拒绝重复启动）
            {
                let mut guard = self.child.lock().map_err(|e| e.to_string())?;
                if let Some(child) = guard.as_mut() {
                    if let Ok(None) = child.try_wait() {
                        return Err("反代服务已在运行".to_string());
                    }
                }
            }

            if config.port < PORT_MIN {
                return Err(format!("无效端口: {}（允许范围 1024–65535）", config.port));
            }

            // 端口占用预检：能绑定成功说明端口空闲，探测用的监听器随即释放
            let probe = std::net::TcpListener::bind(("127.0.0.1", config.port))
                .map_err(|e| format!("端口 {} 不可用: {}", config.port, e))?;
            drop(probe);

            let bin = locate_sidecar_binary().ok_or_else(|| "未找到反代服务程序".to_string())?;
            let mut cmd = Command::new(bin);
            cmd.env("GPD_PROXY_PORT", config.port.to_string())
                .env("GPD_PROXY_API_KEY", &config.api_key)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());

            let child = cmd.spawn().map_err(|e| format!("启动反代服务失败: {}", e))?;
            *self.child.lock().map_err(|e| e.to_string())? = Some(child);
            Ok(())
        }
    }

    fn stop_service(&self) -> impl Future<Output = Result<(), String>> + Send {
        async move {
            let child = self.child.lock().map_err(|e| e.to_string())?.take();

            match child {
                Some(mut child) => {
                    child.kill().map_err(|e| format!("终止反代服务失败: {}", e))?;
                    // 回收僵尸进程；终止信号已发出，等待失败不影响停止结果
                    let _ = child.wait();
                    Ok(())
                }
                None => Err("反代服务未在运行".to_string()),
            }
        }
    }

    fn generate_api_key(&self) -> impl Future<Output = Result<String, String>> + Send {
        async move { Ok(format!("sk-{}", uuid::Uuid::new_v4().simple())) }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 各服务测试共用的桥接测试桩

    use std::future::Future;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::models::config::{ApplicationConfig, ProxyDesiredConfig};
    use crate::models::status::RuntimeStatus;

    use super::ProxyBridge;

    /// 测试桥接：各操作的成败可编程，调用次数可断言
    pub(crate) struct MockBridge {
        /// `load_config` 返回的配置
        pub config: Mutex<ApplicationConfig>,
        /// `load_config` 是否失败
        pub load_fails: AtomicBool,
        /// `save_config` 是否失败
        pub save_fails: AtomicBool,
        /// 最近一次成功保存的配置（用于断言持久化内容）
        pub saved: Mutex<Option<ApplicationConfig>>,
        pub save_calls: AtomicUsize,
        /// `fetch_status` 返回的结果
        pub status: Mutex<Result<RuntimeStatus, String>>,
        pub status_calls: AtomicUsize,
        /// `start_service` 是否失败
        pub start_fails: AtomicBool,
        pub start_calls: AtomicUsize,
        /// 最近一次启动命令携带的期望配置
        pub started_with: Mutex<Option<ProxyDesiredConfig>>,
        /// `start_service` 返回前的人为延迟（用于构造转换在途的窗口）
        pub start_delay: Mutex<Option<Duration>>,
        /// `stop_service` 是否失败
        pub stop_fails: AtomicBool,
        pub stop_calls: AtomicUsize,
        /// `generate_api_key` 是否失败
        pub keygen_fails: AtomicBool,
        /// `generate_api_key` 返回的密钥
        pub next_key: Mutex<String>,
    }

    impl Default for MockBridge {
        fn default() -> Self {
            Self {
                config: Mutex::new(ApplicationConfig::default()),
                load_fails: AtomicBool::new(false),
                save_fails: AtomicBool::new(false),
                saved: Mutex::new(None),
                save_calls: AtomicUsize::new(0),
                status: Mutex::new(Ok(RuntimeStatus::default())),
                status_calls: AtomicUsize::new(0),
                start_fails: AtomicBool::new(false),
                start_calls: AtomicUsize::new(0),
                started_with: Mutex::new(None),
                start_delay: Mutex::new(None),
                stop_fails: AtomicBool::new(false),
                stop_calls: AtomicUsize::new(0),
                keygen_fails: AtomicBool::new(false),
                next_key: Mutex::new("sk-regenerated".to_string()),
            }
        }
    }

    impl ProxyBridge for MockBridge {
        fn load_config(&self) -> impl Future<Output = Result<ApplicationConfig, String>> + Send {
            async move {
                if self.load_fails.load(Ordering::SeqCst) {
                    return Err("存储不可读".to_string());
                }
                Ok(self.config.lock().unwrap().clone())
            }
        }

        fn save_config(
            &self,
            config: &ApplicationConfig,
        ) -> impl Future<Output = Result<(), String>> + Send {
            let config = config.clone();
            async move {
                self.save_calls.fetch_add(1, Ordering::SeqCst);
                if self.save_fails.load(Ordering::SeqCst) {
                    return Err("存储不可写".to_string());
                }
                *self.config.lock().unwrap() = config.clone();
                *self.saved.lock().unwrap() = Some(config);
                Ok(())
            }
        }

        fn fetch_status(
            &self,
            _port: u16,
        ) -> impl Future<Output = Result<RuntimeStatus, String>> + Send {
            async move {
                self.status_calls.fetch_add(1, Ordering::SeqCst);
                self.status.lock().unwrap().clone()
            }
        }

        fn start_service(
            &self,
            config: &ProxyDesiredConfig,
        ) -> impl Future<Output = Result<(), String>> + Send {
            let config = config.clone();
            async move {
                self.start_calls.fetch_add(1, Ordering::SeqCst);
                *self.started_with.lock().unwrap() = Some(config);
                let delay = *self.start_delay.lock().unwrap();
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if self.start_fails.load(Ordering::SeqCst) {
                    return Err("端口被占用".to_string());
                }
                Ok(())
            }
        }

        fn stop_service(&self) -> impl Future<Output = Result<(), String>> + Send {
            async move {
                self.stop_calls.fetch_add(1, Ordering::SeqCst);
                if self.stop_fails.load(Ordering::SeqCst) {
                    return Err("服务未在运行".to_string());
                }
                Ok(())
            }
        }

        fn generate_api_key(&self) -> impl Future<Output = Result<String, String>> + Send {
            async move {
                if self.keygen_fails.load(Ordering::SeqCst) {
                    return Err("生成失败".to_string());
                }
                Ok(self.next_key.lock().unwrap().clone())
            }
        }
    }
}
