//! # 控制面错误分类
//!
//! 定义控制面所有可失败操作的错误分类（taxonomy）。
//! 每个错误都是局部可恢复的：失败不影响已有状态，不会导致进程退出。
//!
//! 在 Tauri command 边界统一转换为 `String` 返回给前端
//! （`Result<T, String>`），服务层内部则使用具名变体做分支判断。

/// 控制面统一错误类型
///
/// 各变体与失败场景的对应关系：
/// - `ConfigUnavailable` - 配置加载失败，控制面没有期望状态，
///   所有依赖配置的操作被禁用，直到下一次加载成功
/// - `PersistFailed` - 配置保存失败，内存镜像保持在上一次已知良好状态
/// - `OperationFailed` - 启停命令被后端拒绝，生命周期回退到转换前的稳定状态
/// - `Busy` - 已有转换在途，本次操作被拒绝（不排队）
/// - `KeyGenerationFailed` - 密钥重新生成中止，原密钥继续有效
/// - `InvalidPatch` - 配置补丁不合法（端口越界、运行期间修改端口等），
///   整个补丁被拒绝，不做部分应用
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("配置不可用: {0}")]
    ConfigUnavailable(String),

    #[error("配置保存失败: {0}")]
    PersistFailed(String),

    #[error("操作失败: {reason}")]
    OperationFailed { reason: String },

    #[error("已有操作正在进行中")]
    Busy,

    #[error("API 密钥生成失败: {0}")]
    KeyGenerationFailed(String),

    #[error("无效的配置修改: {0}")]
    InvalidPatch(String),
}

/// 控制面操作的统一 Result 别名
pub type ControlResult<T> = Result<T, ControlError>;
