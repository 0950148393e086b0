//! # 模型目录与连接示例 Tauri Commands
//!
//! - `list_models` - 枚举支持的模型及展示元数据
//! - `build_client_examples` - 为指定模型生成客户端连接示例

use tauri::State;

use crate::models::catalog::{self, ModelDescriptor};
use crate::services::control_plane::AppControl;
use crate::services::examples::{self, ClientExamples};

/// 枚举支持的模型
///
/// 目录在编译期固定；前端据此渲染模型选择列表。
#[tauri::command]
pub async fn list_models() -> Vec<ModelDescriptor> {
    catalog::MODEL_CATALOG.to_vec()
}

/// 为指定模型生成客户端连接示例
///
/// 使用最近观测到的实际状态和当前配置快照生成；
/// 服务运行中时示例指向实际监听端口，否则指向期望端口。
///
/// # 参数
/// - `model_id` - 模型标识符，必须在模型目录中
///
/// # 返回值
/// 返回一组连接示例（curl 请求、Python 客户端片段等）
///
/// # 错误
/// 模型标识符不在目录中时返回错误
#[tauri::command]
pub async fn build_client_examples(
    model_id: String,
    plane: State<'_, AppControl>,
) -> Result<ClientExamples, String> {
    if catalog::find_model(&model_id).is_none() {
        return Err(format!("未知模型: {}", model_id));
    }

    let status = plane.latest_status();
    let config = plane.config.current();
    Ok(examples::generate(&model_id, &status, config.as_ref()))
}
