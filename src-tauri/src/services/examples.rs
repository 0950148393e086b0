//! # 连接示例生成服务
//!
//! 根据当前状态和配置为指定模型生成客户端连接示例。
//! 纯函数、无副作用：相同输入永远产生相同输出，不触碰任何外部状态。
//!
//! ## 取值规则
//! - 端口：服务运行中时优先使用**实际**监听端口（轮询观测值），
//!   否则回退到期望配置的端口；配置也不可用时使用默认端口 8045
//! - 密钥：取期望配置中的 API 密钥；配置不可用时使用占位符
//! - 请求内容：图像模型使用多段结构化列表，纯文本模型使用扁平字符串

use serde::Serialize;

use crate::models::catalog;
use crate::models::config::{ApplicationConfig, DEFAULT_PORT};
use crate::models::status::RuntimeStatus;

/// 配置不可用时示例中的密钥占位符
pub const API_KEY_PLACEHOLDER: &str = "<your-api-key>";

/// 一组客户端连接示例
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface ClientExamples {
///   baseUrl: string;
///   modelsUrl: string;
///   requestSnippet: string;  // curl 请求示例
///   clientSnippet: string;   // Python (OpenAI SDK) 客户端示例
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientExamples {
    /// 服务基础地址
    pub base_url: String,

    /// 模型列表接口地址
    pub models_url: String,

    /// curl 请求示例
    pub request_snippet: String,

    /// Python (OpenAI SDK) 客户端示例
    pub client_snippet: String,
}

/// 生成指定模型的连接示例
///
/// # 参数
/// - `model_id` - 模型标识符（决定请求内容的结构）
/// - `status` - 最近观测到的实际运行状态
/// - `config` - 当前应用配置；`None` 表示配置尚未加载
pub fn generate(
    model_id: &str,
    status: &RuntimeStatus,
    config: Option<&ApplicationConfig>,
) -> ClientExamples {
    // 实际状态优先于期望状态：运行中的服务端口才是真正在监听的端口
    let port = if status.running {
        status.port
    } else {
        config.map(|c| c.proxy.port).unwrap_or(DEFAULT_PORT)
    };

    let api_key = config
        .map(|c| c.proxy.api_key.clone())
        .unwrap_or_else(|| API_KEY_PLACEHOLDER.to_string());

    let base_url = format!("http://localhost:{}", port);
    let models_url = format!("{}/v1/models", base_url);

    let body = request_body(model_id);
    let request_snippet = format!(
        "curl {base}/v1/chat/completions \\\n  -H \"Content-Type: application/json\" \\\n  -H \"Authorization: Bearer {key}\" \\\n  -d '{body}'",
        base = base_url,
        key = api_key,
        body = body,
    );

    let messages = messages_literal(model_id);
    let client_snippet = format!(
        "from openai import OpenAI\n\nclient = OpenAI(base_url=\"{base}/v1\", api_key=\"{key}\")\nresp = client.chat.completions.create(\n    model=\"{model}\",\n    messages={messages},\n)\nprint(resp.choices[0].message.content)",
        base = base_url,
        key = api_key,
        model = model_id,
        messages = messages,
    );

    ClientExamples {
        base_url,
        models_url,
        request_snippet,
        client_snippet,
    }
}

/// 构造 curl 示例的 JSON 请求体
///
/// 图像模型的 `content` 是多段结构化列表，纯文本模型是扁平字符串。
fn request_body(model_id: &str) -> String {
    let content = if catalog::is_image_capable(model_id) {
        serde_json::json!([{ "type": "text", "text": "画一只在屋顶晒太阳的橘猫" }])
    } else {
        serde_json::json!("你好，介绍一下你自己")
    };

    serde_json::json!({
        "model": model_id,
        "messages": [{ "role": "user", "content": content }]
    })
    .to_string()
}

/// 构造 Python 示例的 messages 字面量
fn messages_literal(model_id: &str) -> String {
    if catalog::is_image_capable(model_id) {
        format!(
            "[{{\"role\": \"user\", \"content\": [{{\"type\": \"text\", \"text\": \"{}\"}}]}}]",
            "画一只在屋顶晒太阳的橘猫"
        )
    } else {
        format!("[{{\"role\": \"user\", \"content\": \"{}\"}}]", "你好，介绍一下你自己")
    }
}
