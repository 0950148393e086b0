//! # 模型目录
//!
//! 枚举反代服务支持的模型标识符及其展示元数据。
//! 目录在编译期固定，运行时不可变；前端用它渲染模型选择列表，
//! 连接示例生成器用它区分图像模型和纯文本模型。

use serde::Serialize;

/// 单个模型的描述信息
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface ModelDescriptor {
///   id: string;
///   displayName: string;
///   description: string;
///   icon: string;       // 符号化图标名，由前端解析为具体图标资源
///   ownedBy: string;
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// 模型标识符：客户端请求体中的 `model` 字段取值
    pub id: &'static str,

    /// 展示名称
    pub display_name: &'static str,

    /// 一句话描述
    pub description: &'static str,

    /// 符号化图标名
    pub icon: &'static str,

    /// 模型归属方
    pub owned_by: &'static str,
}

/// 反代服务支持的全部模型
///
/// 与服务端 `/v1/models` 返回的列表保持一致。
pub const MODEL_CATALOG: &[ModelDescriptor] = &[
    ModelDescriptor {
        id: "gemini-2.5-flash",
        display_name: "Gemini 2.5 Flash",
        description: "轻量快速的通用对话模型",
        icon: "zap",
        owned_by: "google",
    },
    ModelDescriptor {
        id: "gemini-2.5-flash-thinking",
        display_name: "Gemini 2.5 Flash Thinking",
        description: "带思维链输出的轻量对话模型",
        icon: "brain",
        owned_by: "google",
    },
    ModelDescriptor {
        id: "gemini-3-pro-low",
        display_name: "Gemini 3 Pro (Low)",
        description: "低推理强度的 Gemini 3 Pro",
        icon: "gauge",
        owned_by: "google",
    },
    ModelDescriptor {
        id: "gemini-3-pro-high",
        display_name: "Gemini 3 Pro (High)",
        description: "高推理强度的 Gemini 3 Pro",
        icon: "gauge-high",
        owned_by: "google",
    },
    ModelDescriptor {
        id: "gemini-3-pro-image",
        display_name: "Gemini 3 Pro Image",
        description: "支持图像生成的 Gemini 3 Pro，请求内容为多段结构化列表",
        icon: "image",
        owned_by: "google",
    },
    ModelDescriptor {
        id: "claude-sonnet-4-5",
        display_name: "Claude Sonnet 4.5",
        description: "Claude Sonnet 通用对话模型",
        icon: "feather",
        owned_by: "anthropic",
    },
    ModelDescriptor {
        id: "claude-sonnet-4-5-thinking",
        display_name: "Claude Sonnet 4.5 Thinking",
        description: "带思维链输出的 Claude Sonnet",
        icon: "brain",
        owned_by: "anthropic",
    },
    ModelDescriptor {
        id: "claude-opus-4-5-thinking",
        display_name: "Claude Opus 4.5 Thinking",
        description: "带思维链输出的 Claude Opus",
        icon: "sparkles",
        owned_by: "anthropic",
    },
];

/// 按标识符查找模型描述
pub fn find_model(id: &str) -> Option<&'static ModelDescriptor> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

/// 判断模型是否为图像模型
///
/// 图像模型的请求 `content` 必须是多段结构化列表（`[{type:"text", text}]`），
/// 纯文本模型则使用扁平字符串。区分仅依据模型标识符集合，不做运行时探测。
pub fn is_image_capable(model_id: &str) -> bool {
    matches!(model_id, "gemini-3-pro-image")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_capable_membership() {
        assert!(is_image_capable("gemini-3-pro-image"));
        assert!(!is_image_capable("gemini-2.5-flash"));
        assert!(!is_image_capable("claude-sonnet-4-5"));
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = MODEL_CATALOG.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), MODEL_CATALOG.len());
    }

    #[test]
    fn test_find_model() {
        assert_eq!(
            find_model("gemini-2.5-flash").unwrap().display_name,
            "Gemini 2.5 Flash"
        );
        assert!(find_model("gpt-4").is_none());
    }
}
