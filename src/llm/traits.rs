//! LLM 客户端抽象
//!
//! 后端（Ollama / Mock）实现 LlmClient::chat：输入完整消息历史与声明的工具集，
//! 返回自由文本或至少一个 Tool Call 请求。引擎每轮只采纳第一个 Tool Call。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AgentError;
use crate::llm::Message;

/// 向 LLM 声明的工具：名称、一行描述、参数 JSON Schema
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 模型提出的一次工具调用（名称可能是幻觉，交由修复层纠正）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// 一次 chat 调用的结果：自由文本，或若干 Tool Call 请求
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.into(),
                arguments,
            }],
        }
    }
}

/// LLM 客户端 trait：带工具声明的对话补全
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 对话补全；不需要工具时传空 slice
    async fn chat(&self, messages: &[Message], tools: &[ToolSpec])
        -> Result<ChatResponse, AgentError>;

    /// 模型标识（写入 metrics 记录）
    fn model_name(&self) -> &str {
        "unknown"
    }
}
