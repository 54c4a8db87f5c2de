//! 对话消息
//!
//! 角色与 LLM API 对齐（system / user / assistant / tool）；assistant 消息可携带
//! 已发出的 Tool Call，tool 消息通过 tool_call_id 与之关联。

use serde::{Deserialize, Serialize};

use crate::llm::ToolCallRequest;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// assistant 消息携带的 Tool Call（本引擎每轮只保留一个）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// tool 消息对应的调用 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// assistant 消息 + 本轮实际采纳的那个 Tool Call
    pub fn assistant_tool_call(content: impl Into<String>, call: ToolCallRequest) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: vec![call],
            tool_call_id: None,
        }
    }

    /// 工具结果消息，关联到发出它的调用 id
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}
