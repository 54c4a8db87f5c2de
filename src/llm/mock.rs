//! Mock LLM 客户端（用于测试，无需 Ollama）
//!
//! 按脚本顺序弹出预置回复；脚本耗尽时回显最后一条 User 消息，便于本地跑通流程。
//! 同时记录每次 chat 收到的完整消息历史，供测试断言 prompt 内容。

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::llm::{ChatResponse, LlmClient, Message, Role, ToolSpec};

/// Mock 客户端：脚本化回复 + 请求记录
#[derive(Default)]
pub struct MockLlmClient {
    replies: Mutex<Vec<ChatResponse>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置回复脚本，按先后顺序消费
    pub fn with_replies(replies: Vec<ChatResponse>) -> Self {
        let mut replies = replies;
        replies.reverse(); // pop 从尾部取
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的请求历史（每项为一次 chat 的完整消息列表）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<ChatResponse, AgentError> {
        self.requests
            .lock()
            .expect("mock lock poisoned")
            .push(messages.to_vec());

        if let Some(reply) = self.replies.lock().expect("mock lock poisoned").pop() {
            return Ok(reply);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(ChatResponse::text(format!("Echo from Mock: {last_user}")))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
