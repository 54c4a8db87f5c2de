//! 意图路由：闲聊直接回，任务走 Plan-Execute
//!
//! 单次 LLM 调用分类，输出只认首词：trim 后大写以 CHAT 开头判为闲聊，
//! 其余一律按任务处理。分类调用失败也按任务处理 —— 误走 agent 通道的
//! 闲聊最多慢一点，误走 chat 通道的任务则直接丢失工具能力。

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};
use crate::prompts::{CHAT_PROMPT, ROUTER_PROMPT};

/// 用户输入的意图类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// 闲聊、问答，无需工具
    Chat,
    /// 需要规划与工具调用的任务
    Agent,
}

/// 分类用户输入；失败时落到 Agent
pub async fn classify_intent(llm: &dyn LlmClient, input: &str) -> Intent {
    let messages = vec![Message::system(ROUTER_PROMPT), Message::user(input)];
    match llm.chat(&messages, &[]).await {
        Ok(response) => {
            let verdict = response.content.trim().to_uppercase();
            if verdict.starts_with("CHAT") {
                Intent::Chat
            } else {
                Intent::Agent
            }
        }
        Err(e) => {
            tracing::warn!("[router] classify failed, defaulting to AGENT: {e}");
            Intent::Agent
        }
    }
}

/// 闲聊通道：不声明任何工具（声明了小模型就会幻觉调用）
pub async fn run_chat(llm: &dyn LlmClient, input: &str) -> Result<String, AgentError> {
    let messages = vec![Message::system(CHAT_PROMPT), Message::user(input)];
    let response = llm.chat(&messages, &[]).await?;
    Ok(response.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, MockLlmClient};

    #[tokio::test]
    async fn chat_verdict_is_case_and_whitespace_tolerant() {
        for reply in ["CHAT", "chat", "  Chat  ", "CHAT.\n"] {
            let llm = MockLlmClient::with_replies(vec![ChatResponse::text(reply)]);
            assert_eq!(classify_intent(&llm, "hi").await, Intent::Chat);
        }
    }

    #[tokio::test]
    async fn anything_else_is_agent() {
        for reply in ["AGENT", "TASK", "I think this is a task", ""] {
            let llm = MockLlmClient::with_replies(vec![ChatResponse::text(reply)]);
            assert_eq!(classify_intent(&llm, "create a file").await, Intent::Agent);
        }
    }

    #[tokio::test]
    async fn run_chat_uses_chat_prompt_without_tools() {
        let llm = MockLlmClient::with_replies(vec![ChatResponse::text("  hello there  ")]);
        let reply = run_chat(&llm, "hi").await.unwrap();
        assert_eq!(reply, "hello there");
        let requests = llm.requests();
        assert!(requests[0][0].content.contains("helpful"));
    }
}
