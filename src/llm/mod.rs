//! LLM 层：客户端抽象与实现（Ollama / Mock）

pub mod message;
pub mod mock;
pub mod ollama;
pub mod traits;

pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use ollama::OllamaClient;
pub use traits::{ChatResponse, LlmClient, ToolCallRequest, ToolSpec};
