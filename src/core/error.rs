//! Agent 错误类型
//!
//! 执行循环内部的大多数故障（未知工具、工具报错、计划解析为空）都被就地转为
//! 文本结果或步骤状态，不走 Err 通道；只有 LLM 调用失败、配置错误等才向上传播。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误（LLM、工具、配置、路径逃逸等）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Metrics io error: {0}")]
    MetricsIo(#[from] std::io::Error),

    #[error("Path escape attempt: {0}")]
    PathEscape(String),

    #[error("Cancelled")]
    Cancelled,
}
