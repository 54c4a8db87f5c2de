//! Forager - 面向小模型的 Plan-Execute 工具调用引擎
//!
//! 小模型（7B 量级）的函数调用不可靠：编造工具名、写错参数名、提前给终答。
//! Forager 不追求换更大的模型，而是在引擎侧补偿：
//!
//! - `router`：意图门控，闲聊不进引擎
//! - `plan`：状态探测 + 初始规划 + 失败后重规划
//! - `repair`：别名表与相似度兜底的工具名/参数名纠正
//! - `exec`：单游标执行循环、错误判定与看门狗
//! - `metrics`：会话级 JSONL 指标（纠正率、步骤完成率）
//! - `tools`：注册表、带超时审计的执行器与内置工具
//! - `llm`：Ollama 客户端与测试用 Mock

pub mod agent;
pub mod config;
pub mod core;
pub mod exec;
pub mod llm;
pub mod metrics;
pub mod observability;
pub mod plan;
pub mod prompts;
pub mod repair;
pub mod router;
pub mod tools;
