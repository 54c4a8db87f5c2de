//! Planner：环境快照与初始计划
//!
//! gather_snapshot 在规划前并发探测环境（已有表、工作区文件、已存备忘），
//! 让模型不做冗余动作（如重建已存在的表）；任务文本不含状态类关键词时整体跳过，
//! 省一轮探测延迟。make_plan 单次调用 LLM 产出编号计划文本，不做重试 ——
//! 解析出零步骤是合法结果，执行循环会以空清单运行。

use std::sync::OnceLock;
use std::time::Instant;

use futures_util::future::join_all;
use regex::Regex;
use serde_json::json;

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};
use crate::plan::{format_checklist, parse_steps, Step};
use crate::prompts::PLAN_PROMPT;
use crate::tools::ToolExecutor;

/// 含这些关键词的任务大概率依赖文件/数据库/备忘状态（中英双语）
fn state_keywords_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(file|database|\bdb\b|table|memo|memory|history|save|creat|write|文件|数据库|表|备忘|记忆|历史|保存|创建|写入)",
        )
        .expect("state keyword regex is valid")
    })
}

/// 只读环境探针：工具名、快照标签、调用参数。未注册的探针直接略过。
const PROBES: &[(&str, &str)] = &[
    ("list_tables", "SQLite tables"),
    ("list_directory", "Files in workspace"),
    ("list_memories", "Stored memories"),
];

fn probe_args(tool_name: &str) -> serde_json::Value {
    match tool_name {
        "list_directory" => json!({"path": "."}),
        _ => json!({}),
    }
}

/// 并发收集环境快照。单个探针失败只记录为 `(error: ...)`，从不向上传播。
pub async fn gather_snapshot(executor: &ToolExecutor, task: &str) -> String {
    if !task.is_empty() && !state_keywords_re().is_match(task) {
        tracing::info!("[gather_snapshot] skipped (no state keywords in task)");
        return "(state gathering skipped)".to_string();
    }

    let t0 = Instant::now();
    tracing::info!("[gather_snapshot] start (parallel)");

    let futures = PROBES
        .iter()
        .filter(|(name, _)| executor.contains(name))
        .map(|(name, label)| async move {
            match executor.execute(name, probe_args(name)).await {
                Ok(result) => format!("[{label}]\n{result}"),
                Err(e) => format!("[{label}]\n(error: {e})"),
            }
        });
    let parts: Vec<String> = join_all(futures).await;

    tracing::info!(
        "[gather_snapshot] done in {:.1}s",
        t0.elapsed().as_secs_f64()
    );
    if parts.is_empty() {
        "(no state available)".to_string()
    } else {
        parts.join("\n\n")
    }
}

/// prompt 中的 Available tools 段落（按名称排序保证稳定）
pub fn tool_descriptions(executor: &ToolExecutor) -> String {
    let mut pairs = executor.registry().tool_descriptions();
    pairs.sort();
    pairs
        .iter()
        .map(|(name, desc)| format!("- {name}: {desc}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 单次 LLM 调用产出计划文本（不绑定工具，模型只规划不执行）
pub async fn make_plan(
    task: &str,
    executor: &ToolExecutor,
    llm: &dyn LlmClient,
) -> Result<String, AgentError> {
    let snapshot = gather_snapshot(executor, task).await;
    let system = PLAN_PROMPT
        .replace("{current_state}", &snapshot)
        .replace("{tool_descriptions}", &tool_descriptions(executor));
    let messages = vec![Message::system(system), Message::user(task)];

    tracing::info!("[plan:llm] start");
    let t0 = Instant::now();
    let response = llm.chat(&messages, &[]).await?;
    tracing::info!("[plan:llm] done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(response.content)
}

/// 规划阶段：产出计划文本并解析为清单
pub async fn run_plan_phase(
    task: &str,
    executor: &ToolExecutor,
    llm: &dyn LlmClient,
) -> Result<Vec<Step>, AgentError> {
    let plan_text = make_plan(task, executor, llm).await?;
    let steps = parse_steps(&plan_text);
    tracing::info!("[plan]\n{}", format_checklist(&steps));
    Ok(steps)
}
