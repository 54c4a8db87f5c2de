//! 执行循环：单游标推进清单的 Plan-Execute 主体
//!
//! 每回合一次 LLM 调用，至多取第一条工具调用执行（多余的丢弃，小模型并行调用
//! 的参数质量不可靠）。工具名与参数先过 repair 层再落地执行，结果按分类器判定
//! 成败：成功则当前步 ✅ 并推进游标，失败则 ❌ 停在原地等待 replan。
//!
//! 终止路径只有三条：清单走完后模型给出终答（Completed）、replan 预算耗尽后的
//! 提前终答（Completed）、回合预算耗尽（Exhausted）。取消令牌触发时返回 Err。

use std::sync::OnceLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::config::SessionSection;
use crate::core::AgentError;
use crate::exec::classifier::{MarkerClassifier, ResultClassifier};
use crate::exec::watchdog::Watchdog;
use crate::llm::{LlmClient, Message, ToolCallRequest};
use crate::metrics::{MetricsLogger, TurnRecord};
use crate::plan::replan::apply_replan;
use crate::plan::{format_checklist, Step, StepStatus};
use crate::prompts::{task_message, SYSTEM_PROMPT};
use crate::repair::{fix_args, fix_tool_name};
use crate::tools::ToolExecutor;

/// 执行循环的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// 模型给出终答（清单可能未全 ✅，replan 预算耗尽时也走这里）
    Completed(String),
    /// 回合预算耗尽，未拿到终答
    Exhausted,
}

/// 一次会话的执行上下文：LLM、工具、预算与错误判定策略
pub struct ExecSession<'a> {
    llm: &'a dyn LlmClient,
    executor: &'a ToolExecutor,
    limits: &'a SessionSection,
    classifier: Box<dyn ResultClassifier>,
    cancel: CancellationToken,
}

impl<'a> ExecSession<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        executor: &'a ToolExecutor,
        limits: &'a SessionSection,
    ) -> Self {
        Self {
            llm,
            executor,
            limits,
            classifier: Box::new(MarkerClassifier),
            cancel: CancellationToken::new(),
        }
    }

    /// 替换错误判定策略（默认标记子串判定）
    pub fn with_classifier(mut self, classifier: Box<dyn ResultClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// 挂接外部取消令牌（如 Ctrl+C）
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// 执行循环主体。steps 为规划阶段产出的清单，metrics 在终态时落盘。
pub async fn run_exec_loop(
    session: &ExecSession<'_>,
    task: &str,
    mut steps: Vec<Step>,
    metrics: &mut MetricsLogger,
) -> Result<ExecOutcome, AgentError> {
    let mut messages = vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(task_message(task, &steps)),
    ];
    let mut history: Vec<String> = Vec::new();
    let mut watchdog = Watchdog::new();
    let mut cursor = 0usize;
    let mut consecutive_failures: u32 = 0;
    let mut replan_count: u32 = 0;

    for turn in 1..=session.limits.max_turns {
        if session.cancel.is_cancelled() {
            tracing::info!("[exec] cancelled at turn {turn}");
            return Err(AgentError::Cancelled);
        }

        let specs = session.executor.registry().to_tool_specs();
        let response = session.llm.chat(&messages, &specs).await?;

        let Some(mut call) = response.tool_calls.into_iter().next() else {
            // 无工具调用：要么终答，要么提前终止
            metrics.log_turn(TurnRecord {
                turn,
                tool_called: false,
                ..Default::default()
            });

            let pending = steps.iter().any(|s| s.status == StepStatus::Pending);
            if (pending || consecutive_failures > 0) && replan_count < session.limits.max_replans {
                tracing::warn!(
                    "[exec] premature final answer at turn {turn}, replanning ({} pending)",
                    steps.iter().filter(|s| s.status == StepStatus::Pending).count()
                );
                let (merged, new_cursor) = apply_replan(
                    task,
                    &steps,
                    &history,
                    session.executor,
                    session.llm,
                    &watchdog.hint(),
                    session.limits.history_window,
                )
                .await?;
                steps = merged;
                cursor = new_cursor;
                replan_count += 1;
                consecutive_failures = 0;
                messages = vec![
                    Message::system(SYSTEM_PROMPT),
                    Message::user(task_message(task, &steps)),
                ];
                continue;
            }

            let answer = sanitize(&response.content);
            if let Err(e) = metrics.write_summary(&steps) {
                tracing::warn!("[metrics] summary write failed: {e}");
            }
            return Ok(ExecOutcome::Completed(answer));
        };

        // repair：先纠工具名，再按目标 schema 纠参数名
        let name_fix = fix_tool_name(&mut call, session.executor.registry());
        if let Some(fix) = &name_fix {
            tracing::warn!("[repair] tool name: {fix}");
        }
        let arg_fixes = fix_args(&mut call, session.executor.registry());
        for fix in &arg_fixes {
            tracing::warn!("[repair] arg: {fix}");
        }

        messages.push(Message::assistant_tool_call(
            response.content.clone(),
            call.clone(),
        ));

        let (result, is_error) = invoke_tool(session, &call).await;

        metrics.log_turn(TurnRecord {
            turn,
            tool_called: true,
            tool_name: Some(call.name.clone()),
            tool_name_fix: name_fix.map(|f| f.to_string()),
            arg_fixes,
            is_error: Some(is_error),
        });

        let err_prefix = if is_error { "ERROR: " } else { "" };
        history.push(format!(
            "{}({}) → {err_prefix}{}",
            call.name,
            call.arguments,
            truncate(&result, 200)
        ));
        messages.push(Message::tool(result.clone(), call.id.clone()));

        update_step(&mut steps, &mut cursor, is_error, &result);
        tracing::info!("[checklist]\n{}", format_checklist(&steps));

        if is_error {
            consecutive_failures += 1;
            watchdog.record_failure(&call.name);

            if consecutive_failures >= session.limits.max_failures_before_replan
                && replan_count < session.limits.max_replans
            {
                tracing::warn!(
                    "[exec] {consecutive_failures} consecutive failure(s), replanning \
                     ({}/{})",
                    replan_count + 1,
                    session.limits.max_replans
                );
                let (merged, new_cursor) = apply_replan(
                    task,
                    &steps,
                    &history,
                    session.executor,
                    session.llm,
                    &watchdog.hint(),
                    session.limits.history_window,
                )
                .await?;
                steps = merged;
                cursor = new_cursor;
                replan_count += 1;
                consecutive_failures = 0;
                messages = vec![
                    Message::system(SYSTEM_PROMPT),
                    Message::user(task_message(task, &steps)),
                ];
            }
        } else {
            consecutive_failures = 0;
        }
    }

    tracing::warn!("[exec] turn budget exhausted ({} turns)", session.limits.max_turns);
    if let Err(e) = metrics.write_summary(&steps) {
        tracing::warn!("[metrics] summary write failed: {e}");
    }
    Ok(ExecOutcome::Exhausted)
}

/// 执行单条工具调用，返回（结果文本, 是否失败）。
/// 未知工具与执行错误都转为文本喂回模型，不中断循环。
async fn invoke_tool(session: &ExecSession<'_>, call: &ToolCallRequest) -> (String, bool) {
    if !session.executor.contains(&call.name) {
        let mut names = session.executor.tool_names();
        names.sort();
        return (
            format!(
                "Error: Unknown tool '{}'. Available tools: {}",
                call.name,
                names.join(", ")
            ),
            true,
        );
    }
    match session.executor.execute(&call.name, call.arguments.clone()).await {
        Ok(result) => {
            let is_error = session.classifier.is_error(&result);
            (result, is_error)
        }
        Err(e) => (format!("Tool error: {e}"), true),
    }
}

/// 按游标更新清单：成功 ✅ 并前移，失败 ❌ 停留；游标越界则不动
fn update_step(steps: &mut [Step], cursor: &mut usize, is_error: bool, result: &str) {
    let Some(step) = steps.get_mut(*cursor) else {
        return;
    };
    if is_error {
        step.status = StepStatus::Failed;
        step.note = truncate(result, 120);
    } else {
        step.status = StepStatus::Done;
        step.note = truncate(result, 80);
        *cursor += 1;
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn tool_call_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<tool_call>.*?</tool_call>").expect("regex is valid"))
}

fn json_call_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*\{"name":"#).expect("regex is valid"))
}

/// 清洗终答文本：剥掉模型泄漏进正文的 `<tool_call>` 块与裸 JSON 调用行
pub fn sanitize(text: &str) -> String {
    let without_blocks = tool_call_block_re().replace_all(text, "");
    without_blocks
        .lines()
        .filter(|line| !json_call_line_re().is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
