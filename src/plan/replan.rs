//! Replanner：停滞/失败后的修正规划
//!
//! 触发条件由执行循环判定（连续失败达到阈值，或清单未完成时模型提前给出终答）。
//! replan 把渲染后的清单、最近一段执行历史与可选的看门狗提示交给 LLM，要求只
//! 覆盖未完成工作。合并策略：已完成步骤原样保留在前，新步骤全部 pending 接在后，
//! 游标指向第一个新步骤；失败步骤被丢弃 —— 期望模型换一种做法，而不是重试原文。

use std::time::Instant;

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};
use crate::plan::planner::tool_descriptions;
use crate::plan::{format_checklist, parse_steps, Step, StepStatus};
use crate::prompts::REPLAN_PROMPT;
use crate::tools::ToolExecutor;

/// 单次 LLM 调用产出修正计划文本
pub async fn replan(
    task: &str,
    steps: &[Step],
    history: &[String],
    executor: &ToolExecutor,
    llm: &dyn LlmClient,
    watchdog_hint: &str,
    history_window: usize,
) -> Result<String, AgentError> {
    let checklist = format_checklist(steps);
    let recent = if history.len() > history_window {
        &history[history.len() - history_window..]
    } else {
        history
    };
    let history_text = recent.join("\n");

    let watchdog_block = if watchdog_hint.is_empty() {
        String::new()
    } else {
        format!("{watchdog_hint}\n\n")
    };

    let system = REPLAN_PROMPT.replace("{tool_descriptions}", &tool_descriptions(executor));
    let user = format!(
        "{watchdog_block}Original task: {task}\n\n\
         Current checklist:\n{checklist}\n\n\
         Recent execution history:\n{history_text}\n\n\
         Create a revised plan for the remaining ⏳ and ❌ steps only."
    );
    let messages = vec![Message::system(system), Message::user(user)];

    tracing::info!("[replan:llm] start");
    let t0 = Instant::now();
    let response = llm.chat(&messages, &[]).await?;
    tracing::info!("[replan:llm] done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(response.content)
}

/// 执行一次 replan 并合并清单，返回 (合并后清单, 新游标)
pub async fn apply_replan(
    task: &str,
    steps: &[Step],
    history: &[String],
    executor: &ToolExecutor,
    llm: &dyn LlmClient,
    watchdog_hint: &str,
    history_window: usize,
) -> Result<(Vec<Step>, usize), AgentError> {
    let new_plan_text = replan(
        task,
        steps,
        history,
        executor,
        llm,
        watchdog_hint,
        history_window,
    )
    .await?;
    let new_steps = parse_steps(&new_plan_text);

    let mut merged: Vec<Step> = steps
        .iter()
        .filter(|s| s.status == StepStatus::Done)
        .cloned()
        .collect();
    let cursor = merged.len();
    merged.extend(new_steps);

    tracing::info!("[replan]\n{}", format_checklist(&merged));
    Ok((merged, cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, MockLlmClient, Role};
    use crate::tools::{ToolExecutor, ToolRegistry};

    fn executor() -> ToolExecutor {
        ToolExecutor::new(ToolRegistry::new(), 5)
    }

    fn step(number: u32, text: &str, status: StepStatus, note: &str) -> Step {
        let mut s = Step::new(number, text);
        s.status = status;
        s.note = note.to_string();
        s
    }

    #[tokio::test]
    async fn merge_keeps_done_steps_and_resets_cursor() {
        let existing = vec![
            step(1, "1. already done", StepStatus::Done, "ok"),
            step(2, "2. failed step", StepStatus::Failed, "err"),
            step(3, "3. pending step", StepStatus::Pending, ""),
        ];
        let llm = MockLlmClient::with_replies(vec![ChatResponse::text(
            "1. revised step A\n2. revised step B",
        )]);

        let (merged, cursor) = apply_replan("do task", &existing, &[], &executor(), &llm, "", 10)
            .await
            .unwrap();

        // done (1) + new (2) = 3；失败与 pending 的旧步骤被丢弃
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].status, StepStatus::Done);
        assert_eq!(merged[0].text, "1. already done");
        assert_eq!(cursor, 1);
        assert_eq!(merged[1].text, "1. revised step A");
        assert_eq!(merged[1].status, StepStatus::Pending);
        assert_eq!(merged[2].text, "2. revised step B");
    }

    #[tokio::test]
    async fn replan_prompt_contains_checklist_and_history_window() {
        let existing = vec![step(1, "1. failed step", StepStatus::Failed, "boom")];
        let history: Vec<String> = (1..=15).map(|i| format!("entry-{i}")).collect();
        let llm = MockLlmClient::with_replies(vec![ChatResponse::text("1. retry differently")]);

        apply_replan("my task", &existing, &history, &executor(), &llm, "", 10)
            .await
            .unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let user = requests[0]
            .iter()
            .find(|m| m.role == Role::User)
            .unwrap()
            .content
            .clone();
        assert!(user.contains("Original task: my task"));
        assert!(user.contains("❌ 1. failed step"));
        // 只保留最近 10 条历史
        assert!(user.contains("entry-15"));
        assert!(user.contains("entry-6"));
        assert!(!user.contains("entry-5\n"));
        assert!(!user.contains("[WATCHDOG]"));
    }

    #[tokio::test]
    async fn replan_prompt_prepends_watchdog_hint() {
        let existing = vec![step(1, "1. failed step", StepStatus::Failed, "boom")];
        let llm = MockLlmClient::with_replies(vec![ChatResponse::text("1. another way")]);

        apply_replan(
            "my task",
            &existing,
            &[],
            &executor(),
            &llm,
            "[WATCHDOG] stop using query",
            10,
        )
        .await
        .unwrap();

        let requests = llm.requests();
        let user = &requests[0]
            .iter()
            .find(|m| m.role == Role::User)
            .unwrap()
            .content;
        assert!(user.starts_with("[WATCHDOG] stop using query"));
    }

    #[tokio::test]
    async fn unparseable_replan_yields_done_steps_only() {
        let existing = vec![
            step(1, "1. already done", StepStatus::Done, "ok"),
            step(2, "2. failed step", StepStatus::Failed, "err"),
        ];
        let llm = MockLlmClient::with_replies(vec![ChatResponse::text("no numbered lines here")]);

        let (merged, cursor) = apply_replan("task", &existing, &[], &executor(), &llm, "", 10)
            .await
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(cursor, 1);
    }
}
