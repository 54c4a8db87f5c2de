//! Prompt 常量与任务消息拼装
//!
//! 针对小模型的约束写法：明确单工具单轮、给出正确参数名示例，降低幻觉率。

/// 意图门控：一次性分类，CHAT 走闲聊通道，AGENT 进入规划/执行引擎
pub const ROUTER_PROMPT: &str = "\
You are an input classifier. Decide if the user's message needs tool use.

CHAT — no tools needed: greetings, casual conversation, thanks, opinions,
follow-up questions about a previous answer.

AGENT — tool use required: search, file operations, calculations, data
retrieval, code writing, date/time lookup, or any action-oriented request.

Reply with exactly one word: CHAT or AGENT";

/// 闲聊通道。这里不声明任何工具：对 mistral 这类指令跟随模型，
/// 工具说明本身就会诱发幻觉 tool call。
pub const CHAT_PROMPT: &str = "\
You are a friendly and helpful AI assistant. Answer directly and concisely.";

/// 执行循环的 system prompt
pub const SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant with access to external tools.
Rules:
1. Always use tools — never just describe what you would do.
2. Call ONE tool at a time and wait for the result before calling the next.
3. Follow the execution plan step by step until all steps are complete.

## Tool call examples (correct argument names)

Example 1 — Run a shell command:
{"name": "execute_command", "arguments": {"command": "python3 hello.py", "cwd": "."}}

Example 2 — Write a file:
{"name": "write_file", "arguments": {"path": "hello.py", "content": "print('hello')"}}

IMPORTANT: Use EXACTLY the declared argument names. Do NOT use "cmd", "dir",
"filepath", "text", or any other variant."#;

/// 初始规划 prompt；{current_state} / {tool_descriptions} 由 Planner 填充
pub const PLAN_PROMPT: &str = "\
You are a task planner. Given a user request, the current system state, \
and available tools, output a concrete numbered execution plan.
For each step, write: <number>. <tool_name>: <what to do>
Be specific about arguments. Do NOT execute — only plan.
Use the current state information to make informed decisions \
(e.g. don't create a table that already exists).

Current system state:
{current_state}

Available tools:
{tool_descriptions}";

/// 重规划 prompt；只覆盖未完成工作，绝不重复已完成步骤
pub const REPLAN_PROMPT: &str = "\
You are a task planner. The execution encountered failures.
Review the checklist below and create a REVISED plan for the REMAINING steps only.
ABSOLUTE RULES:
- Do NOT re-include already completed (✅) steps under any circumstances.
- Fix the approach for failed (❌) steps based on the error details.
- If a tool failed repeatedly, choose a DIFFERENT tool or method.

Available tools:
{tool_descriptions}";

use crate::plan::{format_checklist, Step, StepStatus};

/// 拼装执行循环的任务消息：任务 + 当前清单 + 剩余步骤数
pub fn task_message(task: &str, steps: &[Step]) -> String {
    let checklist = format_checklist(steps);
    let pending = steps
        .iter()
        .filter(|s| s.status == StepStatus::Pending)
        .count();
    format!(
        "Task: {task}\n\n\
         Execution checklist ({pending} steps remaining):\n{checklist}\n\n\
         IMPORTANT: Execute the ⏳ steps one by one using tools. \
         Do NOT give a final answer until all steps are ✅."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Step;

    #[test]
    fn task_message_counts_pending_steps() {
        let mut done = Step::new(1, "1. done");
        done.status = StepStatus::Done;
        let steps = vec![done, Step::new(2, "2. todo"), Step::new(3, "3. todo")];
        let msg = task_message("do things", &steps);
        assert!(msg.contains("Task: do things"));
        assert!(msg.contains("(2 steps remaining)"));
        assert!(msg.contains("✅ 1. done"));
    }
}
