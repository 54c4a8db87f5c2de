//! 会话级集成测试：走 Agent 公开 API，覆盖路由、规划、修复、replan 与指标落盘

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use forager::agent::{build_default_toolset, Agent};
use forager::config::AppConfig;
use forager::llm::{ChatResponse, MockLlmClient};
use forager::tools::ToolExecutor;

fn make_agent(replies: Vec<ChatResponse>, workspace: &Path) -> (Agent, Arc<MockLlmClient>) {
    let cfg = AppConfig::default();
    let llm = Arc::new(MockLlmClient::with_replies(replies));
    let registry = build_default_toolset(&cfg, workspace);
    let executor = ToolExecutor::new(registry, cfg.tools.tool_timeout_secs);
    let agent = Agent::new(
        llm.clone(),
        executor,
        cfg.session.clone(),
        workspace.join("logs/metrics.jsonl"),
    );
    (agent, llm)
}

/// 失败步骤触发 replan，新计划用幻觉工具名继续，修复层兜底后任务完成
#[tokio::test]
async fn recovers_from_failure_via_replan_with_repair() {
    let dir = tempfile::tempdir().unwrap();
    let (agent, llm) = make_agent(
        vec![
            // 路由
            ChatResponse::text("AGENT"),
            // 初始规划：第一步注定失败（data.txt 不存在）
            ChatResponse::text(
                "1. read_file: read data.txt\n2. write_file: copy its content to copy.txt",
            ),
            // 执行：read_file 失败
            ChatResponse::tool_call("read_file", json!({"path": "data.txt"})),
            // replan：放弃读取，直接写兜底内容
            ChatResponse::text("1. write_file: create copy.txt with fallback content"),
            // 幻觉工具名 create_file + 错误参数名 file，应被修复为 write_file/path
            ChatResponse::tool_call(
                "create_file",
                json!({"file": "copy.txt", "content": "fallback"}),
            ),
            // 终答
            ChatResponse::text("copy.txt created with fallback content."),
        ],
        dir.path(),
    );

    let answer = agent
        .run("copy data.txt to copy.txt in the workspace")
        .await
        .unwrap();
    assert_eq!(answer.as_deref(), Some("copy.txt created with fallback content."));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("copy.txt")).unwrap(),
        "fallback"
    );

    // replan prompt 带着失败清单与执行历史
    let requests = llm.requests();
    assert_eq!(requests.len(), 6);
    let replan_user = requests[3].last().unwrap();
    assert!(replan_user.content.contains("Current checklist:"));
    assert!(replan_user.content.contains("❌"));
    assert!(replan_user.content.contains("read_file"));

    // 指标：一行 JSONL，记录了 1 次工具名纠正
    let metrics_raw = std::fs::read_to_string(dir.path().join("logs/metrics.jsonl")).unwrap();
    let lines: Vec<&str> = metrics_raw.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["tool_name_fixes"], 1);
    assert_eq!(record["step_completion_rate"], 1.0);
}

/// 闲聊输入不应触碰规划或工具
#[tokio::test]
async fn chat_input_bypasses_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let (agent, llm) = make_agent(
        vec![
            ChatResponse::text("CHAT"),
            ChatResponse::text("Doing great, thanks for asking!"),
        ],
        dir.path(),
    );

    let answer = agent.run("how are you today?").await.unwrap();
    assert_eq!(answer.as_deref(), Some("Doing great, thanks for asking!"));
    assert_eq!(llm.requests().len(), 2);
    // 没有会话指标落盘
    assert!(!dir.path().join("logs/metrics.jsonl").exists());
}

/// 备忘工具经由引擎写入 workspace/memories.json
#[tokio::test]
async fn memory_tools_persist_to_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let (agent, _llm) = make_agent(
        vec![
            ChatResponse::text("AGENT"),
            ChatResponse::text("1. remember: store the user's favorite color"),
            ChatResponse::tool_call(
                "remember",
                json!({"key": "favorite_color", "value": "teal"}),
            ),
            ChatResponse::text("Remembered."),
        ],
        dir.path(),
    );

    let answer = agent.run("remember my favorite color is teal").await.unwrap();
    assert_eq!(answer.as_deref(), Some("Remembered."));

    let raw = std::fs::read_to_string(dir.path().join("memories.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["favorite_color"], "teal");
}
