//! Agent 编排：路由 → 规划 → 执行
//!
//! Agent 持有 LLM 客户端与工具执行器，每次 run 对应一个会话：先意图分类，
//! 闲聊直接回，任务则走 Plan-Execute 引擎并落一条 metrics 记录。
//! 空计划（模型没产出可解析步骤）不进执行循环，降级为闲聊回答。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, SessionSection};
use crate::core::AgentError;
use crate::exec::{run_exec_loop, ExecOutcome, ExecSession};
use crate::llm::LlmClient;
use crate::metrics::MetricsLogger;
use crate::plan::planner::run_plan_phase;
use crate::router::{classify_intent, run_chat, Intent};
use crate::tools::{
    CurrentDatetimeTool, ExecuteCommandTool, ForgetTool, ListDirectoryTool, ListMemoriesTool,
    MemoryStore, ReadFileTool, RecallTool, RememberTool, ToolExecutor, ToolRegistry, WriteFileTool,
};

/// 组装内置工具集：文件、Shell、时钟、备忘（备忘数据落在工作区 memories.json）
pub fn build_default_toolset(cfg: &AppConfig, workspace: &Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ReadFileTool::new(workspace));
    registry.register(WriteFileTool::new(workspace));
    registry.register(ListDirectoryTool::new(workspace));
    registry.register(ExecuteCommandTool::new(
        cfg.tools.shell.allowed_commands.clone(),
        workspace.to_path_buf(),
        cfg.tools.tool_timeout_secs,
    ));
    registry.register(CurrentDatetimeTool);

    let store = MemoryStore::new(workspace.join("memories.json"));
    registry.register(RememberTool::new(store.clone()));
    registry.register(RecallTool::new(store.clone()));
    registry.register(ListMemoriesTool::new(store.clone()));
    registry.register(ForgetTool::new(store));

    registry
}

/// 会话入口。一次 run 一个用户请求。
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    executor: ToolExecutor,
    limits: SessionSection,
    metrics_path: PathBuf,
    cancel: CancellationToken,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: ToolExecutor,
        limits: SessionSection,
        metrics_path: PathBuf,
    ) -> Self {
        Self {
            llm,
            executor,
            limits,
            metrics_path,
            cancel: CancellationToken::new(),
        }
    }

    /// 挂接外部取消令牌
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 处理一个用户请求。Ok(Some) 为最终回答，Ok(None) 为回合预算耗尽。
    pub async fn run(&self, input: &str) -> Result<Option<String>, AgentError> {
        let intent = classify_intent(self.llm.as_ref(), input).await;
        tracing::info!("[router] intent: {intent:?}");

        if intent == Intent::Chat {
            let reply = run_chat(self.llm.as_ref(), input).await?;
            return Ok(Some(reply));
        }

        // 空计划不是错误：清单为空时循环没有 pending 步骤，首个终答即被接受
        let steps = run_plan_phase(input, &self.executor, self.llm.as_ref()).await?;
        if steps.is_empty() {
            tracing::warn!("[plan] no parseable steps, entering loop with empty checklist");
        }

        let mut metrics =
            MetricsLogger::new(self.llm.model_name(), input, self.metrics_path.clone());
        let session = ExecSession::new(self.llm.as_ref(), &self.executor, &self.limits)
            .with_cancel_token(self.cancel.clone());
        match run_exec_loop(&session, input, steps, &mut metrics).await? {
            ExecOutcome::Completed(answer) => Ok(Some(answer)),
            ExecOutcome::Exhausted => Ok(None),
        }
    }
}
