//! Forager - 小模型工具调用引擎
//!
//! 入口：初始化日志与配置，组装内置工具集与 Ollama 客户端，
//! 把命令行参数拼成一条任务交给 Agent，结果打到 stdout。

use std::sync::Arc;

use anyhow::Context;
use forager::agent::{build_default_toolset, Agent};
use forager::config::load_config;
use forager::llm::OllamaClient;
use forager::observability;
use forager::tools::ToolExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: forager <task...>");
        eprintln!("  e.g. forager create hello.py and run it");
        std::process::exit(2);
    }
    let task = args.join(" ");

    let cfg = load_config(None).context("Failed to load config")?;

    let workspace = cfg
        .app
        .workspace_root
        .clone()
        .unwrap_or_else(|| "workspace".into());
    std::fs::create_dir_all(&workspace)
        .with_context(|| format!("Failed to create workspace {}", workspace.display()))?;

    let metrics_path = cfg
        .metrics
        .log_dir
        .clone()
        .unwrap_or_else(|| "logs".into())
        .join("metrics.jsonl");

    let llm = Arc::new(OllamaClient::new(
        cfg.llm.base_url.clone(),
        cfg.llm.model.clone(),
        cfg.llm.request_timeout_secs,
    ));
    let registry = build_default_toolset(&cfg, &workspace);
    let executor = ToolExecutor::new(registry, cfg.tools.tool_timeout_secs);

    let agent = Agent::new(llm, executor, cfg.session.clone(), metrics_path);

    match agent.run(&task).await.context("Agent run failed")? {
        Some(answer) => println!("{answer}"),
        None => println!("(no answer: turn budget exhausted)"),
    }

    Ok(())
}
