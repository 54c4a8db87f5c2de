//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FORAGER__*` 覆盖
//! （双下划线表示嵌套，如 `FORAGER__LLM__MODEL=qwen2.5:7b`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub session: SessionSection,
    pub tools: ToolsSection,
    pub metrics: MetricsSection,
}

/// [app] 段：应用名与工作区根目录
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 沙箱根目录，未设置时用 ./workspace
    pub workspace_root: Option<PathBuf>,
}

/// [llm] 段：Ollama 端点与模型
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// 单次请求超时（秒）；小模型在 CPU 上推理可能很慢
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

/// [session] 段：会话预算。只有回合数与 replan 次数两种预算，
/// 不设墙钟超时（LLM/工具各自的调用超时已经兜底）。
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// 单会话最大回合数（每回合一次 LLM 调用 + 至多一次工具调用）
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// 连续失败多少次触发 replan；默认 1，即首败即重规划
    #[serde(default = "default_max_failures_before_replan")]
    pub max_failures_before_replan: u32,
    /// 单会话最大 replan 次数
    #[serde(default = "default_max_replans")]
    pub max_replans: u32,
    /// replan prompt 中保留的最近执行历史条数
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_failures_before_replan: default_max_failures_before_replan(),
            max_replans: default_max_replans(),
            history_window: default_history_window(),
        }
    }
}

fn default_max_turns() -> usize {
    30
}

fn default_max_failures_before_replan() -> u32 {
    1
}

fn default_max_replans() -> u32 {
    3
}

fn default_history_window() -> usize {
    10
}

/// [tools] 段：单次工具调用超时与 Shell 白名单
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub shell: ShellSection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            shell: ShellSection::default(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// [tools.shell] 段：允许执行的命令名（仅首词，如 ls、python3、cargo）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ShellSection {
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,
}

fn default_allowed_commands() -> Vec<String> {
    vec![
        "ls".into(),
        "cat".into(),
        "head".into(),
        "tail".into(),
        "wc".into(),
        "grep".into(),
        "find".into(),
        "echo".into(),
        "python3".into(),
        "cargo".into(),
        "rustc".into(),
    ]
}

/// [metrics] 段：JSONL 指标日志目录
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetricsSection {
    /// 未设置时用 ./logs
    pub log_dir: Option<PathBuf>,
}

/// 从 config 目录加载配置，环境变量 FORAGER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FORAGER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{name}.toml");
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FORAGER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_budgets() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.session.max_turns, 30);
        assert_eq!(cfg.session.max_failures_before_replan, 1);
        assert_eq!(cfg.session.max_replans, 3);
        assert_eq!(cfg.session.history_window, 10);
        assert_eq!(cfg.tools.tool_timeout_secs, 30);
    }
}
