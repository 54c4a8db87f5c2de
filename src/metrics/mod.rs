//! 指标采集
//!
//! 每会话一个 MetricsLogger（显式传入执行循环，无进程级单例）。逐回合在内存中
//! 累积 TurnRecord，循环到达终态后聚合为一条 SessionRecord，追加写入 JSONL
//! （每会话一行，行级追加保证并发会话互不覆盖）。
//!
//! 聚合口径：
//! - tca（Tool Calling Accuracy）：发起工具调用的回合占比
//! - tool_name_accuracy：工具名无需纠正的调用占比
//! - arg_fit_rate：参数全部命中 schema 的调用占比
//! - step_completion_rate：清单中最终 ✅ 的步骤占比
//! 分母为零时取中性值（纠正类 1.0，完成率 0.0）。

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::AgentError;
use crate::plan::{Step, StepStatus};

/// 一个回合的原始观测
#[derive(Debug, Clone, Serialize, Default)]
pub struct TurnRecord {
    pub turn: usize,
    pub tool_called: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// 工具名纠正描述（"a → b" 别名 / "a ~> b" 相似度），无纠正为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name_fix: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub arg_fixes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    session_id: &'a str,
    timestamp: String,
    model: &'a str,
    prompt_preview: String,
    tca: f64,
    tool_name_accuracy: f64,
    arg_fit_rate: f64,
    step_completion_rate: f64,
    total_turns: usize,
    total_steps: usize,
    done_steps: usize,
    tool_name_fixes: usize,
    arg_fixes: usize,
    turns: &'a [TurnRecord],
}

/// 会话级指标采集器
pub struct MetricsLogger {
    model_name: String,
    prompt: String,
    session_id: String,
    path: PathBuf,
    turns: Vec<TurnRecord>,
}

impl MetricsLogger {
    /// path 为 JSONL 文件完整路径（如 logs/metrics.jsonl）
    pub fn new(model_name: impl Into<String>, prompt: impl Into<String>, path: PathBuf) -> Self {
        Self {
            model_name: model_name.into(),
            prompt: prompt.into(),
            session_id: chrono::Local::now().format("%Y%m%d_%H%M%S_%f").to_string(),
            path,
            turns: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 记录一个回合
    pub fn log_turn(&mut self, record: TurnRecord) {
        self.turns.push(record);
    }

    /// 聚合并追加一条 JSONL 记录；循环终态时调用一次
    pub fn write_summary(&self, steps: &[Step]) -> Result<(), AgentError> {
        let total_turns = self.turns.len();
        let tool_turns: Vec<&TurnRecord> = self.turns.iter().filter(|t| t.tool_called).collect();
        let name_fix_count = tool_turns.iter().filter(|t| t.tool_name_fix.is_some()).count();
        let arg_fix_count = tool_turns.iter().filter(|t| !t.arg_fixes.is_empty()).count();

        let tca = if total_turns > 0 {
            tool_turns.len() as f64 / total_turns as f64
        } else {
            0.0
        };
        let tool_name_accuracy = if !tool_turns.is_empty() {
            (tool_turns.len() - name_fix_count) as f64 / tool_turns.len() as f64
        } else {
            1.0
        };
        let arg_fit_rate = if !tool_turns.is_empty() {
            (tool_turns.len() - arg_fix_count) as f64 / tool_turns.len() as f64
        } else {
            1.0
        };
        let done_steps = steps.iter().filter(|s| s.status == StepStatus::Done).count();
        let step_completion_rate = if !steps.is_empty() {
            done_steps as f64 / steps.len() as f64
        } else {
            0.0
        };

        let record = SessionRecord {
            session_id: &self.session_id,
            timestamp: chrono::Local::now().to_rfc3339(),
            model: &self.model_name,
            prompt_preview: self.prompt.chars().take(100).collect(),
            tca: round3(tca),
            tool_name_accuracy: round3(tool_name_accuracy),
            arg_fit_rate: round3(arg_fit_rate),
            step_completion_rate: round3(step_completion_rate),
            total_turns,
            total_steps: steps.len(),
            done_steps,
            tool_name_fixes: name_fix_count,
            arg_fixes: arg_fix_count,
            turns: &self.turns,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(&record)
            .map_err(|e| AgentError::JsonParseError(e.to_string()))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
