//! 计划数据模型
//!
//! Step 是一条带序号的计划行；parse_steps 只接受 `^\d+\.` 开头的行，其余
//! （标题、空行、散文）静默丢弃。format_checklist 渲染为 ⏳/✅/❌ 清单，
//! 既进 LLM prompt 也进日志。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 步骤状态；只允许 Pending→Done 或 Pending→Failed，从不回退
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Done,
    Failed,
}

impl StepStatus {
    pub fn glyph(&self) -> &'static str {
        match self {
            StepStatus::Pending => "⏳",
            StepStatus::Done => "✅",
            StepStatus::Failed => "❌",
        }
    }
}

/// 一条计划步骤
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    /// 计划文本中的序号（replan 后不保证全局唯一）
    pub number: u32,
    /// 原始整行（含序号前缀）
    pub text: String,
    pub status: StepStatus,
    /// 结果摘要或错误信息，执行前为空
    pub note: String,
}

impl Step {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            status: StepStatus::Pending,
            note: String::new(),
        }
    }
}

fn step_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.").expect("step regex is valid"))
}

/// 逐行扫描计划文本；接受 trim 后以「数字.」开头的行
pub fn parse_steps(plan: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    for line in plan.lines() {
        let line = line.trim();
        if let Some(caps) = step_re().captures(line) {
            if let Ok(number) = caps[1].parse::<u32>() {
                steps.push(Step::new(number, line));
            }
        }
    }
    steps
}

/// 渲染清单：每步一行，状态图标 + 原文 + 可选的 `  → note` 后缀
pub fn format_checklist(steps: &[Step]) -> String {
    steps
        .iter()
        .map(|s| {
            if s.note.is_empty() {
                format!("{} {}", s.status.glyph(), s.text)
            } else {
                format!("{} {}  → {}", s.status.glyph(), s.text, s.note)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
