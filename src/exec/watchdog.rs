//! 执行看门狗
//!
//! 按工具名累计整个会话生命周期内的失败次数（跨 replan，从不清零）。
//! replan 触发时，对累计失败 ≥ 2 的工具生成提示，引导规划模型换工具换思路。
//! 纯建议信号：从不直接拦截任何调用。

use std::collections::BTreeMap;

/// 触发提示的累计失败阈值
const HINT_THRESHOLD: u32 = 2;

/// 会话级工具失败计数器
#[derive(Debug, Default)]
pub struct Watchdog {
    failures: BTreeMap<String, u32>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, tool_name: &str) {
        *self.failures.entry(tool_name.to_string()).or_insert(0) += 1;
    }

    pub fn failure_count(&self, tool_name: &str) -> u32 {
        self.failures.get(tool_name).copied().unwrap_or(0)
    }

    /// 生成 replan 提示；没有工具达到阈值时返回空串（调用方会省略该段落）
    pub fn hint(&self) -> String {
        let repeated: Vec<String> = self
            .failures
            .iter()
            .filter(|(_, count)| **count >= HINT_THRESHOLD)
            .map(|(name, count)| format!("{name} ({count})"))
            .collect();
        if repeated.is_empty() {
            return String::new();
        }
        format!(
            "[WATCHDOG] The following tools have failed repeatedly: {}. \
             Do NOT call them with the same arguments again. \
             Use a completely different tool or a different approach.",
            repeated.join(", ")
        )
    }
}
