//! Tool Call 修复层
//!
//! 小模型（llama3.2:3b、mistral 等）经常幻觉工具名与参数名。修复层在每次调用前
//! 做两步纠正：
//! 1. fix_tool_name：精确匹配 → 别名表（确定性纠正）→ 相似度兜底（保守阈值 0.80）。
//! 2. fix_args：参数名按声明 schema 对齐，别名表内且目标在 schema 中才改名，
//!    其余键原样放行（从不丢弃，保证工具报错可诊断）。
//! 别名纠正与相似度纠正在日志和 metrics 中用 `→` / `~>` 区分（置信度不同）。

use std::fmt;

use crate::llm::ToolCallRequest;
use crate::tools::ToolRegistry;

/// 相似度兜底的最低接受阈值；0.80 偏保守，避免误纠正
const FUZZY_CUTOFF: f64 = 0.80;

/// 常见幻觉工具名 → 规范工具名。覆盖文件、shell、联网搜索、时间、SQL、备忘六类，
/// 来自对多个小模型的实际观察。仅当目标名已注册时才生效。
const TOOL_NAME_ALIASES: &[(&str, &str)] = &[
    // filesystem
    ("read_text_file", "read_file"),
    ("read_file_content", "read_file"),
    ("write_text_file", "write_file"),
    ("create_file", "write_file"),
    ("save_file", "write_file"),
    ("list_files", "list_directory"),
    ("list_directory_with_sizes", "list_directory"),
    ("ls", "list_directory"),
    ("delete_file", "remove_file"),
    // shell
    ("run_command", "execute_command"),
    ("run_shell", "execute_command"),
    ("shell_execute", "execute_command"),
    ("bash", "execute_command"),
    ("exec", "execute_command"),
    ("run_bash", "execute_command"),
    // websearch
    ("search_web", "web_search"),
    ("internet_search", "web_search"),
    ("get_page", "fetch_page"),
    ("fetch_url", "fetch_page"),
    ("open_url", "fetch_page"),
    // time
    ("current_time", "get_current_datetime"),
    ("get_time", "get_current_datetime"),
    ("get_datetime", "get_current_datetime"),
    ("now", "get_current_datetime"),
    // sqlite
    ("sql_query", "query"),
    ("execute_sql", "query"),
    ("run_sql", "query"),
    // memory
    ("store_memory", "remember"),
    ("save_memory", "remember"),
    ("get_memory", "recall"),
    ("retrieve_memory", "recall"),
    ("delete_memory", "forget"),
    ("remove_memory", "forget"),
];

/// 常见幻觉参数名 → 规范参数名。仅当目标名在工具声明的 schema 中才生效。
const ARG_ALIASES: &[(&str, &str)] = &[
    ("cmd", "command"),
    ("shell_cmd", "command"),
    ("sh", "shell"),
    ("dir", "cwd"),
    ("working_dir", "cwd"),
    ("workdir", "cwd"),
    ("file", "path"),
    ("filepath", "path"),
    ("filename", "path"),
    ("file_path", "path"),
    ("text", "content"),
    ("body", "content"),
    ("data", "content"),
    ("q", "query"),
    ("search", "query"),
    ("sql_query", "sql"),
    ("statement", "sql"),
    ("url", "uri"),
    ("link", "uri"),
];

fn alias_lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(from, _)| *from == key).map(|(_, to)| *to)
}

/// 一次工具名纠正：别名表命中（高置信度）或相似度兜底
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFix {
    Alias { from: String, to: String },
    Fuzzy { from: String, to: String },
}

impl fmt::Display for NameFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameFix::Alias { from, to } => write!(f, "{from} → {to}"),
            NameFix::Fuzzy { from, to } => write!(f, "{from} ~> {to}"),
        }
    }
}

/// 在调用前纠正幻觉工具名。
///
/// 纠正顺序（命中即停）：
/// 1. 名称已注册 → 不改动。
/// 2. 别名表命中且目标已注册 → 确定性纠正。
/// 3. 对全部注册名算相似度，最高者 ≥ 0.80 才接受；否则保持原名，
///    让调用自然失败并产出可读的 Unknown tool 错误。
pub fn fix_tool_name(call: &mut ToolCallRequest, registry: &ToolRegistry) -> Option<NameFix> {
    if registry.contains(&call.name) {
        return None;
    }

    if let Some(target) = alias_lookup(TOOL_NAME_ALIASES, &call.name) {
        if registry.contains(target) {
            let fix = NameFix::Alias {
                from: call.name.clone(),
                to: target.to_string(),
            };
            call.name = target.to_string();
            return Some(fix);
        }
    }

    let mut best: Option<(f64, String)> = None;
    for candidate in registry.tool_names() {
        let ratio = strsim::normalized_levenshtein(&call.name, &candidate);
        if best.as_ref().map(|(r, _)| ratio > *r).unwrap_or(true) {
            best = Some((ratio, candidate));
        }
    }
    if let Some((ratio, candidate)) = best {
        if ratio >= FUZZY_CUTOFF {
            let fix = NameFix::Fuzzy {
                from: call.name.clone(),
                to: candidate.clone(),
            };
            call.name = candidate;
            return Some(fix);
        }
    }

    None
}

/// 参数名对齐到工具声明的 schema。
///
/// 返回已应用的纠正（"wrong → correct" 形式）。键从不被丢弃：schema 中没有、
/// 别名表也救不回来的键原样传给工具。schema 不可内省时整体放行。
pub fn fix_args(call: &mut ToolCallRequest, registry: &ToolRegistry) -> Vec<String> {
    let Some(expected) = registry.schema_keys(&call.name) else {
        return Vec::new();
    };
    let Some(args) = call.arguments.as_object() else {
        return Vec::new();
    };

    let mut new_args = serde_json::Map::new();
    let mut fixes = Vec::new();

    for (k, v) in args {
        if expected.contains(k) {
            new_args.insert(k.clone(), v.clone());
            continue;
        }
        match alias_lookup(ARG_ALIASES, k) {
            Some(correct) if expected.contains(correct) => {
                new_args.insert(correct.to_string(), v.clone());
                fixes.push(format!("{k} → {correct}"));
            }
            _ => {
                new_args.insert(k.clone(), v.clone());
            }
        }
    }

    call.arguments = serde_json::Value::Object(new_args);
    fixes
}
