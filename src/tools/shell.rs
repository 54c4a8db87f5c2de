//! Shell 执行器：白名单命令，禁止危险操作
//!
//! 仅允许配置中的命令名（首词，如 ls、python3、cargo）；禁止 rm -rf、chmod 777 等子串；
//! 执行通过 sh -c / cmd /C，带超时。cwd 限定在工作区内。

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::tools::Tool;

/// 禁止的命令/子串（即使白名单中有同名，也不允许带这些参数）
const FORBIDDEN_SUBSTR: &[&str] = &[
    "rm -rf",
    "rm -fr",
    "rm -r",
    "wget ",
    "curl | sh",
    "chmod 777",
    "chmod +s",
    "mkfs",
    "dd if=",
    "> /dev/sd",
    ":(){ :|:& };:", // fork bomb
];

/// execute_command 工具：仅允许白名单内命令，工作目录默认为 workspace
pub struct ExecuteCommandTool {
    allowed_commands: HashSet<String>,
    workspace: PathBuf,
    timeout_secs: u64,
}

impl ExecuteCommandTool {
    pub fn new(allowed_commands: Vec<String>, workspace: PathBuf, timeout_secs: u64) -> Self {
        let allowed_commands = allowed_commands
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect();
        Self {
            allowed_commands,
            workspace,
            timeout_secs,
        }
    }

    /// 只取第一个 token 作为命令名
    fn command_name<'a>(&self, raw: &'a str) -> &'a str {
        raw.split_whitespace().next().unwrap_or("")
    }

    fn is_allowed(&self, raw: &str) -> Result<(), String> {
        let raw_lower = raw.to_lowercase();
        for forbidden in FORBIDDEN_SUBSTR {
            if raw_lower.contains(forbidden) {
                return Err(format!("Forbidden pattern: {forbidden}"));
            }
        }
        let name = self.command_name(&raw_lower);
        if name.is_empty() {
            return Err("Empty command".to_string());
        }
        if self.allowed_commands.contains(name) {
            return Ok(());
        }
        Err(format!("Command '{name}' not in allowlist"))
    }

    /// cwd 必须位于 workspace 下；相对路径按 workspace 解析
    fn resolve_cwd(&self, cwd: &str) -> PathBuf {
        if cwd.is_empty() || cwd == "." {
            return self.workspace.clone();
        }
        let candidate = self.workspace.join(cwd.trim_start_matches('/'));
        if candidate.is_dir() {
            candidate
        } else {
            self.workspace.clone()
        }
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Run a whitelisted shell command in the workspace and return stdout/stderr."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute (first word must be in the allowlist)"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory relative to the workspace, default '.'"
                },
                "shell": {
                    "type": "string",
                    "description": "Shell to use; only 'sh'-compatible invocation is supported"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let command = args
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        let cwd = args.get("cwd").and_then(|v| v.as_str()).unwrap_or(".");
        self.is_allowed(command)?;

        let workdir = self.resolve_cwd(cwd);
        tracing::info!(command = %command, cwd = %workdir.display(), "execute_command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(&workdir);

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            cmd.output(),
        )
        .await
        .map_err(|_| format!("Command timed out after {}s", self.timeout_secs))?
        .map_err(|e| format!("Execution failed: {e}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut result = String::new();
        if !stdout.is_empty() {
            result.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str("[stderr]\n");
            result.push_str(&stderr);
        }
        if !output.status.success() {
            return Err(format!(
                "Exit code {}: {}",
                output.status.code().unwrap_or(-1),
                result
            ));
        }
        if result.is_empty() {
            result = "(no output)".to_string();
        }
        Ok(result)
    }
}
