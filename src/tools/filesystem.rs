//! 沙箱文件系统工具
//!
//! SafeFs 绑定 root_dir，所有路径必须落在 root 下（禁止 ../ 逃逸）；
//! read_file / write_file / list_directory 即修复层别名表的规范目标名。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::tools::Tool;

/// 沙箱文件系统：绑定根目录，所有路径先做词法校验再落盘
#[derive(Debug, Clone)]
pub struct SafeFs {
    root_dir: PathBuf,
}

impl SafeFs {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root = root_dir.as_ref().to_path_buf();
        let root_dir = root.canonicalize().unwrap_or(root);
        Self { root_dir }
    }

    /// 词法校验：剥掉绝对前缀，拒绝任何 ".." 分量，拼到 root 下
    fn resolve(&self, path: &str) -> Result<PathBuf, AgentError> {
        let trimmed = path.trim().trim_start_matches('/');
        let rel = Path::new(trimmed);
        for comp in rel.components() {
            if matches!(comp, Component::ParentDir) {
                return Err(AgentError::PathEscape(path.to_string()));
            }
        }
        Ok(self.root_dir.join(rel))
    }

    pub fn read_file(&self, path: &str) -> Result<String, AgentError> {
        let resolved = self.resolve(path)?;
        std::fs::read_to_string(&resolved)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Read failed: {e}")))
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<(), AgentError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AgentError::ToolExecutionFailed(format!("Write failed: {e}")))?;
        }
        std::fs::write(&resolved, content)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("Write failed: {e}")))
    }

    pub fn list_dir(&self, path: &str) -> Result<Vec<String>, AgentError> {
        let base = if path.is_empty() || path == "." {
            self.root_dir.clone()
        } else {
            self.resolve(path)?
        };
        let mut entries = Vec::new();
        for e in std::fs::read_dir(&base)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("List failed: {e}")))?
        {
            let e = e.map_err(|e| AgentError::ToolExecutionFailed(e.to_string()))?;
            let name = e.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                let ty = if e.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    "/"
                } else {
                    ""
                };
                entries.push(format!("{name}{ty}"));
            }
        }
        entries.sort();
        Ok(entries)
    }
}

/// 读取文件内容
pub struct ReadFileTool {
    fs: SafeFs,
}

impl ReadFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file inside the workspace."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path relative to the workspace" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
        tracing::info!(path = %path, "read_file execute");
        self.fs.read_file(path).map_err(|e| e.to_string())
    }
}

/// 写入文件（父目录自动创建）
pub struct WriteFileTool {
    fs: SafeFs,
}

impl WriteFileTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file inside the workspace, creating it if missing."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path relative to the workspace" },
                "content": { "type": "string", "description": "Full file content to write" }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
        let content = args.get("content").and_then(|v| v.as_str()).unwrap_or("");
        tracing::info!(path = %path, bytes = content.len(), "write_file execute");
        self.fs
            .write_file(path, content)
            .map(|_| format!("Wrote {} bytes to {}", content.len(), path))
            .map_err(|e| e.to_string())
    }
}

/// 列出目录
pub struct ListDirectoryTool {
    fs: SafeFs,
}

impl ListDirectoryTool {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            fs: SafeFs::new(root_dir),
        }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List files in a workspace directory."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Directory path, default '.'" }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        tracing::info!(path = %path, "list_directory execute");
        let entries = self.fs.list_dir(path).map_err(|e| e.to_string())?;
        if entries.is_empty() {
            Ok("(empty)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let write = WriteFileTool::new(dir.path());
        let read = ReadFileTool::new(dir.path());

        let out = write
            .execute(serde_json::json!({"path": "notes/hello.txt", "content": "hi there"}))
            .await
            .unwrap();
        assert!(out.contains("hello.txt"));

        let content = read
            .execute(serde_json::json!({"path": "notes/hello.txt"}))
            .await
            .unwrap();
        assert_eq!(content, "hi there");
    }

    #[tokio::test]
    async fn list_directory_shows_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let ls = ListDirectoryTool::new(dir.path());
        let out = ls.execute(serde_json::json!({})).await.unwrap();
        assert!(out.contains("a.txt"));
        assert!(out.contains("sub/"));
    }

    #[test]
    fn parent_dir_component_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fs = SafeFs::new(dir.path());
        let err = fs.read_file("../outside.txt").unwrap_err();
        assert!(matches!(err, AgentError::PathEscape(_)));
    }

    #[test]
    fn absolute_path_is_rebased_into_root() {
        let dir = tempfile::tempdir().unwrap();
        let fs = SafeFs::new(dir.path());
        fs.write_file("/etc_passwd", "safe").unwrap();
        assert_eq!(fs.read_file("etc_passwd").unwrap(), "safe");
    }
}
