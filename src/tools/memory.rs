//! 键值备忘工具
//!
//! remember / recall / list_memories / forget 四个工具共享同一个 MemoryStore，
//! 数据持久化为 workspace 下的一个 JSON 文件。每次操作整体读写并持锁，
//! 保证并发会话下文件内容完整。

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// JSON 文件键值存储
pub struct MemoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(path: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> BTreeMap<String, String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn save(&self, data: &BTreeMap<String, String>) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("Save failed: {e}"))?;
        }
        let body = serde_json::to_string_pretty(data).map_err(|e| format!("Save failed: {e}"))?;
        std::fs::write(&self.path, body).map_err(|e| format!("Save failed: {e}"))
    }

    pub fn remember(&self, key: &str, value: &str) -> Result<String, String> {
        let _guard = self.lock.lock().map_err(|_| "lock poisoned".to_string())?;
        let mut data = self.load();
        data.insert(key.to_string(), value.to_string());
        self.save(&data)?;
        Ok(format!("Remembered '{key}'"))
    }

    pub fn recall(&self, key: &str) -> Result<String, String> {
        let _guard = self.lock.lock().map_err(|_| "lock poisoned".to_string())?;
        match self.load().get(key) {
            Some(v) => Ok(v.clone()),
            None => Ok(format!("(no memory stored under '{key}')")),
        }
    }

    pub fn list(&self) -> Result<String, String> {
        let _guard = self.lock.lock().map_err(|_| "lock poisoned".to_string())?;
        let data = self.load();
        if data.is_empty() {
            return Ok("(no memories stored)".to_string());
        }
        Ok(data
            .iter()
            .map(|(k, v)| format!("{k} = {v}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    pub fn forget(&self, key: &str) -> Result<String, String> {
        let _guard = self.lock.lock().map_err(|_| "lock poisoned".to_string())?;
        let mut data = self.load();
        match data.remove(key) {
            Some(_) => {
                self.save(&data)?;
                Ok(format!("Forgot '{key}'"))
            }
            None => Ok(format!("(no memory stored under '{key}')")),
        }
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// 保存一条键值备忘
pub struct RememberTool {
    store: Arc<MemoryStore>,
}

impl RememberTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RememberTool {
    fn name(&self) -> &str {
        "remember"
    }

    fn description(&self) -> &str {
        "Persist a key-value note for later sessions."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "value": { "type": "string" }
            },
            "required": ["key", "value"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        self.store.remember(str_arg(&args, "key"), str_arg(&args, "value"))
    }
}

/// 读取一条备忘
pub struct RecallTool {
    store: Arc<MemoryStore>,
}

impl RecallTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecallTool {
    fn name(&self) -> &str {
        "recall"
    }

    fn description(&self) -> &str {
        "Recall a stored key-value note by key."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        self.store.recall(str_arg(&args, "key"))
    }
}

/// 列出全部备忘
pub struct ListMemoriesTool {
    store: Arc<MemoryStore>,
}

impl ListMemoriesTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListMemoriesTool {
    fn name(&self) -> &str {
        "list_memories"
    }

    fn description(&self) -> &str {
        "List all stored key-value notes."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        self.store.list()
    }
}

/// 删除一条备忘
pub struct ForgetTool {
    store: Arc<MemoryStore>,
}

impl ForgetTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ForgetTool {
    fn name(&self) -> &str {
        "forget"
    }

    fn description(&self) -> &str {
        "Delete a stored key-value note by key."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        self.store.forget(str_arg(&args, "key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remember_recall_forget_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path().join("memories.json"));

        let remember = RememberTool::new(store.clone());
        let recall = RecallTool::new(store.clone());
        let list = ListMemoriesTool::new(store.clone());
        let forget = ForgetTool::new(store.clone());

        remember
            .execute(serde_json::json!({"key": "color", "value": "blue"}))
            .await
            .unwrap();
        assert_eq!(
            recall
                .execute(serde_json::json!({"key": "color"}))
                .await
                .unwrap(),
            "blue"
        );
        assert!(list
            .execute(serde_json::json!({}))
            .await
            .unwrap()
            .contains("color = blue"));

        forget
            .execute(serde_json::json!({"key": "color"}))
            .await
            .unwrap();
        assert!(recall
            .execute(serde_json::json!({"key": "color"}))
            .await
            .unwrap()
            .contains("no memory"));
    }

    #[tokio::test]
    async fn recall_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path().join("memories.json"));
        let recall = RecallTool::new(store);
        let out = recall
            .execute(serde_json::json!({"key": "ghost"}))
            .await
            .unwrap();
        assert!(out.contains("no memory stored"));
    }
}
