//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters_schema / execute），
//! 由 ToolRegistry 按名注册与查找。修复层通过 schema_keys 读取声明的参数名集合，
//! Planner 通过 to_tool_specs 生成向 LLM 声明的工具列表。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolSpec;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（模型在 tool_call 中引用的名字）
    fn name(&self) -> &str;

    /// 工具描述（进入 plan / system prompt）
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认空对象表示无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// (name, description) 列表，用于 prompt 中的 Available tools 段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect()
    }

    /// 工具声明的参数名集合；工具不存在或 schema 无 properties 时返回 None
    /// （None 表示 schema 不可内省，修复层对参数原样放行）
    pub fn schema_keys(&self, name: &str) -> Option<BTreeSet<String>> {
        let schema = self.tools.get(name)?.parameters_schema();
        let properties = schema.get("properties")?.as_object()?;
        Some(properties.keys().cloned().collect())
    }

    /// 生成向 LLM 声明的工具列表
    pub fn to_tool_specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .iter()
            .map(|(name, tool)| ToolSpec {
                name: name.clone(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTool;

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str {
            "noop"
        }

        fn description(&self) -> &str {
            "Does nothing."
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "content": { "type": "string" }
                },
                "required": ["path"]
            })
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            Ok("ok".to_string())
        }
    }

    #[test]
    fn schema_keys_lists_declared_properties() {
        let mut registry = ToolRegistry::new();
        registry.register(NoopTool);

        let keys = registry.schema_keys("noop").unwrap();
        assert!(keys.contains("path"));
        assert!(keys.contains("content"));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn schema_keys_missing_tool_is_none() {
        let registry = ToolRegistry::new();
        assert!(registry.schema_keys("ghost").is_none());
    }

    #[tokio::test]
    async fn execute_unknown_tool_errors() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("ghost", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.contains("Unknown tool"));
    }
}
