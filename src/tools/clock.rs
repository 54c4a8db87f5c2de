//! 时间工具

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// get_current_datetime 工具：返回本地当前日期时间
pub struct CurrentDatetimeTool;

#[async_trait]
impl Tool for CurrentDatetimeTool {
    fn name(&self) -> &str {
        "get_current_datetime"
    }

    fn description(&self) -> &str {
        "Get the current local date and time."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        Ok(chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_a_datetime() {
        let out = CurrentDatetimeTool
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        // YYYY-MM-DD 前缀
        assert_eq!(out.as_bytes()[4], b'-');
        assert_eq!(out.as_bytes()[7], b'-');
    }
}
