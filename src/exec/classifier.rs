//! 工具结果错误判定
//!
//! 工具服务器即使执行失败也常以正常文本返回，这里按固定标记子串判定。
//! 判定逻辑放在 trait 后面，之后换成结构化错误契约时不动执行循环。

/// 判定一段工具结果文本是否表示失败
pub trait ResultClassifier: Send + Sync {
    fn is_error(&self, result: &str) -> bool;
}

/// 与工具服务器约定的错误标记子串
const ERROR_MARKERS: &[&str] = &["Error:", "SQL error:"];

/// 基于固定标记子串的启发式判定
#[derive(Debug, Default)]
pub struct MarkerClassifier;

impl ResultClassifier for MarkerClassifier {
    fn is_error(&self, result: &str) -> bool {
        ERROR_MARKERS.iter().any(|m| result.contains(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_error() {
        assert!(!MarkerClassifier.is_error("table1, table2"));
    }

    #[test]
    fn marker_substrings_are_errors() {
        assert!(MarkerClassifier.is_error("Error: file not found"));
        assert!(MarkerClassifier.is_error("SQL error: near BAD"));
        assert!(MarkerClassifier.is_error("prefix then Error: embedded"));
    }
}
