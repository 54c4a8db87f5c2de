//! 工具箱：注册表、执行器与内置工具
//!
//! 内置工具名即修复层别名表的规范目标名（read_file / write_file / list_directory /
//! execute_command / get_current_datetime / remember / recall / list_memories / forget）。
//! web_search、fetch_page、list_tables、query 等由外部工具服务器提供，未注册时
//! 对应的别名纠正自动失效。

pub mod clock;
pub mod executor;
pub mod filesystem;
pub mod memory;
pub mod registry;
pub mod shell;

pub use clock::CurrentDatetimeTool;
pub use executor::ToolExecutor;
pub use filesystem::{ListDirectoryTool, ReadFileTool, SafeFs, WriteFileTool};
pub use memory::{ForgetTool, ListMemoriesTool, MemoryStore, RecallTool, RememberTool};
pub use registry::{Tool, ToolRegistry};
pub use shell::ExecuteCommandTool;
