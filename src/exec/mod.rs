//! 执行阶段：循环主体、结果判定与看门狗

pub mod classifier;
pub mod loop_;
pub mod watchdog;

pub use classifier::{MarkerClassifier, ResultClassifier};
pub use loop_::{run_exec_loop, sanitize, ExecOutcome, ExecSession};
pub use watchdog::Watchdog;
