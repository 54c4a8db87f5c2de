//! 可观测性
//!
//! tracing 初始化：默认 info，可通过 RUST_LOG 覆盖。日志走 stderr，
//! stdout 只留给最终回答（方便管道接续）。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().expect("valid directive")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
