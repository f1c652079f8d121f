//! 测试环境设置模块

mod environment;

pub use environment::{TestEnvConfig, TestEnvironment};
