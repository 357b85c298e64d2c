//! 工具模块 - 日志等通用设施

pub mod logger;

pub use logger::{init_logger, init_logger_with_file};
