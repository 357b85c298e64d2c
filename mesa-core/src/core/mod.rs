//! 核心模块 - 协调核心配置
//!
//! # 模块结构
//!
//! - [`Config`] - 运行配置 (环境变量加载)

pub mod config;

pub use config::Config;
