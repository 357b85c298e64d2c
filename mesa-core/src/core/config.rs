use std::time::Duration;

use crate::store::StoreOptions;

/// 协调核心配置 - 所有可调参数
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | MESA_STORE_PATH | /var/lib/mesa/store.redb | 文档存储路径 |
/// | MESA_CHANGE_CAPACITY | 1024 | 变更广播通道容量 |
/// | MESA_SNAPSHOT_BUFFER | 16 | 每个订阅的快照缓冲 |
/// | MESA_RETRY_DELAY_MS | 5000 | 降级后重试间隔(毫秒) |
/// | MESA_RECENT_LIMIT | 5 | 最近订单列表长度 |
/// | MESA_POPULAR_LIMIT | 5 | 热门菜品列表长度 |
/// | MESA_ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// MESA_STORE_PATH=/data/mesa/store.redb MESA_RETRY_DELAY_MS=2000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 文档存储文件路径
    pub store_path: String,
    /// 变更通知广播容量 (慢订阅落后时会收到完整快照补偿)
    pub change_capacity: usize,
    /// 每个订阅的快照通道缓冲
    pub snapshot_buffer: usize,
    /// 存储降级后的重试间隔 (毫秒)
    pub retry_delay_ms: u64,
    /// 管理端最近订单列表长度
    pub recent_orders_limit: usize,
    /// 管理端热门菜品列表长度
    pub popular_items_limit: usize,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            store_path: std::env::var("MESA_STORE_PATH")
                .unwrap_or_else(|_| "/var/lib/mesa/store.redb".into()),
            change_capacity: std::env::var("MESA_CHANGE_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1024),
            snapshot_buffer: std::env::var("MESA_SNAPSHOT_BUFFER")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(16),
            retry_delay_ms: std::env::var("MESA_RETRY_DELAY_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            recent_orders_limit: std::env::var("MESA_RECENT_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            popular_items_limit: std::env::var("MESA_POPULAR_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            environment: std::env::var("MESA_ENVIRONMENT")
                .unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义存储路径覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(store_path: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.store_path = store_path.into();
        config
    }

    /// 由配置派生存储引擎选项
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            change_capacity: self.change_capacity,
            snapshot_buffer: self.snapshot_buffer,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
