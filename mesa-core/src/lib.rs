//! Mesa Core - 餐厅实时状态协调核心
//!
//! # 架构概述
//!
//! 客户端、员工端与管理端同时观察同一批订单和服务请求。所有状态
//! 变更由生命周期引擎校验并写入实体存储；每个角色（包括发起命令
//! 的角色自己）都通过存储的实时订阅获知变化：
//!
//! ```text
//! role view ──command──► LifecycleEngine ──write──► EntityStore
//!     ▲                                                 │ change feed
//!     └───────── SubscriptionRouter ◄── full snapshot ──┘
//! ```
//!
//! - **存储** (`store`): 实体存储接口 + redb 内嵌文档引擎
//! - **生命周期** (`lifecycle`): 下单/请求命令、金额计算、聚合统计
//! - **订阅** (`subscriptions`): 角色查询范围、实时快照路由
//! - **视图** (`views`): 客户端 / 员工端 / 管理端门面、购物车
//!
//! # 模块结构
//!
//! ```text
//! mesa-core/src/
//! ├── core/           # 配置
//! ├── store/          # 实体存储接口 + redb 文档引擎
//! ├── lifecycle/      # 命令处理、金额、聚合
//! ├── subscriptions/  # 角色范围、实时查询路由
//! ├── views/          # 三种角色门面、购物车
//! └── utils/          # 日志
//! ```

pub mod core;
pub mod lifecycle;
pub mod store;
pub mod subscriptions;
pub mod utils;
pub mod views;

// Re-export 公共类型
pub use crate::core::Config;
pub use lifecycle::{DashboardStats, LifecycleEngine, PopularItem};
pub use store::{
    DocumentStore, EntityStore, Filter, Query, Snapshot, SnapshotStream, StoreError, StoreOptions,
    StoreResult, UpdateOutcome,
};
pub use subscriptions::{ConnectivityStatus, SubscriptionRouter, ViewScope, ViewSubscription};
pub use views::{AdminView, Cart, CartLine, ClientView, NoopListener, StaffView, ViewListener};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
