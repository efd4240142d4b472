//! Atelier Order Server - 订单管理后台服务
//!
//! # 架构概述
//!
//! 本模块是订单管理后台的主入口，提供以下核心功能：
//!
//! - **订单服务** (`orders`): 内存订单集、检索索引、退款账本、发货管理
//! - **外部存储** (`store`): 订单文档存储的 CRUD 客户端
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── orders/        # 订单服务 (索引/账本/统计/同步)
//! ├── store/         # 外部订单存储客户端
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志等工具函数
//! ```

pub mod api;
pub mod core;
pub mod orders;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use orders::{OrderService, OrderStats};
pub use store::OrderStore;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ___   __       ___
   /   | / /____  / (_)__  _____
  / /| |/ __/ _ \/ / / _ \/ ___/
 / ___ / /_/  __/ / /  __/ /
/_/  |_\__/\___/_/_/\___/_/
        order server
    "#
    );
}

/// 设置运行环境 (dotenv, 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
