//! Market Server - 多卖家电商平台订单引擎
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 原子库存扣减、状态机、取消回补库存
//! - **定价** (`pricing`): 金额计算与优惠券折扣
//! - **评价** (`reviews`): 评价审核与商品评分聚合
//! - **数据库** (`db`): SQLite (sqlx) 存储与迁移
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! market-server/src/
//! ├── core/           # 配置、状态、错误、服务器
//! ├── auth/           # JWT 认证、角色中间件
//! ├── api/            # HTTP 路由和处理器
//! ├── services/       # HTTP 服务 (路由组装)
//! ├── orders/         # 下单、状态流转、订单号
//! ├── pricing/        # 金额、运费税费、优惠券
//! ├── reviews/        # 评价服务与评分聚合
//! ├── notifications/  # 站内通知写入
//! ├── utils/          # 日志、校验、分页
//! └── db/             # 连接池与仓储
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notifications;
pub mod orders;
pub mod pricing;
pub mod reviews;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::OrderService;
pub use reviews::ReviewService;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、读取配置、初始化日志
///
/// 返回加载好的配置，供 [`ServerState::initialize`] 使用
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    let log_dir = config.log_dir();
    let log_dir = log_dir.to_string_lossy();
    init_logger_with_file(&config.log_level, config.is_production(), Some(&log_dir))?;

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    __  ___           __        __
   /  |/  /___ ______/ /_____  / /_
  / /|_/ / __ `/ ___/ //_/ _ \/ __/
 / /  / / /_/ / /  / ,< /  __/ /_
/_/  /_/\__,_/_/  /_/|_|\___/\__/
    "#
    );
}
