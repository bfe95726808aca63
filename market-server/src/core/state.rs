use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::orders::OrderService;
use crate::reviews::ReviewService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 字段都是引用计数句柄，clone 成本极低，axum 每个请求 clone 一次。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | orders | OrderService | 订单引擎 |
/// | reviews | ReviewService | 评价与评分聚合 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 订单引擎
    pub orders: OrderService,
    /// 评价服务
    pub reviews: ReviewService,
}

impl ServerState {
    /// 用已打开的连接池组装状态 (测试里直接使用)
    pub fn new(config: Config, pool: SqlitePool, jwt_service: Arc<JwtService>) -> Self {
        let orders = OrderService::new(pool.clone(), config.pricing(), config.order_timeout());
        let reviews = ReviewService::new(pool.clone());
        Self {
            config,
            pool,
            jwt_service,
            orders,
            reviews,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (database/, logs/)
    /// 2. 数据库 (work_dir/database/market.db) 并执行迁移
    /// 3. JWT 服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(config.log_dir())?;

        let db_path = config.database_path();
        let db_path = db_path
            .to_str()
            .ok_or_else(|| ServerError::Config(format!("Non UTF-8 database path: {db_path:?}")))?;
        let db = DbService::new(db_path).await?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        tracing::info!(
            work_dir = %config.work_dir,
            environment = %config.environment,
            "Server state initialized"
        );
        Ok(Self::new(config.clone(), db.pool, jwt_service))
    }

    /// 获取数据库连接池
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn order_service(&self) -> &OrderService {
        &self.orders
    }

    pub fn review_service(&self) -> &ReviewService {
        &self.reviews
    }
}
