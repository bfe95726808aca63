use crate::auth::JwtConfig;
use crate::pricing::PricingPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置 - 市场服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./work_dir | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | ORDER_TIMEOUT_MS | 5000 | 单次下单的截止时间 |
/// | TAX_RATE_PERCENT | 5 | 税率 (%) |
/// | FREE_SHIPPING_THRESHOLD | 50 | 免运费门槛 |
/// | FLAT_SHIPPING_COST | 10 | 未达门槛时的固定运费 |
/// | SELLER_APPLICATION_FEE | 50 | 买家升级卖家的申请费 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭等待时间 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/market HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 下单超时 (毫秒)
    pub order_timeout_ms: u64,
    /// 税率 (百分比)
    pub tax_rate_percent: f64,
    /// 免运费门槛
    pub free_shipping_threshold: f64,
    /// 固定运费
    pub flat_shipping_cost: f64,
    /// 卖家申请费
    pub seller_application_fee: f64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            http_port: env_or("HTTP_PORT", 5000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            order_timeout_ms: env_or("ORDER_TIMEOUT_MS", 5000),
            tax_rate_percent: env_or("TAX_RATE_PERCENT", 5.0),
            free_shipping_threshold: env_or("FREE_SHIPPING_THRESHOLD", 50.0),
            flat_shipping_cost: env_or("FLAT_SHIPPING_COST", 10.0),
            seller_application_fee: env_or("SELLER_APPLICATION_FEE", 50.0),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 使用自定义工作目录和端口覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// SQLite 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database").join("market.db")
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 下单定价参数
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy::new(
            self.tax_rate_percent,
            self.free_shipping_threshold,
            self.flat_shipping_cost,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
