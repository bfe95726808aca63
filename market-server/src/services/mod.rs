//! 服务层
//!
//! - [`HttpService`] - axum 路由装配与进程内请求分发

pub mod http;

pub use self::http::{HttpService, build_app, build_router};
