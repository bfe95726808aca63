//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、登录、当前用户
//! - [`account`] - 个人资料、收货地址、收藏夹、卖家申请
//! - [`categories`] - 分类管理接口
//! - [`products`] - 商品管理接口 (含商品评价列表)
//! - [`cart`] - 购物车
//! - [`orders`] - 下单、状态流转、取消
//! - [`coupons`] - 优惠券校验与管理
//! - [`reviews`] - 评价与审核
//! - [`notifications`] - 站内通知
//! - [`messages`] - 买家与卖家的会话消息

pub mod auth;
pub mod health;

// Account
pub mod account;
pub mod cart;
pub mod messages;
pub mod notifications;

// Catalog
pub mod categories;
pub mod products;

// Orders
pub mod coupons;
pub mod orders;
pub mod reviews;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
