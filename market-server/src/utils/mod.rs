//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - [`ApiResponse`] - 错误响应体 (from shared::error)
//! - [`Page`] - 分页响应
//! - 日志、输入校验等工具

pub mod logger;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use serde::{Deserialize, Serialize};

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// 每页条数上限
pub const MAX_PAGE_SIZE: i64 = 100;

/// 分页窗口 (page 从 1 开始)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    /// 规范化 page/limit: page >= 1, 1 <= limit <= MAX_PAGE_SIZE
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.map(i64::from).unwrap_or(1).max(1),
            limit: limit
                .map(i64::from)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL OFFSET
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// 分页响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            page: window.page,
            pages: (total + window.limit - 1) / window.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_normalizes() {
        let w = PageWindow::new(Some(0), Some(1000));
        assert_eq!(w.page, 1);
        assert_eq!(w.limit, MAX_PAGE_SIZE);
        assert_eq!(PageWindow::new(Some(3), Some(10)).offset(), 20);
        assert_eq!(PageWindow::new(None, None).limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = Page::new(vec![1, 2], 21, PageWindow::new(Some(1), Some(10)));
        assert_eq!(page.pages, 3);
        let empty: Page<i32> = Page::new(vec![], 0, PageWindow::new(None, None));
        assert_eq!(empty.pages, 0);
    }
}
