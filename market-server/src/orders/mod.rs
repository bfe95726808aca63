//! Order Engine
//!
//! Order placement, the status state machine and cancellation with restock.
//!
//! - **service**: `OrderService`: create / transition / cancel / read paths
//! - **status**: transition table checked before every status write
//! - **numbering**: `ORD` + YYMM + sequence formatting
//! - **error**: `OrderError` and its mapping onto API error codes
//!
//! # Creation Flow
//!
//! ```text
//! create(buyer, input)
//!     ├─ 1. Merge duplicate lines, validate quantities
//!     ├─ 2. Load + check every product (no writes yet)
//!     ├─ 3. Snapshot lines, subtotal, coupon quote, totals
//!     ├─ 4. BEGIN
//!     │     ├─ conditional stock decrement per line (0 rows → StockConflict)
//!     │     ├─ next order sequence
//!     │     ├─ insert order + items + history {pending}
//!     │     ├─ coupon usage counters
//!     │     └─ clear cart
//!     ├─ 5. COMMIT                              ── steps 1-5 bounded by order_timeout
//!     └─ 6. Reload + notifications (best effort, never turns a commit into an error)
//! ```

pub mod error;
pub mod numbering;
pub mod service;
pub mod status;

// Re-exports
pub use error::{OrderError, OrderResult};
pub use numbering::format_order_number;
pub use service::OrderService;
pub use status::{allowed_next, check_transition, is_terminal};
