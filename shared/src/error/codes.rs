//! Unified error codes for the marketplace
//!
//! This module defines all error codes used by market-server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors (61xx category, 67xx coupon, 68xx review)
//! - 8xxx: Account errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is suspended
    AccountSuspended = 1006,
    /// Account is deactivated
    AccountDeactivated = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4002,
    /// Status transition not allowed from the current status
    OrderInvalidTransition = 4003,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4004,
    /// Unknown order status value
    OrderInvalidStatus = 4005,

    // ==================== 5xxx: Payment ====================
    /// Invalid payment method
    PaymentInvalidMethod = 5001,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Not enough stock for the requested quantity
    ProductOutOfStock = 6003,
    /// Product is not available for sale
    ProductUnavailable = 6004,
    /// Stock changed while the order was being placed
    StockConflict = 6005,
    /// Product is referenced by existing orders
    ProductInUse = 6006,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category name already exists
    CategoryNameExists = 6102,
    /// Category still has products
    CategoryHasProducts = 6103,
    /// Coupon not found
    CouponNotFound = 6701,
    /// Coupon code already exists
    CouponCodeExists = 6702,
    /// Coupon is inactive, expired or exhausted
    CouponInvalid = 6703,
    /// Per-user usage limit reached
    CouponUserLimitReached = 6704,
    /// Coupon does not apply to the products in the cart
    CouponNotApplicable = 6705,
    /// Review not found
    ReviewNotFound = 6801,
    /// User already reviewed this product
    ReviewAlreadyExists = 6802,

    // ==================== 8xxx: Account ====================
    /// User not found
    UserNotFound = 8001,
    /// Email already registered
    EmailExists = 8002,
    /// Address not found
    AddressNotFound = 8003,
    /// Cart item not found
    CartItemNotFound = 8004,
    /// Notification not found
    NotificationNotFound = 8005,
    /// Conversation not found (or caller is not a participant)
    ConversationNotFound = 8006,
    /// Message not found
    MessageNotFound = 8007,
    /// Conversation needs two distinct participants
    ConversationInvalidParticipant = 8008,
    /// Seller application already paid
    SellerApplicationExists = 8009,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::AccountSuspended => "Account is suspended",
            ErrorCode::AccountDeactivated => "Account is deactivated",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Required role is missing",
            ErrorCode::AdminRequired => "Admin role required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "No items in order",
            ErrorCode::OrderInvalidTransition => "Order status transition is not allowed",
            ErrorCode::OrderNotCancellable => "Order cannot be cancelled at this stage",
            ErrorCode::OrderInvalidStatus => "Invalid order status",

            // Payment
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductOutOfStock => "Insufficient stock",
            ErrorCode::ProductUnavailable => "Product is not available",
            ErrorCode::StockConflict => "Stock changed during checkout",
            ErrorCode::ProductInUse => "Product is referenced by existing orders",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::CategoryHasProducts => "Category has products",
            ErrorCode::CouponNotFound => "Invalid coupon code",
            ErrorCode::CouponCodeExists => "Coupon code already exists",
            ErrorCode::CouponInvalid => "Coupon is expired or no longer valid",
            ErrorCode::CouponUserLimitReached => "You have already used this coupon",
            ErrorCode::CouponNotApplicable => "Coupon is not applicable to items in cart",
            ErrorCode::ReviewNotFound => "Review not found",
            ErrorCode::ReviewAlreadyExists => "You have already reviewed this product",

            // Account
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailExists => "Email is already registered",
            ErrorCode::AddressNotFound => "Address not found",
            ErrorCode::CartItemNotFound => "Item not found in cart",
            ErrorCode::NotificationNotFound => "Notification not found",
            ErrorCode::ConversationNotFound => "Conversation not found",
            ErrorCode::MessageNotFound => "Message not found",
            ErrorCode::ConversationInvalidParticipant => "Invalid conversation participant",
            ErrorCode::SellerApplicationExists => {
                "You have already paid the seller application fee"
            }

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1006 => Ok(ErrorCode::AccountSuspended),
            1007 => Ok(ErrorCode::AccountDeactivated),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderInvalidTransition),
            4004 => Ok(ErrorCode::OrderNotCancellable),
            4005 => Ok(ErrorCode::OrderInvalidStatus),

            // Payment
            5001 => Ok(ErrorCode::PaymentInvalidMethod),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductUnavailable),
            6005 => Ok(ErrorCode::StockConflict),
            6006 => Ok(ErrorCode::ProductInUse),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryNameExists),
            6103 => Ok(ErrorCode::CategoryHasProducts),
            6701 => Ok(ErrorCode::CouponNotFound),
            6702 => Ok(ErrorCode::CouponCodeExists),
            6703 => Ok(ErrorCode::CouponInvalid),
            6704 => Ok(ErrorCode::CouponUserLimitReached),
            6705 => Ok(ErrorCode::CouponNotApplicable),
            6801 => Ok(ErrorCode::ReviewNotFound),
            6802 => Ok(ErrorCode::ReviewAlreadyExists),

            // Account
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::EmailExists),
            8003 => Ok(ErrorCode::AddressNotFound),
            8004 => Ok(ErrorCode::CartItemNotFound),
            8005 => Ok(ErrorCode::NotificationNotFound),
            8006 => Ok(ErrorCode::ConversationNotFound),
            8007 => Ok(ErrorCode::MessageNotFound),
            8008 => Ok(ErrorCode::ConversationInvalidParticipant),
            8009 => Ok(ErrorCode::SellerApplicationExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
