//! Core types for Voltcart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod order;
pub mod pricing;

pub use category::{ProductCategory, UnknownCategory};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{MAX_STATUS_LENGTH, ORDER_PLACED, PaymentMethod, UnknownPaymentMethod};
pub use pricing::{LineItem, line_total, sum_line_totals};
