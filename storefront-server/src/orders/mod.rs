//! Orders Module
//!
//! The order ledger: converts a cart into an immutable order with computed
//! totals, and owns the pricing rules applied at checkout.
//!
//! ## Module structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | ledger | Checkout pipeline and total computation |
//! | number | Order number generation |
//! | coupon | Coupon evaluator collaborator seam |

pub mod coupon;
pub mod ledger;
pub mod number;

pub use coupon::{CouponEvaluator, NoCoupons};
pub use ledger::{CheckoutRequest, OrderLedger, OrderTotals};
pub use number::generate_order_number;
