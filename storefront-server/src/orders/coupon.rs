//! Coupon evaluator seam
//!
//! Checkout accepts an optional coupon code but pricing promotions live in a
//! separate service. The ledger only needs a discount amount back; this trait
//! is the seam, and [`NoCoupons`] is the deployment without a promotion
//! engine attached.

use async_trait::async_trait;
use shared::{AppError, AppResult};

/// Resolves a coupon code into a discount amount for a given subtotal
#[async_trait]
pub trait CouponEvaluator: Send + Sync {
    /// Discount (major units) for this code, or an error if the code is
    /// not redeemable by this user
    async fn apply_discount(
        &self,
        subtotal: f64,
        code: Option<&str>,
        user_id: &str,
    ) -> AppResult<f64>;
}

/// Evaluator used when no promotion engine is configured
///
/// No code means no discount; any supplied code is rejected rather than
/// silently ignored.
pub struct NoCoupons;

#[async_trait]
impl CouponEvaluator for NoCoupons {
    async fn apply_discount(
        &self,
        _subtotal: f64,
        code: Option<&str>,
        _user_id: &str,
    ) -> AppResult<f64> {
        match code {
            None => Ok(0.0),
            Some(code) => Err(AppError::validation(format!(
                "Unknown coupon code: {}",
                code
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_code_means_no_discount() {
        let discount = NoCoupons
            .apply_discount(100.0, None, "user-1")
            .await
            .unwrap();
        assert_eq!(discount, 0.0);
    }

    #[tokio::test]
    async fn any_code_is_rejected() {
        let err = NoCoupons
            .apply_discount(100.0, Some("SAVE10"), "user-1")
            .await
            .unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
    }
}
