//! # Coupons
//!
//! Coupon entity and the pure redemption check.
//!
//! ## Evaluation Order
//! The checks run in a fixed order and fail fast, so the customer sees the
//! most specific rejection first:
//! ```text
//! restricted email ──► expiry ──► minimum purchase ──► usage cap ──► prior use
//! ```
//!
//! Percentage discounts cap at `max_discount_cents`; fixed discounts do not
//! cap here, the totals aggregator clamps the applied amount instead so the
//! grand total never goes negative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::BaseMoney;

// =============================================================================
// Discount Type
// =============================================================================

/// What kind of discount a coupon grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is basis points off the subtotal (1000 = 10%).
    Percentage,
    /// `value` is a fixed amount in base cents.
    Fixed,
    /// Shipping charge forced to zero; `value` is unused.
    FreeShipping,
}

// =============================================================================
// Coupon
// =============================================================================

/// A discount coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: String,

    /// Redemption code, stored uppercase.
    pub code: String,

    /// Display name shown in the redemption confirmation.
    pub name: String,

    pub discount_type: DiscountType,

    /// Basis points for percentage coupons, base cents for fixed ones.
    pub value: i64,

    /// Cap on a percentage discount, in base cents. `None` means uncapped.
    pub max_discount_cents: Option<i64>,

    /// Minimum subtotal required to redeem, in base cents.
    pub min_purchase_cents: i64,

    /// Total redemptions allowed across all customers. `None` is unlimited.
    pub max_uses: Option<i64>,

    /// Redemptions so far.
    pub used_count: i64,

    /// Limits public coupons to one redemption per customer.
    pub one_per_user: bool,

    /// When set, only this email may redeem, and only once.
    pub restricted_email: Option<String>,

    /// Expiry instant. `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether this coupon may be used at most once per customer.
    ///
    /// Either flagged explicitly, or implied: email-restricted coupons are
    /// personal single-use grants.
    pub fn is_exclusive(&self) -> bool {
        self.one_per_user || self.restricted_email.is_some()
    }
}

// =============================================================================
// Redemption
// =============================================================================

/// Everything the evaluator needs to know about the attempted redemption.
#[derive(Debug, Clone)]
pub struct RedemptionContext<'a> {
    /// Cart subtotal in base cents.
    pub subtotal: BaseMoney,
    /// The redeeming customer's email, lowercase.
    pub user_email: &'a str,
    /// Whether this customer has redeemed this coupon before.
    pub already_used: bool,
    /// The evaluation instant.
    pub now: DateTime<Utc>,
}

/// Why a redemption was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("coupon not found or inactive")]
    NotFound,

    #[error("coupon is reserved for another customer")]
    RestrictedEmail,

    #[error("coupon expired")]
    Expired,

    #[error("minimum purchase of {required_cents} cents not met")]
    MinPurchase { required_cents: i64 },

    #[error("coupon usage limit reached")]
    UsageLimit,

    #[error("coupon already redeemed by this customer")]
    AlreadyUsed,
}

/// The outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponGrant {
    /// Discount in base cents (zero for free-shipping coupons).
    pub discount: BaseMoney,
    /// Whether shipping must be forced free.
    pub free_shipping: bool,
}

/// Evaluates a redemption attempt against a coupon.
///
/// Pure function over the context, so it is trivially testable; the
/// checkout layer supplies `already_used` from the usage table and holds
/// the usage-cap race closed with a conditional update at commit time.
pub fn evaluate(coupon: &Coupon, ctx: &RedemptionContext<'_>) -> Result<CouponGrant, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::NotFound);
    }

    if let Some(restricted) = &coupon.restricted_email {
        if !restricted.eq_ignore_ascii_case(ctx.user_email) {
            return Err(CouponRejection::RestrictedEmail);
        }
    }

    if let Some(expires_at) = coupon.expires_at {
        if ctx.now > expires_at {
            return Err(CouponRejection::Expired);
        }
    }

    if ctx.subtotal.cents() < coupon.min_purchase_cents {
        return Err(CouponRejection::MinPurchase {
            required_cents: coupon.min_purchase_cents,
        });
    }

    if let Some(max_uses) = coupon.max_uses {
        if coupon.used_count >= max_uses {
            return Err(CouponRejection::UsageLimit);
        }
    }

    if coupon.is_exclusive() && ctx.already_used {
        return Err(CouponRejection::AlreadyUsed);
    }

    let grant = match coupon.discount_type {
        DiscountType::Percentage => {
            // A stored value outside 0..=10000 bps is a data entry error;
            // clamp rather than over- or under-discount.
            let bps = coupon.value.clamp(0, 10_000) as u32;
            let mut discount = ctx.subtotal.percentage(bps);
            if let Some(cap) = coupon.max_discount_cents {
                discount = discount.min(BaseMoney::from_cents(cap));
            }
            CouponGrant {
                discount,
                free_shipping: false,
            }
        }
        DiscountType::Fixed => CouponGrant {
            discount: BaseMoney::from_cents(coupon.value),
            free_shipping: false,
        },
        DiscountType::FreeShipping => CouponGrant {
            discount: BaseMoney::zero(),
            free_shipping: true,
        },
    };

    Ok(grant)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_coupon() -> Coupon {
        Coupon {
            id: "c1".to_string(),
            code: "SAVE10".to_string(),
            name: "10% Off".to_string(),
            discount_type: DiscountType::Percentage,
            value: 1000,
            max_discount_cents: Some(5_000),
            min_purchase_cents: 0,
            max_uses: None,
            used_count: 0,
            one_per_user: false,
            restricted_email: None,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn ctx(subtotal_cents: i64) -> RedemptionContext<'static> {
        RedemptionContext {
            subtotal: BaseMoney::from_cents(subtotal_cents),
            user_email: "ana@example.com",
            already_used: false,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_percentage_discount_capped() {
        // 10% of 1000.00 is 100.00, capped at 50.00.
        let grant = evaluate(&base_coupon(), &ctx(100_000)).unwrap();
        assert_eq!(grant.discount, BaseMoney::from_cents(5_000));
        assert!(!grant.free_shipping);
    }

    #[test]
    fn test_percentage_discount_under_cap() {
        // 10% of 200.00 is 20.00, under the cap.
        let grant = evaluate(&base_coupon(), &ctx(20_000)).unwrap();
        assert_eq!(grant.discount, BaseMoney::from_cents(2_000));
    }

    #[test]
    fn test_fixed_discount_not_capped_here() {
        let coupon = Coupon {
            discount_type: DiscountType::Fixed,
            value: 50_000,
            max_discount_cents: None,
            ..base_coupon()
        };
        // Larger than the subtotal; the totals aggregator clamps later.
        let grant = evaluate(&coupon, &ctx(10_000)).unwrap();
        assert_eq!(grant.discount, BaseMoney::from_cents(50_000));
    }

    #[test]
    fn test_free_shipping_grants_no_discount() {
        let coupon = Coupon {
            discount_type: DiscountType::FreeShipping,
            value: 0,
            ..base_coupon()
        };
        let grant = evaluate(&coupon, &ctx(10_000)).unwrap();
        assert_eq!(grant.discount, BaseMoney::zero());
        assert!(grant.free_shipping);
    }

    #[test]
    fn test_inactive_coupon_rejected() {
        let coupon = Coupon {
            is_active: false,
            ..base_coupon()
        };
        assert_eq!(evaluate(&coupon, &ctx(100_000)), Err(CouponRejection::NotFound));
    }

    #[test]
    fn test_restricted_email_rejected() {
        let coupon = Coupon {
            restricted_email: Some("vip@example.com".to_string()),
            ..base_coupon()
        };
        assert_eq!(
            evaluate(&coupon, &ctx(100_000)),
            Err(CouponRejection::RestrictedEmail)
        );
    }

    #[test]
    fn test_restricted_email_case_insensitive_match() {
        let coupon = Coupon {
            restricted_email: Some("ANA@Example.com".to_string()),
            ..base_coupon()
        };
        assert!(evaluate(&coupon, &ctx(100_000)).is_ok());
    }

    #[test]
    fn test_expired_coupon_rejected() {
        let coupon = Coupon {
            expires_at: Some(Utc::now() - Duration::days(1)),
            ..base_coupon()
        };
        assert_eq!(evaluate(&coupon, &ctx(100_000)), Err(CouponRejection::Expired));
    }

    #[test]
    fn test_min_purchase_rejected() {
        let coupon = Coupon {
            min_purchase_cents: 50_000,
            ..base_coupon()
        };
        assert_eq!(
            evaluate(&coupon, &ctx(40_000)),
            Err(CouponRejection::MinPurchase {
                required_cents: 50_000
            })
        );
        // Exactly at the minimum is allowed.
        assert!(evaluate(&coupon, &ctx(50_000)).is_ok());
    }

    #[test]
    fn test_usage_limit_rejected() {
        let coupon = Coupon {
            max_uses: Some(3),
            used_count: 3,
            ..base_coupon()
        };
        assert_eq!(evaluate(&coupon, &ctx(100_000)), Err(CouponRejection::UsageLimit));
    }

    #[test]
    fn test_prior_use_rejected_for_personal_coupon() {
        let coupon = Coupon {
            restricted_email: Some("ana@example.com".to_string()),
            ..base_coupon()
        };
        let ctx = RedemptionContext {
            already_used: true,
            ..ctx(100_000)
        };
        assert_eq!(evaluate(&coupon, &ctx), Err(CouponRejection::AlreadyUsed));
    }

    #[test]
    fn test_prior_use_allowed_for_public_coupon() {
        let ctx = RedemptionContext {
            already_used: true,
            ..ctx(100_000)
        };
        assert!(evaluate(&base_coupon(), &ctx).is_ok());
    }

    #[test]
    fn test_prior_use_rejected_for_one_per_user_public_coupon() {
        // No email restriction, but flagged single-use-per-customer.
        let coupon = Coupon {
            one_per_user: true,
            ..base_coupon()
        };
        let ctx = RedemptionContext {
            already_used: true,
            ..ctx(100_000)
        };
        assert_eq!(evaluate(&coupon, &ctx), Err(CouponRejection::AlreadyUsed));
    }

    #[test]
    fn test_percentage_value_clamped_to_valid_bps() {
        // Negative stored value grants nothing rather than underflowing.
        let negative = Coupon {
            value: -500,
            max_discount_cents: None,
            ..base_coupon()
        };
        let grant = evaluate(&negative, &ctx(100_000)).unwrap();
        assert_eq!(grant.discount, BaseMoney::zero());

        // Over 100% clamps to the full subtotal.
        let oversized = Coupon {
            value: 25_000,
            max_discount_cents: None,
            ..base_coupon()
        };
        let grant = evaluate(&oversized, &ctx(100_000)).unwrap();
        assert_eq!(grant.discount, BaseMoney::from_cents(100_000));
    }

    #[test]
    fn test_rejection_order_email_before_expiry() {
        let coupon = Coupon {
            restricted_email: Some("vip@example.com".to_string()),
            expires_at: Some(Utc::now() - Duration::days(1)),
            ..base_coupon()
        };
        assert_eq!(
            evaluate(&coupon, &ctx(100_000)),
            Err(CouponRejection::RestrictedEmail)
        );
    }
}
