//! # Pricing Pipeline
//!
//! Tax, shipping, and order-total calculation.
//!
//! ## Calculation Flow
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │ Subtotal │───►│   Tax    │───►│ Shipping │───►│  Total   │
//! │  (base)  │    │ (country │    │ (tier +  │    │ (+ wrap  │
//! │          │    │   bps)   │    │  free    │    │  - disc, │
//! │          │    │          │    │  thresh) │    │  ≥ 0)    │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! All arithmetic happens in base-currency cents. The only place local
//! currency enters is the free-shipping threshold comparison, which the
//! country tables define in the customer's local major units.

use serde::{Deserialize, Serialize};

use crate::country::Country;
use crate::currency::Currency;
use crate::money::{BaseMoney, LocalMoney};

/// Flat gift wrap fee, charged once per order (20.00 in base currency).
pub const GIFT_WRAP_FEE: BaseMoney = BaseMoney::from_cents(2000);

// =============================================================================
// Tax
// =============================================================================

/// The tax portion of an order, with the jurisdiction label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Rate in basis points.
    pub rate_bps: u32,
    /// Display name of the tax ("IVA", "Sales Tax", ...).
    pub name: String,
    /// Tax amount in base cents, rounded half-up.
    pub amount: BaseMoney,
}

/// Computes the tax owed on a subtotal for a given country.
pub fn calculate_tax(subtotal: BaseMoney, country: Country) -> TaxBreakdown {
    let config = country.config();
    TaxBreakdown {
        rate_bps: config.tax_rate.bps(),
        name: config.tax_name.to_string(),
        amount: subtotal.calculate_tax(config.tax_rate),
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping speed the customer picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingTier {
    Standard,
    Express,
}

impl Default for ShippingTier {
    fn default() -> Self {
        ShippingTier::Standard
    }
}

/// The shipping cost decision for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    /// What the customer pays, in base cents. Zero when free.
    pub cost: BaseMoney,
    /// Tier the quote was computed for.
    pub tier: ShippingTier,
    /// Whether the free-shipping threshold was met.
    pub is_free: bool,
    /// The threshold, in local major-unit cents (display only).
    pub free_threshold: LocalMoney,
    /// How much more base-currency spend would unlock free shipping.
    /// `None` once the threshold is met.
    pub amount_for_free: Option<BaseMoney>,
    /// Currency the threshold and tariffs are denominated in.
    pub currency: Currency,
}

/// Computes the shipping cost for a subtotal shipped to a country.
///
/// The threshold comparison happens in the destination's local currency:
/// the subtotal converts to local cents and compares against the table
/// threshold. Tariffs convert back to base cents for the charge.
pub fn calculate_shipping(subtotal: BaseMoney, country: Country, tier: ShippingTier) -> ShippingQuote {
    let config = country.config();
    let currency = config.currency;

    let local_subtotal = currency.to_local(subtotal);
    let threshold = config.free_shipping_threshold;

    if local_subtotal.cents() >= threshold.cents() {
        return ShippingQuote {
            cost: BaseMoney::zero(),
            tier,
            is_free: true,
            free_threshold: threshold,
            amount_for_free: None,
            currency,
        };
    }

    let tariff = match tier {
        ShippingTier::Standard => config.shipping_standard,
        ShippingTier::Express => config.shipping_express,
    };
    let missing = threshold.saturating_sub(local_subtotal);

    ShippingQuote {
        cost: currency.to_base(tariff),
        tier,
        is_free: false,
        free_threshold: threshold,
        amount_for_free: Some(currency.to_base(missing)),
        currency,
    }
}

// =============================================================================
// Totals
// =============================================================================

/// The full monetary breakdown of an order.
///
/// Invariant: `total = subtotal + tax + shipping + gift_wrap - discount`,
/// where `discount` is the amount actually applied (clamped so the total
/// never goes below zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsBreakdown {
    pub subtotal: BaseMoney,
    pub tax: TaxBreakdown,
    pub shipping: ShippingQuote,
    pub gift_wrap: BaseMoney,
    /// Discount actually applied, after clamping.
    pub discount: BaseMoney,
    pub total: BaseMoney,
    pub country: Country,
}

/// Aggregates an order's totals.
///
/// `discount` is the amount a coupon already granted (zero when none).
/// `free_shipping` forces the shipping charge to zero regardless of the
/// threshold, for free-shipping coupons. A fixed discount larger than the
/// rest of the order clamps to it, so the grand total floors at zero and
/// the recorded discount stays consistent with the charged amount.
pub fn calculate_totals(
    subtotal: BaseMoney,
    country: Country,
    tier: ShippingTier,
    discount: BaseMoney,
    gift_wrap: bool,
    free_shipping: bool,
) -> TotalsBreakdown {
    let tax = calculate_tax(subtotal, country);

    let mut shipping = calculate_shipping(subtotal, country, tier);
    if free_shipping && !shipping.is_free {
        shipping.cost = BaseMoney::zero();
        shipping.is_free = true;
        shipping.amount_for_free = None;
    }

    let wrap = if gift_wrap { GIFT_WRAP_FEE } else { BaseMoney::zero() };

    let gross = subtotal + tax.amount + shipping.cost + wrap;
    let applied = discount.min(gross).max(BaseMoney::zero());
    let total = gross - applied;

    TotalsBreakdown {
        subtotal,
        tax,
        shipping,
        gift_wrap: wrap,
        discount: applied,
        total,
        country,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
