//! # Currency Module
//!
//! Supported currencies, fixed exchange rates, and the only two functions
//! allowed to cross between base and local money.
//!
//! ## Rate Representation
//! Rates are micro-units of local currency per ONE unit of the base
//! currency (MXN). 0.058 USD/MXN becomes `58_000`; 230 COP/MXN becomes
//! `230_000_000`. Integer rates keep the whole pipeline float-free and make
//! a zero rate unrepresentable in the table, so conversion has no failure
//! mode to defend against.
//!
//! ## Conversion Directions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base → local   Currency::to_local()   threshold comparison, display   │
//! │  local → base   Currency::to_base()    shipping tariff into totals     │
//! │                                                                         │
//! │  These are the ONLY two legitimate rate multiplications in the system. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::country::Country;
use crate::money::{BaseMoney, LocalMoney};

/// Micro-units per whole unit, the fixed point of the rate table.
pub const RATE_SCALE: i128 = 1_000_000;

// =============================================================================
// Currency
// =============================================================================

/// A supported settlement currency.
///
/// MXN is the base currency: every persisted amount is MXN centavos and
/// `Mxn.rate_micros()` is exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Mxn,
    Usd,
    Eur,
    Cop,
    Ars,
    Clp,
    Cad,
    Brl,
    Pen,
    Gtq,
}

impl Currency {
    /// The base currency all amounts are persisted in.
    pub const BASE: Currency = Currency::Mxn;

    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Mxn => "MXN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Cop => "COP",
            Currency::Ars => "ARS",
            Currency::Clp => "CLP",
            Currency::Cad => "CAD",
            Currency::Brl => "BRL",
            Currency::Pen => "PEN",
            Currency::Gtq => "GTQ",
        }
    }

    /// Exchange rate in micro-units of this currency per 1 MXN.
    pub const fn rate_micros(&self) -> i64 {
        match self {
            Currency::Mxn => 1_000_000,   // base, 1.0 by definition
            Currency::Usd => 58_000,      // 1 MXN = 0.058 USD
            Currency::Eur => 53_000,      // 1 MXN = 0.053 EUR
            Currency::Cop => 230_000_000, // 1 MXN = 230 COP
            Currency::Ars => 52_000_000,  // 1 MXN = 52 ARS
            Currency::Clp => 52_000_000,  // 1 MXN = 52 CLP
            Currency::Cad => 79_000,      // 1 MXN = 0.079 CAD
            Currency::Brl => 280_000,     // 1 MXN = 0.28 BRL
            Currency::Pen => 220_000,     // 1 MXN = 0.22 PEN
            Currency::Gtq => 450_000,     // 1 MXN = 0.45 GTQ
        }
    }

    /// Display glyph for receipts and order snapshots.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Mxn
            | Currency::Usd
            | Currency::Cop
            | Currency::Ars
            | Currency::Clp
            | Currency::Cad => "$",
            Currency::Eur => "€",
            Currency::Brl => "R$",
            Currency::Pen => "S/",
            Currency::Gtq => "Q",
        }
    }

    /// Strict lookup by ISO code.
    pub fn from_code(code: &str) -> Option<Currency> {
        match code {
            "MXN" => Some(Currency::Mxn),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "COP" => Some(Currency::Cop),
            "ARS" => Some(Currency::Ars),
            "CLP" => Some(Currency::Clp),
            "CAD" => Some(Currency::Cad),
            "BRL" => Some(Currency::Brl),
            "PEN" => Some(Currency::Pen),
            "GTQ" => Some(Currency::Gtq),
            _ => None,
        }
    }

    /// Lenient lookup: accepts a currency code, a country code (resolved to
    /// that country's currency), and falls back to the base currency for
    /// anything else.
    ///
    /// Storefront callers historically sent both kinds of code through the
    /// same parameter, so this keeps checkout resilient instead of erroring.
    pub fn normalize(code: &str) -> Currency {
        if let Some(currency) = Currency::from_code(code) {
            return currency;
        }
        if let Some(country) = Country::from_code(code) {
            return country.config().currency;
        }
        Currency::BASE
    }

    /// Display glyph for an arbitrary code, defaulting to `"$"`.
    pub fn symbol_for(code: &str) -> &'static str {
        match Currency::from_code(code) {
            Some(currency) => currency.symbol(),
            None => "$",
        }
    }

    /// Converts a base-currency amount into this currency.
    ///
    /// Half-up rounding to whole local cents; the result is for threshold
    /// comparison and display only and is never persisted.
    pub fn to_local(&self, amount: BaseMoney) -> LocalMoney {
        let micros = self.rate_micros() as i128;
        let cents = (amount.cents() as i128 * micros + RATE_SCALE / 2) / RATE_SCALE;
        LocalMoney::from_cents(cents as i64)
    }

    /// Converts a local-currency amount back into base currency.
    ///
    /// Used when a locally denominated tariff (shipping cost, threshold
    /// remainder) has to enter the base-currency totals.
    pub fn to_base(&self, amount: LocalMoney) -> BaseMoney {
        let micros = self.rate_micros() as i128;
        let cents = (amount.cents() as i128 * RATE_SCALE + micros / 2) / micros;
        BaseMoney::from_cents(cents as i64)
    }

    /// All supported currencies.
    pub const fn all() -> [Currency; 10] {
        [
            Currency::Mxn,
            Currency::Usd,
            Currency::Eur,
            Currency::Cop,
            Currency::Ars,
            Currency::Clp,
            Currency::Cad,
            Currency::Brl,
            Currency::Pen,
            Currency::Gtq,
        ]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
