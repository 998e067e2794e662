//! # Country Configuration
//!
//! The static table driving multi-country pricing: one entry per supported
//! country with its currency, tax regime, and shipping tariffs.
//!
//! ## Units
//! Tax rates are basis points. Shipping tariffs and the free-shipping
//! threshold are LOCAL currency (that is how the business publishes them:
//! "free shipping over $1,500 MXN" in Mexico, "over $100 USD" in the US).
//! Everything else in the system is base currency.
//!
//! ## Lenient Resolution
//! `Country::resolve` accepts a country code, a currency code (legacy
//! clients send either through the same field), and falls back to the
//! default country for anything unknown. A storefront should keep quoting
//! rather than 500 on a malformed region cookie.

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::money::LocalMoney;
use crate::types::TaxRate;

// =============================================================================
// Country
// =============================================================================

/// A supported shipping destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Mx,
    Us,
    Es,
    Co,
    Ar,
    Cl,
    Ca,
    Br,
    Pe,
    Gt,
}

/// Static pricing configuration for one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountryConfig {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Settlement currency for display and threshold math.
    pub currency: Currency,
    /// Tax rate in basis points.
    pub tax_rate: TaxRate,
    /// Local tax label shown on receipts (IVA, Sales Tax, HST, ...).
    pub tax_name: &'static str,
    /// Standard shipping tariff, local currency.
    pub shipping_standard: LocalMoney,
    /// Express shipping tariff, local currency.
    pub shipping_express: LocalMoney,
    /// Subtotal (local currency) at which shipping becomes free.
    pub free_shipping_threshold: LocalMoney,
}

// =============================================================================
// Static Configuration Table
// =============================================================================

static MX_CONFIG: CountryConfig = CountryConfig {
    code: "MX",
    name: "México",
    currency: Currency::Mxn,
    tax_rate: TaxRate::from_bps(1600), // IVA 16%
    tax_name: "IVA",
    shipping_standard: LocalMoney::from_major(99),
    shipping_express: LocalMoney::from_major(199),
    free_shipping_threshold: LocalMoney::from_major(1500),
};

static US_CONFIG: CountryConfig = CountryConfig {
    code: "US",
    name: "Estados Unidos",
    currency: Currency::Usd,
    tax_rate: TaxRate::from_bps(825), // Sales tax average ~8.25%
    tax_name: "Sales Tax",
    shipping_standard: LocalMoney::from_major(15),
    shipping_express: LocalMoney::from_major(35),
    free_shipping_threshold: LocalMoney::from_major(100),
};

static ES_CONFIG: CountryConfig = CountryConfig {
    code: "ES",
    name: "España",
    currency: Currency::Eur,
    tax_rate: TaxRate::from_bps(2100), // IVA 21%
    tax_name: "IVA",
    shipping_standard: LocalMoney::from_major(12),
    shipping_express: LocalMoney::from_major(25),
    free_shipping_threshold: LocalMoney::from_major(80),
};

static CO_CONFIG: CountryConfig = CountryConfig {
    code: "CO",
    name: "Colombia",
    currency: Currency::Cop,
    tax_rate: TaxRate::from_bps(1900), // IVA 19%
    tax_name: "IVA",
    shipping_standard: LocalMoney::from_major(25_000),
    shipping_express: LocalMoney::from_major(45_000),
    free_shipping_threshold: LocalMoney::from_major(300_000),
};

static AR_CONFIG: CountryConfig = CountryConfig {
    code: "AR",
    name: "Argentina",
    currency: Currency::Ars,
    tax_rate: TaxRate::from_bps(2100), // IVA 21%
    tax_name: "IVA",
    shipping_standard: LocalMoney::from_major(2500),
    shipping_express: LocalMoney::from_major(5000),
    free_shipping_threshold: LocalMoney::from_major(50_000),
};

static CL_CONFIG: CountryConfig = CountryConfig {
    code: "CL",
    name: "Chile",
    currency: Currency::Clp,
    tax_rate: TaxRate::from_bps(1900), // IVA 19%
    tax_name: "IVA",
    shipping_standard: LocalMoney::from_major(5000),
    shipping_express: LocalMoney::from_major(10_000),
    free_shipping_threshold: LocalMoney::from_major(80_000),
};

static CA_CONFIG: CountryConfig = CountryConfig {
    code: "CA",
    name: "Canadá",
    currency: Currency::Cad,
    tax_rate: TaxRate::from_bps(1300), // HST average ~13%
    tax_name: "HST",
    shipping_standard: LocalMoney::from_major(18),
    shipping_express: LocalMoney::from_major(40),
    free_shipping_threshold: LocalMoney::from_major(120),
};

static BR_CONFIG: CountryConfig = CountryConfig {
    code: "BR",
    name: "Brasil",
    currency: Currency::Brl,
    tax_rate: TaxRate::from_bps(1700), // ICMS average ~17%
    tax_name: "ICMS",
    shipping_standard: LocalMoney::from_major(35),
    shipping_express: LocalMoney::from_major(70),
    free_shipping_threshold: LocalMoney::from_major(400),
};

static PE_CONFIG: CountryConfig = CountryConfig {
    code: "PE",
    name: "Perú",
    currency: Currency::Pen,
    tax_rate: TaxRate::from_bps(1800), // IGV 18%
    tax_name: "IGV",
    shipping_standard: LocalMoney::from_major(25),
    shipping_express: LocalMoney::from_major(50),
    free_shipping_threshold: LocalMoney::from_major(350),
};

static GT_CONFIG: CountryConfig = CountryConfig {
    code: "GT",
    name: "Guatemala",
    currency: Currency::Gtq,
    tax_rate: TaxRate::from_bps(1200), // IVA 12%
    tax_name: "IVA",
    shipping_standard: LocalMoney::from_major(50),
    shipping_express: LocalMoney::from_major(100),
    free_shipping_threshold: LocalMoney::from_major(800),
};

impl Country {
    /// Fallback destination for unknown codes.
    pub const DEFAULT: Country = Country::Mx;

    /// Strict lookup by country code.
    pub fn from_code(code: &str) -> Option<Country> {
        match code {
            "MX" => Some(Country::Mx),
            "US" => Some(Country::Us),
            "ES" => Some(Country::Es),
            "CO" => Some(Country::Co),
            "AR" => Some(Country::Ar),
            "CL" => Some(Country::Cl),
            "CA" => Some(Country::Ca),
            "BR" => Some(Country::Br),
            "PE" => Some(Country::Pe),
            "GT" => Some(Country::Gt),
            _ => None,
        }
    }

    /// Lenient lookup: country code, else currency code (the reverse map),
    /// else the default country.
    pub fn resolve(code: &str) -> Country {
        if let Some(country) = Country::from_code(code) {
            return country;
        }
        // Legacy clients send the currency where the country belongs
        match Currency::from_code(code) {
            Some(Currency::Mxn) => Country::Mx,
            Some(Currency::Usd) => Country::Us,
            Some(Currency::Eur) => Country::Es,
            Some(Currency::Cop) => Country::Co,
            Some(Currency::Ars) => Country::Ar,
            Some(Currency::Clp) => Country::Cl,
            Some(Currency::Cad) => Country::Ca,
            Some(Currency::Brl) => Country::Br,
            Some(Currency::Pen) => Country::Pe,
            Some(Currency::Gtq) => Country::Gt,
            None => Country::DEFAULT,
        }
    }

    /// The pricing configuration for this country.
    pub const fn config(&self) -> &'static CountryConfig {
        match self {
            Country::Mx => &MX_CONFIG,
            Country::Us => &US_CONFIG,
            Country::Es => &ES_CONFIG,
            Country::Co => &CO_CONFIG,
            Country::Ar => &AR_CONFIG,
            Country::Cl => &CL_CONFIG,
            Country::Ca => &CA_CONFIG,
            Country::Br => &BR_CONFIG,
            Country::Pe => &PE_CONFIG,
            Country::Gt => &GT_CONFIG,
        }
    }

    /// ISO code.
    pub const fn code(&self) -> &'static str {
        self.config().code
    }

    /// All supported countries, in catalog order.
    pub const fn all() -> [Country; 10] {
        [
            Country::Mx,
            Country::Us,
            Country::Es,
            Country::Co,
            Country::Ar,
            Country::Cl,
            Country::Ca,
            Country::Br,
            Country::Pe,
            Country::Gt,
        ]
    }
}

/// Summary entry for the country selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySummary {
    pub code: String,
    pub name: String,
    pub currency: Currency,
}

/// Lists every supported country as `{code, name, currency}`.
pub fn all_countries() -> Vec<CountrySummary> {
    Country::all()
        .iter()
        .map(|country| {
            let config = country.config();
            CountrySummary {
                code: config.code.to_string(),
                name: config.name.to_string(),
                currency: config.currency,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Country::from_code("MX"), Some(Country::Mx));
        assert_eq!(Country::from_code("GT"), Some(Country::Gt));
        assert_eq!(Country::from_code("ZZ"), None);
    }

    #[test]
    fn test_resolve_by_currency_code() {
        // Legacy clients send "USD" where a country code belongs
        assert_eq!(Country::resolve("USD"), Country::Us);
        assert_eq!(Country::resolve("EUR"), Country::Es);
    }

    #[test]
    fn test_resolve_unknown_defaults_to_mx() {
        assert_eq!(Country::resolve("ZZ"), Country::Mx);
        assert_eq!(Country::resolve(""), Country::Mx);
    }

    #[test]
    fn test_every_country_has_consistent_config() {
        for country in Country::all() {
            let config = country.config();
            assert_eq!(config.code, country.code());
            assert!(config.tax_rate.bps() > 0);
            assert!(config.shipping_standard.cents() > 0);
            assert!(config.shipping_express > config.shipping_standard);
            assert!(config.free_shipping_threshold > config.shipping_express);
            // Every referenced currency has a usable rate and symbol
            assert!(config.currency.rate_micros() > 0);
            assert!(!config.currency.symbol().is_empty());
        }
    }

    #[test]
    fn test_all_countries_listing() {
        let countries = all_countries();
        assert_eq!(countries.len(), 10);
        assert_eq!(countries[0].code, "MX");
        assert_eq!(countries[0].currency, Currency::Mxn);
    }
}
