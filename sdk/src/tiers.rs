//! Membership tier catalogue
//!
//! Tiers are a static, process-wide list. Level 0 is special: its listed
//! price is only a placeholder and the caller supplies a custom amount.

use crate::{
    amount::Decimal,
    error::{DinsyError, Result},
};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Level that takes a caller-supplied amount instead of a fixed price
pub const CUSTOM_LEVEL: u32 = 0;

/// A selectable subscription level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub level: u32,
    pub amount_usd: Decimal,
    pub label: &'static str,
}

impl Tier {
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.level == CUSTOM_LEVEL
    }
}

fn usd(whole: u64) -> Decimal {
    Decimal::from_u64(whole)
}

/// Default catalogue used by the registration form
pub static DEFAULT_TIERS: Lazy<TierCatalog> = Lazy::new(|| {
    TierCatalog::new(vec![
        Tier { level: 0, amount_usd: usd(1), label: "Custom" },
        Tier { level: 1, amount_usd: usd(100), label: "Basico" },
        Tier { level: 2, amount_usd: usd(500), label: "Junior" },
        Tier { level: 3, amount_usd: usd(2_000), label: "Corredor inmobiliario" },
        Tier { level: 4, amount_usd: usd(7_000), label: "Asesor inmobiliario" },
        Tier { level: 5, amount_usd: usd(25_000), label: "Administrador inmobiliario" },
        Tier { level: 6, amount_usd: usd(50_000), label: "Gerente inmobiliario" },
        Tier { level: 7, amount_usd: usd(100_000), label: "Director inmobiliario" },
    ])
});

/// Ordered set of tiers with unique levels
#[derive(Debug, Clone, Serialize)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Build a catalogue; later duplicates of a level are dropped
    #[must_use]
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by_key(|t| t.level);
        tiers.dedup_by_key(|t| t.level);
        Self { tiers }
    }

    #[must_use]
    pub fn find(&self, level: u32) -> Option<&Tier> {
        self.tiers
            .binary_search_by_key(&level, |t| t.level)
            .ok()
            .and_then(|idx| self.tiers.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Resolve the fiat total for a level.
    ///
    /// For [`CUSTOM_LEVEL`] the custom amount is required, must parse and must
    /// be greater than zero. For every other level the custom amount is ignored.
    pub fn resolve_total(&self, level: u32, custom_amount_usd: Option<&str>) -> Result<Decimal> {
        let tier = self.find(level).ok_or(DinsyError::UnknownLevel(level))?;
        if !tier.is_custom() {
            return Ok(tier.amount_usd.clone());
        }

        let raw = custom_amount_usd
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DinsyError::InvalidCustomAmount("missing".to_string()))?;
        let amount: Decimal = raw
            .parse()
            .map_err(|_| DinsyError::InvalidCustomAmount(format!("'{raw}' is not a number")))?;
        if amount.is_zero() {
            return Err(DinsyError::InvalidCustomAmount(format!(
                "'{raw}' must be greater than 0"
            )));
        }
        Ok(amount)
    }
}

impl<'a> IntoIterator for &'a TierCatalog {
    type Item = &'a Tier;
    type IntoIter = std::slice::Iter<'a, Tier>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue() {
        assert_eq!(DEFAULT_TIERS.len(), 8);
        assert_eq!(DEFAULT_TIERS.find(1).unwrap().amount_usd.to_string(), "100");
        assert_eq!(DEFAULT_TIERS.find(7).unwrap().amount_usd.to_string(), "100000");
        assert!(DEFAULT_TIERS.find(0).unwrap().is_custom());
        assert!(DEFAULT_TIERS.find(99).is_none());
    }

    #[test]
    fn test_levels_are_sorted_and_unique() {
        let catalog = TierCatalog::new(vec![
            Tier { level: 2, amount_usd: usd(500), label: "b" },
            Tier { level: 1, amount_usd: usd(100), label: "a" },
            Tier { level: 2, amount_usd: usd(999), label: "dup" },
        ]);
        let levels: Vec<u32> = catalog.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![1, 2]);
        assert_eq!(catalog.find(2).unwrap().label, "b");
    }

    #[test]
    fn test_resolve_fixed_level_ignores_custom_amount() {
        let total = DEFAULT_TIERS.resolve_total(2, Some("12345")).unwrap();
        assert_eq!(total.to_string(), "500");
    }

    #[test]
    fn test_resolve_custom_level() {
        let total = DEFAULT_TIERS.resolve_total(0, Some("42.5")).unwrap();
        assert_eq!(total.to_string(), "42.5");
    }

    #[test]
    fn test_resolve_custom_level_rejects_bad_amounts() {
        for bad in [None, Some(""), Some("   "), Some("0"), Some("0.00"), Some("abc"), Some("-5")] {
            assert!(
                matches!(
                    DEFAULT_TIERS.resolve_total(0, bad),
                    Err(DinsyError::InvalidCustomAmount(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_unknown_level() {
        assert!(matches!(
            DEFAULT_TIERS.resolve_total(99, None),
            Err(DinsyError::UnknownLevel(99))
        ));
    }
}
