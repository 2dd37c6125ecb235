//! Decimal price as stored in the products table.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A product price in the store currency (USD).
///
/// The products table stores a numeric column; PostgREST returns it as a JSON
/// number, which `rust_decimal` accepts as well as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    /// Formats as `$<amount>` with two decimal places, e.g. `$19.90`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "${rounded:.2}")
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::new(Decimal::new(250, 0)).to_string(), "$250.00");
        assert_eq!(Price::new(Decimal::new(1999, 2)).to_string(), "$19.99");
        assert_eq!(Price::new(Decimal::new(12_345, 3)).to_string(), "$12.35");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("89.5").unwrap();
        let from_string: Price = serde_json::from_str("\"89.50\"").unwrap();
        assert_eq!(from_number.amount(), from_string.amount());
    }
}
