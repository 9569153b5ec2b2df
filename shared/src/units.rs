//! Unit conversion for stock quantities
//!
//! Every product stores its balance in a single unit of record. Operators
//! may enter a movement in any unit of the same family; the entered
//! quantity is converted through a linear factor to the product's unit and
//! rounded to the fixed ledger scale.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places every ledger quantity is kept at.
pub const QUANTITY_SCALE: u32 = 3;

/// Measurement unit for product stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "l")]
    Liters,
    /// Opaque piece count for non-measurable products.
    #[serde(rename = "count")]
    Count,
}

/// Unit families; conversion is only defined within one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
}

/// Errors raised by [`convert`] and [`Unit::from_str`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("cannot convert {from} into {to}")]
    UnsupportedUnit { from: Unit, to: Unit },

    #[error("unknown unit symbol: {0}")]
    UnknownUnit(String),
}

impl Unit {
    pub const ALL: [Unit; 5] = [
        Unit::Grams,
        Unit::Kilograms,
        Unit::Milliliters,
        Unit::Liters,
        Unit::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Kilograms => "kg",
            Unit::Milliliters => "ml",
            Unit::Liters => "l",
            Unit::Count => "count",
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            Unit::Grams | Unit::Kilograms => UnitFamily::Mass,
            Unit::Milliliters | Unit::Liters => UnitFamily::Volume,
            Unit::Count => UnitFamily::Count,
        }
    }

    /// Linear factor into the family base unit (g, ml, or count).
    fn base_factor(&self) -> Decimal {
        match self {
            Unit::Grams | Unit::Milliliters | Unit::Count => Decimal::ONE,
            Unit::Kilograms | Unit::Liters => Decimal::from(1000),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g" => Ok(Unit::Grams),
            "kg" => Ok(Unit::Kilograms),
            "ml" => Ok(Unit::Milliliters),
            "l" => Ok(Unit::Liters),
            "count" => Ok(Unit::Count),
            other => Err(ConversionError::UnknownUnit(other.to_string())),
        }
    }
}

/// Round a quantity to the fixed ledger scale, half-up.
pub fn round_quantity(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert `quantity` from one unit into another of the same family.
///
/// Identity conversion carries no rounding loss. Everything else goes
/// through the linear base factor and is rounded to [`QUANTITY_SCALE`] so
/// repeated conversions are reproducible.
pub fn convert(quantity: Decimal, from: Unit, to: Unit) -> Result<Decimal, ConversionError> {
    if from == to {
        return Ok(quantity);
    }
    if from.family() != to.family() {
        return Err(ConversionError::UnsupportedUnit { from, to });
    }
    Ok(round_quantity(quantity * from.base_factor() / to.base_factor()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn identity_conversion_is_exact() {
        let q = dec("12.3456");
        assert_eq!(convert(q, Unit::Kilograms, Unit::Kilograms).unwrap(), q);
    }

    #[test]
    fn converts_up_and_down_the_family() {
        assert_eq!(convert(dec("1.5"), Unit::Kilograms, Unit::Grams).unwrap(), dec("1500"));
        assert_eq!(convert(dec("1500"), Unit::Grams, Unit::Kilograms).unwrap(), dec("1.500"));
        assert_eq!(convert(dec("250"), Unit::Milliliters, Unit::Liters).unwrap(), dec("0.250"));
    }

    #[test]
    fn rounds_half_up_at_ledger_scale() {
        // 2.5 g = 0.0025 kg, midpoint rounds away from zero
        assert_eq!(convert(dec("2.5"), Unit::Grams, Unit::Kilograms).unwrap(), dec("0.003"));
        assert_eq!(convert(dec("2.4"), Unit::Grams, Unit::Kilograms).unwrap(), dec("0.002"));
    }

    #[test]
    fn rejects_cross_family_conversion() {
        assert_eq!(
            convert(dec("1"), Unit::Kilograms, Unit::Liters),
            Err(ConversionError::UnsupportedUnit {
                from: Unit::Kilograms,
                to: Unit::Liters,
            })
        );
        assert!(convert(dec("1"), Unit::Count, Unit::Grams).is_err());
    }

    #[test]
    fn parses_known_symbols_only() {
        for unit in Unit::ALL {
            assert_eq!(Unit::from_str(unit.as_str()).unwrap(), unit);
        }
        assert_eq!(
            Unit::from_str("oz"),
            Err(ConversionError::UnknownUnit("oz".to_string()))
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn quantity_strategy() -> impl Strategy<Value = Decimal> {
            // 0.001 to 100000.000, three decimal places
            (1i64..=100_000_000i64).prop_map(|n| Decimal::new(n, 3))
        }

        fn family_pair_strategy() -> impl Strategy<Value = (Unit, Unit)> {
            prop_oneof![
                Just((Unit::Grams, Unit::Kilograms)),
                Just((Unit::Kilograms, Unit::Grams)),
                Just((Unit::Milliliters, Unit::Liters)),
                Just((Unit::Liters, Unit::Milliliters)),
            ]
        }

        proptest! {
            /// convert(convert(q, A, B), B, A) == q within the fixed scale.
            #[test]
            fn round_trip_within_scale(
                q in quantity_strategy(),
                (from, to) in family_pair_strategy(),
            ) {
                let there = convert(q, from, to).unwrap();
                let back = convert(there, to, from).unwrap();
                // The only loss is the half-step rounding of the
                // intermediate value, scaled back into the source unit.
                let quantum = Decimal::new(5, 4) * Decimal::from(1000);
                let tolerance = if from.base_factor() < to.base_factor() {
                    quantum
                } else {
                    Decimal::ZERO
                };
                prop_assert!((back - q).abs() <= tolerance, "{q} {from}->{to}->{back}");
            }

            /// Converting into the smaller unit of a family never rounds.
            #[test]
            fn downscale_is_exact(q in quantity_strategy()) {
                let grams = convert(q, Unit::Kilograms, Unit::Grams).unwrap();
                prop_assert_eq!(convert(grams, Unit::Grams, Unit::Kilograms).unwrap(), q);
            }
        }
    }
}
