//! Unit conversion tests
//!
//! Covers the fixed unit set, the 3-decimal round-half-up scale, and the
//! round-trip property for every convertible unit pair.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::units::{convert, round_quantity, ConversionError, Unit, UnitFamily, QUANTITY_SCALE};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_identity_conversion_for_every_unit() {
        let q = dec("7.125");
        for unit in Unit::ALL {
            assert_eq!(convert(q, unit, unit).unwrap(), q);
        }
    }

    #[test]
    fn test_mass_conversions() {
        assert_eq!(convert(dec("2"), Unit::Kilograms, Unit::Grams).unwrap(), dec("2000"));
        assert_eq!(convert(dec("0.75"), Unit::Kilograms, Unit::Grams).unwrap(), dec("750.00"));
        assert_eq!(convert(dec("1250"), Unit::Grams, Unit::Kilograms).unwrap(), dec("1.250"));
    }

    #[test]
    fn test_volume_conversions() {
        assert_eq!(convert(dec("3.2"), Unit::Liters, Unit::Milliliters).unwrap(), dec("3200.0"));
        assert_eq!(convert(dec("500"), Unit::Milliliters, Unit::Liters).unwrap(), dec("0.500"));
    }

    #[test]
    fn test_rounding_is_half_up_at_three_decimals() {
        // 0.0025 kg is a midpoint at scale 3
        assert_eq!(convert(dec("2.5"), Unit::Grams, Unit::Kilograms).unwrap(), dec("0.003"));
        assert_eq!(convert(dec("2.4"), Unit::Grams, Unit::Kilograms).unwrap(), dec("0.002"));
        assert_eq!(round_quantity(dec("1.0005")), dec("1.001"));
        assert_eq!(round_quantity(dec("1.0004")), dec("1.000"));
    }

    #[test]
    fn test_cross_family_pairs_are_rejected() {
        let mass = [Unit::Grams, Unit::Kilograms];
        let volume = [Unit::Milliliters, Unit::Liters];
        for from in mass {
            for to in volume {
                assert_eq!(
                    convert(dec("1"), from, to),
                    Err(ConversionError::UnsupportedUnit { from, to })
                );
                assert!(convert(dec("1"), to, from).is_err());
            }
        }
    }

    #[test]
    fn test_count_only_converts_to_itself() {
        assert_eq!(convert(dec("12"), Unit::Count, Unit::Count).unwrap(), dec("12"));
        for unit in [Unit::Grams, Unit::Kilograms, Unit::Milliliters, Unit::Liters] {
            assert!(convert(dec("1"), Unit::Count, unit).is_err());
            assert!(convert(dec("1"), unit, Unit::Count).is_err());
        }
    }

    #[test]
    fn test_unit_families() {
        assert_eq!(Unit::Grams.family(), UnitFamily::Mass);
        assert_eq!(Unit::Kilograms.family(), UnitFamily::Mass);
        assert_eq!(Unit::Milliliters.family(), UnitFamily::Volume);
        assert_eq!(Unit::Liters.family(), UnitFamily::Volume);
        assert_eq!(Unit::Count.family(), UnitFamily::Count);
    }

    #[test]
    fn test_symbol_round_trip_and_unknown_symbol() {
        for unit in Unit::ALL {
            assert_eq!(Unit::from_str(unit.as_str()).unwrap(), unit);
        }
        assert!(matches!(
            Unit::from_str("lbs"),
            Err(ConversionError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_scale_constant_matches_rounding() {
        assert_eq!(QUANTITY_SCALE, 3);
        assert_eq!(round_quantity(dec("0.12345")).scale(), 3);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Quantities with the ledger scale of three decimal places
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=50_000_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    fn convertible_pair_strategy() -> impl Strategy<Value = (Unit, Unit)> {
        prop_oneof![
            Just((Unit::Grams, Unit::Kilograms)),
            Just((Unit::Kilograms, Unit::Grams)),
            Just((Unit::Milliliters, Unit::Liters)),
            Just((Unit::Liters, Unit::Milliliters)),
            Just((Unit::Count, Unit::Count)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// convert(convert(q, A, B), B, A) == q within the fixed scale
        #[test]
        fn prop_round_trip_within_fixed_scale(
            q in quantity_strategy(),
            (from, to) in convertible_pair_strategy(),
        ) {
            let there = convert(q, from, to).unwrap();
            let back = convert(there, to, from).unwrap();
            // Going into the larger unit rounds at most half a step of the
            // fixed scale; scaled back that is at most 0.5 in the source.
            let tolerance = dec("0.5");
            prop_assert!((back - q).abs() <= tolerance);
        }

        /// Conversion into the smaller unit of a family is lossless
        #[test]
        fn prop_downscale_round_trips_exactly(q in quantity_strategy()) {
            let grams = convert(q, Unit::Kilograms, Unit::Grams).unwrap();
            prop_assert_eq!(convert(grams, Unit::Grams, Unit::Kilograms).unwrap(), q);

            let milliliters = convert(q, Unit::Liters, Unit::Milliliters).unwrap();
            prop_assert_eq!(convert(milliliters, Unit::Milliliters, Unit::Liters).unwrap(), q);
        }

        /// Repeated conversion of the same input is reproducible
        #[test]
        fn prop_conversion_is_deterministic(
            q in quantity_strategy(),
            (from, to) in convertible_pair_strategy(),
        ) {
            prop_assert_eq!(convert(q, from, to).unwrap(), convert(q, from, to).unwrap());
        }

        /// Converted quantities always carry at most the ledger scale
        #[test]
        fn prop_result_scale_is_bounded(q in quantity_strategy()) {
            let kilograms = convert(q, Unit::Grams, Unit::Kilograms).unwrap();
            prop_assert!(kilograms.scale() <= QUANTITY_SCALE);
        }
    }
}
