//! Stock ledger tests
//!
//! Covers balance conservation, non-negativity of committed balances, the
//! before/after snapshots on ledger entries, and the compare-and-swap
//! discipline that serializes concurrent movements on one product.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::units::{convert, round_quantity, Unit};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Mirror of the processor's balance math: validate, apply, snapshot.
/// Returns (previous_stock, new_stock) for a committed movement.
fn apply_movement(
    current: Decimal,
    is_stock_in: bool,
    quantity: Decimal,
) -> Result<(Decimal, Decimal), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    let previous = current;
    let new = if is_stock_in {
        previous + quantity
    } else {
        previous - quantity
    };
    if new < Decimal::ZERO {
        return Err("Insufficient stock");
    }
    Ok((previous, new))
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Milk created empty, stocked in 50 l, stocked out 20 l.
    #[test]
    fn test_milk_stock_in_then_out() {
        let opening = Decimal::ZERO;

        let (previous, after_in) = apply_movement(opening, true, dec("50")).unwrap();
        assert_eq!(previous, dec("0"));
        assert_eq!(after_in, dec("50"));

        let (previous, after_out) = apply_movement(after_in, false, dec("20")).unwrap();
        assert_eq!(previous, dec("50"));
        assert_eq!(after_out, dec("30"));
    }

    /// Overdrawing is rejected and the balance is untouched.
    #[test]
    fn test_overdraw_is_rejected_without_mutation() {
        let balance = dec("30");
        let result = apply_movement(balance, false, dec("40"));
        assert_eq!(result, Err("Insufficient stock"));
        // the failed attempt produced no new balance
        assert_eq!(balance, dec("30"));
    }

    #[test]
    fn test_draining_to_exactly_zero_is_allowed() {
        let (_, new) = apply_movement(dec("12.5"), false, dec("12.5")).unwrap();
        assert_eq!(new, Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_quantities_are_rejected() {
        assert!(apply_movement(dec("10"), true, Decimal::ZERO).is_err());
        assert!(apply_movement(dec("10"), true, dec("-3")).is_err());
        assert!(apply_movement(dec("10"), false, dec("-3")).is_err());
    }

    /// Entered quantities are normalized into the product's unit of record
    /// before the balance math runs.
    #[test]
    fn test_movement_in_entered_unit_is_normalized() {
        // product stored in grams, operator enters 2 kg
        let quantity = round_quantity(convert(dec("2"), Unit::Kilograms, Unit::Grams).unwrap());
        let (_, new) = apply_movement(dec("500"), true, quantity).unwrap();
        assert_eq!(new, dec("2500"));
    }

    #[test]
    fn test_snapshot_chain_links_consecutive_entries() {
        let mut balance = dec("100");
        let movements = [(false, dec("10")), (true, dec("5")), (false, dec("95"))];

        let mut previous_new = balance;
        for (is_in, qty) in movements {
            let (previous, new) = apply_movement(balance, is_in, qty).unwrap();
            // each entry's previous_stock equals the prior entry's new_stock
            assert_eq!(previous, previous_new);
            previous_new = new;
            balance = new;
        }
        assert_eq!(balance, Decimal::ZERO);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    fn movement_strategy() -> impl Strategy<Value = (bool, Decimal)> {
        (any::<bool>(), quantity_strategy())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Conservation: the balance always equals opening stock plus the
        /// committed stock-ins minus the committed stock-outs.
        #[test]
        fn prop_conservation_over_any_sequence(
            opening in quantity_strategy(),
            movements in prop::collection::vec(movement_strategy(), 0..40),
        ) {
            let mut balance = opening;
            let mut total_in = Decimal::ZERO;
            let mut total_out = Decimal::ZERO;

            for (is_in, qty) in movements {
                if let Ok((_, new)) = apply_movement(balance, is_in, qty) {
                    if is_in {
                        total_in += qty;
                    } else {
                        total_out += qty;
                    }
                    balance = new;
                }
            }

            prop_assert_eq!(balance, opening + total_in - total_out);
        }

        /// Non-negativity: no committed movement ever leaves a negative
        /// balance, and rejected movements leave the balance unchanged.
        #[test]
        fn prop_balance_never_negative(
            opening in quantity_strategy(),
            movements in prop::collection::vec(movement_strategy(), 0..40),
        ) {
            let mut balance = opening;
            for (is_in, qty) in movements {
                match apply_movement(balance, is_in, qty) {
                    Ok((previous, new)) => {
                        prop_assert_eq!(previous, balance);
                        prop_assert!(new >= Decimal::ZERO);
                        balance = new;
                    }
                    Err(_) => {
                        // no partial write
                    }
                }
                prop_assert!(balance >= Decimal::ZERO);
            }
        }

        /// Snapshots on each entry reproduce the movement arithmetic.
        #[test]
        fn prop_snapshots_match_movement(
            opening in quantity_strategy(),
            qty in quantity_strategy(),
        ) {
            let (previous, new) = apply_movement(opening, true, qty).unwrap();
            prop_assert_eq!(new, previous + qty);

            if opening >= qty {
                let (previous, new) = apply_movement(opening, false, qty).unwrap();
                prop_assert_eq!(new, previous - qty);
            }
        }
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    /// Compare-and-swap cell emulating the conditional
    /// `UPDATE products SET current_stock = $new WHERE current_stock = $prev`.
    struct BalanceCell(Mutex<Decimal>);

    impl BalanceCell {
        fn new(initial: Decimal) -> Self {
            Self(Mutex::new(initial))
        }

        fn read(&self) -> Decimal {
            *self.0.lock().unwrap()
        }

        fn compare_and_swap(&self, expected: Decimal, new: Decimal) -> bool {
            let mut balance = self.0.lock().unwrap();
            if *balance == expected {
                *balance = new;
                true
            } else {
                false
            }
        }
    }

    /// N concurrent stock-outs of q against N*q initial stock leave
    /// exactly zero; none may be silently lost.
    #[test]
    fn test_concurrent_stock_outs_lose_nothing() {
        let workers = 8;
        let quantity = dec("1.5");
        let cell = Arc::new(BalanceCell::new(quantity * Decimal::from(workers)));

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || loop {
                    let previous = cell.read();
                    let new = previous - quantity;
                    assert!(new >= Decimal::ZERO, "a stock-out overdrew the balance");
                    if cell.compare_and_swap(previous, new) {
                        break;
                    }
                    // lost the race; re-read and retry like the processor
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cell.read(), Decimal::ZERO);
    }

    /// A writer that computed from a stale snapshot never commits.
    #[test]
    fn test_stale_read_never_commits() {
        let cell = BalanceCell::new(dec("10"));
        let snapshot = cell.read();

        // first writer commits its decrement
        assert!(cell.compare_and_swap(snapshot, snapshot - dec("3")));
        // second writer raced on the same snapshot and must be refused
        assert!(!cell.compare_and_swap(snapshot, snapshot - dec("6")));

        assert_eq!(cell.read(), dec("7"));
    }

    /// Mixed concurrent stock-ins and stock-outs conserve the total.
    #[test]
    fn test_concurrent_mixed_movements_conserve_stock() {
        let cell = Arc::new(BalanceCell::new(dec("100")));
        let in_qty = dec("2");
        let out_qty = dec("3");
        let pairs = 6;

        let mut handles = Vec::new();
        for _ in 0..pairs {
            for (is_in, qty) in [(true, in_qty), (false, out_qty)] {
                let cell = Arc::clone(&cell);
                handles.push(thread::spawn(move || loop {
                    let previous = cell.read();
                    let new = if is_in { previous + qty } else { previous - qty };
                    assert!(new >= Decimal::ZERO);
                    if cell.compare_and_swap(previous, new) {
                        break;
                    }
                }));
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 100 + 6*2 - 6*3 = 94
        assert_eq!(cell.read(), dec("94"));
    }
}
