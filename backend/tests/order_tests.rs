//! Order pricing and minimum-order tests
//!
//! Covers the money invariants of order intake:
//! - subtotal is the sum of snapshotted price times quantity
//! - total is always subtotal plus the business delivery fee
//! - orders below the business minimum are rejected, equality passes

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn subtotal(lines: &[(Decimal, i32)]) -> Decimal {
    lines
        .iter()
        .fold(Decimal::ZERO, |acc, (price, qty)| {
            acc + *price * Decimal::from(*qty)
        })
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_subtotal_sums_lines() {
        let lines = [(dec("10.00"), 2), (dec("3.50"), 3)];
        assert_eq!(subtotal(&lines), dec("30.50"));
    }

    #[test]
    fn test_total_adds_delivery_fee() {
        let sub = dec("30.50");
        let fee = dec("5.00");
        assert_eq!(sub + fee, dec("35.50"));
    }

    #[test]
    fn test_minimum_order_rejects_below() {
        // One S/10 dish against a S/20 minimum is rejected
        let minimum = dec("20.00");
        let sub = subtotal(&[(dec("10.00"), 1)]);
        assert!(sub < minimum);
    }

    #[test]
    fn test_minimum_order_passes_at_quantity_two() {
        // Two of the same dish reach the minimum exactly
        let minimum = dec("20.00");
        let sub = subtotal(&[(dec("10.00"), 2)]);
        assert!(sub >= minimum);
    }

    #[test]
    fn test_minimum_order_equality_passes() {
        // The check is subtotal < minimum, so equality is accepted
        let minimum = dec("25.00");
        let sub = dec("25.00");
        assert!(!(sub < minimum));
    }

    #[test]
    fn test_delivery_fee_does_not_count_toward_minimum() {
        // Minimum applies to the subtotal, before the fee
        let minimum = dec("20.00");
        let sub = dec("18.00");
        let fee = dec("5.00");
        assert!(sub < minimum);
        assert!(sub + fee > minimum); // fee would sneak it past, but must not
    }

    #[test]
    fn test_price_snapshot_is_stable() {
        // The line keeps the price captured at order time
        let snapshot = dec("12.50");
        let later_catalog_price = dec("15.00");
        let line_total = snapshot * Decimal::from(2);
        assert_eq!(line_total, dec("25.00"));
        assert_ne!(line_total, later_catalog_price * Decimal::from(2));
    }

    #[test]
    fn test_cents_precision_survives_summation() {
        let lines = [(dec("0.01"), 3), (dec("9.99"), 1)];
        assert_eq!(subtotal(&lines), dec("10.02"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Total always equals subtotal plus fee, and never undercuts the subtotal
    #[test]
    fn prop_total_is_subtotal_plus_fee(
        cents in 1i64..1_000_000,
        fee_cents in 0i64..10_000,
    ) {
        let sub = Decimal::new(cents, 2);
        let fee = Decimal::new(fee_cents, 2);
        let total = sub + fee;
        prop_assert_eq!(total - fee, sub);
        prop_assert!(total >= sub);
    }

    /// Subtotal is additive over line items
    #[test]
    fn prop_subtotal_additive(
        prices in prop::collection::vec((1i64..100_000, 1i32..20), 1..10),
    ) {
        let lines: Vec<(Decimal, i32)> = prices
            .iter()
            .map(|(cents, qty)| (Decimal::new(*cents, 2), *qty))
            .collect();

        let whole = subtotal(&lines);
        let split: Decimal = lines.iter().map(|l| subtotal(&[*l])).sum();
        prop_assert_eq!(whole, split);
    }

    /// Scaling every quantity scales the subtotal
    #[test]
    fn prop_subtotal_scales_with_quantity(
        cents in 1i64..100_000,
        qty in 1i32..50,
    ) {
        let price = Decimal::new(cents, 2);
        let one = subtotal(&[(price, 1)]);
        let many = subtotal(&[(price, qty)]);
        prop_assert_eq!(many, one * Decimal::from(qty));
    }

    /// The minimum-order check is a strict less-than
    #[test]
    fn prop_minimum_check_boundary(
        sub_cents in 0i64..100_000,
        min_cents in 0i64..100_000,
    ) {
        let sub = Decimal::new(sub_cents, 2);
        let minimum = Decimal::new(min_cents, 2);
        let rejected = sub < minimum;
        if sub_cents >= min_cents {
            prop_assert!(!rejected);
        } else {
            prop_assert!(rejected);
        }
    }
}
