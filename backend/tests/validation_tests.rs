//! Input validation and pagination tests

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{validation, Pagination, PaginationMeta};

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_peru_mobile_numbers_accepted() {
        assert!(validation::validate_phone("+51987654321").is_ok());
        assert!(validation::validate_phone("+51912345678").is_ok());
    }

    #[test]
    fn test_phone_rejects_formatting_noise() {
        assert!(validation::validate_phone("+51 987 654 321").is_err());
        assert!(validation::validate_phone("+51-987654321").is_err());
        assert!(validation::validate_phone("(+51)987654321").is_err());
    }

    #[test]
    fn test_price_cents_boundary() {
        assert!(validation::validate_price(Decimal::new(1, 2)).is_ok()); // 0.01
        assert!(validation::validate_price(Decimal::new(999, 3)).is_err()); // 0.999
    }

    #[test]
    fn test_pagination_limit_is_capped() {
        let p = Pagination { page: 1, limit: 1000 }.clamped();
        assert_eq!(p.limit, 50);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Phones built as '+', nonzero digit, then 9-14 digits always validate
    #[test]
    fn prop_wellformed_phones_validate(
        first in 1u32..10,
        rest in prop::collection::vec(0u32..10, 9..=14),
    ) {
        let mut phone = format!("+{first}");
        for d in rest {
            phone.push_str(&d.to_string());
        }
        prop_assert!(validation::validate_phone(&phone).is_ok());
    }

    /// Anything not starting with '+' is rejected
    #[test]
    fn prop_missing_plus_rejected(s in "[0-9]{10,15}") {
        prop_assert!(validation::validate_phone(&s).is_err());
    }

    /// Phones outside the 10-15 digit window are rejected
    #[test]
    fn prop_wrong_length_rejected(len in prop::sample::select(vec![1usize, 5, 9, 16, 20])) {
        let phone = format!("+9{}", "1".repeat(len.saturating_sub(1)));
        prop_assert!(validation::validate_phone(&phone).is_err());
    }

    /// Positive cent-precision prices always validate
    #[test]
    fn prop_cent_prices_validate(cents in 1i64..10_000_000) {
        prop_assert!(validation::validate_price(Decimal::new(cents, 2)).is_ok());
    }

    /// Pagination never reports a page count inconsistent with the total
    #[test]
    fn prop_pagination_meta_consistent(
        page in 1u32..100,
        limit in 1u32..50,
        total in 0u64..10_000,
    ) {
        let meta = PaginationMeta::new(Pagination { page, limit }, total);
        let capacity = u64::from(meta.total_pages) * u64::from(limit);
        prop_assert!(capacity >= total);
        if meta.total_pages > 0 {
            let previous_capacity = u64::from(meta.total_pages - 1) * u64::from(limit);
            prop_assert!(previous_capacity < total);
        }
        prop_assert_eq!(meta.has_prev, page > 1);
        prop_assert_eq!(meta.has_next, u64::from(page) * u64::from(limit) < total);
    }

    /// Offsets advance by exactly one page
    #[test]
    fn prop_offset_advances_by_limit(page in 1u32..1000, limit in 1u32..50) {
        let a = Pagination { page, limit }.offset();
        let b = Pagination { page: page + 1, limit }.offset();
        prop_assert_eq!(b - a, i64::from(limit));
    }
}
