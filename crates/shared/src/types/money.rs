//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` in the ledger's single currency;
//! tolerances are configured in minor units (cents) and converted here.

use rust_decimal::Decimal;

/// Converts a count of minor units into a ledger amount.
///
/// `from_minor_units(50, 2)` is `0.50`.
#[must_use]
pub fn from_minor_units(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

/// Decimal places of every stored amount column (`NUMERIC(19, 2)`).
pub const STORAGE_SCALE: u32 = 2;

/// Largest magnitude a stored amount column holds: 17 integer digits and
/// [`STORAGE_SCALE`] decimal places.
#[must_use]
pub fn max_amount() -> Decimal {
    Decimal::from_i128_with_scale(9_999_999_999_999_999_999, STORAGE_SCALE)
}

/// Returns true if `amount` fits a stored amount column by magnitude.
#[must_use]
pub fn fits_storage(amount: Decimal) -> bool {
    amount.abs() <= max_amount()
}

/// Returns true if `amount` has no more decimal places than `scale`.
#[must_use]
pub fn fits_scale(amount: Decimal, scale: u32) -> bool {
    amount.normalize().scale() <= scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(0, 2, dec!(0))]
    #[case(1, 2, dec!(0.01))]
    #[case(50, 2, dec!(0.50))]
    #[case(400_050, 2, dec!(4000.50))]
    #[case(7, 0, dec!(7))]
    fn test_from_minor_units(#[case] units: i64, #[case] scale: u32, #[case] expected: Decimal) {
        assert_eq!(from_minor_units(units, scale), expected);
    }

    #[rstest]
    #[case(dec!(4000), true)]
    #[case(dec!(4000.5), true)]
    #[case(dec!(4000.50), true)]
    #[case(dec!(4000.500), true)]
    #[case(dec!(4000.505), false)]
    fn test_fits_scale(#[case] amount: Decimal, #[case] expected: bool) {
        assert_eq!(fits_scale(amount, 2), expected);
    }

    #[rstest]
    #[case(dec!(0), true)]
    #[case(dec!(99999999999999999.99), true)]
    #[case(dec!(-99999999999999999.99), true)]
    #[case(dec!(100000000000000000), false)]
    #[case(dec!(50000000000000000000000000000), false)]
    fn test_fits_storage(#[case] amount: Decimal, #[case] expected: bool) {
        assert_eq!(fits_storage(amount), expected);
    }
}
