//! Decimal money helpers.
//!
//! Catalog prices arrive from the remote service as JSON numbers and are held
//! as [`Decimal`] so that cart aggregates never accumulate floating point
//! error. All amounts are in the catalog's single currency (USD).

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to whole cents, midpoints away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display (e.g., `$19.99`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_cents(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${rounded:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_pads_cents() {
        assert_eq!(format_amount(Decimal::new(10, 0)), "$10.00");
        assert_eq!(format_amount(Decimal::new(1999, 2)), "$19.99");
    }

    #[test]
    fn test_format_amount_rounds_half_up() {
        assert_eq!(format_amount(Decimal::new(10_005, 3)), "$10.01");
        assert_eq!(format_amount(Decimal::new(10_004, 3)), "$10.00");
    }

    #[test]
    fn test_format_amount_negative() {
        assert_eq!(format_amount(Decimal::new(-250, 2)), "-$2.50");
    }
}
