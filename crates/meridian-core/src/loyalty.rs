//! # Loyalty Module
//!
//! Loyalty number format rules and tier calculation.
//!
//! ## Loyalty Number Format
//! Three uppercase letters followed by three digits, e.g. `ABC123`.
//! The number is the customer's business identifier: unique, assigned
//! at enrollment, and immutable afterwards. Lookups normalize case so
//! a cashier can type `abc123` at the register.
//!
//! ## Tiers
//! ```text
//! ┌────────────┬──────────────────────────────┐
//! │ Tier       │ Lifetime spend               │
//! ├────────────┼──────────────────────────────┤
//! │ Bronze     │ below $500                   │
//! │ Silver     │ $500 and above               │
//! │ Gold       │ $1,500 and above             │
//! │ Platinum   │ $5,000 and above             │
//! └────────────┴──────────────────────────────┘
//! ```
//! Tier is recalculated on every accrual unless an admin pinned it
//! with the manual override flag.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::LoyaltyTier;

/// Lifetime spend threshold for Silver, in cents.
pub const SILVER_THRESHOLD_CENTS: i64 = 50_000;
/// Lifetime spend threshold for Gold, in cents.
pub const GOLD_THRESHOLD_CENTS: i64 = 150_000;
/// Lifetime spend threshold for Platinum, in cents.
pub const PLATINUM_THRESHOLD_CENTS: i64 = 500_000;

/// Uppercases and trims a loyalty number as typed at the register.
pub fn normalize_loyalty_number(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Validates the `AAA999` loyalty number format.
///
/// ## Example
/// ```rust
/// use meridian_core::loyalty::validate_loyalty_number;
///
/// assert!(validate_loyalty_number("ABC123").is_ok());
/// assert!(validate_loyalty_number("AB123").is_err());
/// assert!(validate_loyalty_number("123ABC").is_err());
/// ```
pub fn validate_loyalty_number(number: &str) -> Result<(), ValidationError> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "loyalty_number".to_string(),
        });
    }

    let chars: Vec<char> = number.chars().collect();
    let well_formed = chars.len() == 6
        && chars[..3].iter().all(|c| c.is_ascii_uppercase())
        && chars[3..].iter().all(|c| c.is_ascii_digit());

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "loyalty_number".to_string(),
            reason: "must be 3 uppercase letters followed by 3 digits".to_string(),
        });
    }

    Ok(())
}

/// Calculates the tier a lifetime spend earns.
pub fn tier_for_spend(lifetime_spend: Money) -> LoyaltyTier {
    let cents = lifetime_spend.cents();
    if cents >= PLATINUM_THRESHOLD_CENTS {
        LoyaltyTier::Platinum
    } else if cents >= GOLD_THRESHOLD_CENTS {
        LoyaltyTier::Gold
    } else if cents >= SILVER_THRESHOLD_CENTS {
        LoyaltyTier::Silver
    } else {
        LoyaltyTier::Bronze
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_loyalty_number("  abc123 "), "ABC123");
        assert_eq!(normalize_loyalty_number("XYZ999"), "XYZ999");
    }

    #[test]
    fn test_validate_loyalty_number() {
        assert!(validate_loyalty_number("ABC123").is_ok());
        assert!(validate_loyalty_number("ZZZ000").is_ok());

        assert!(validate_loyalty_number("").is_err());
        assert!(validate_loyalty_number("abc123").is_err()); // lowercase
        assert!(validate_loyalty_number("AB1234").is_err()); // 2 letters
        assert!(validate_loyalty_number("ABCD12").is_err()); // 4 letters
        assert!(validate_loyalty_number("ABC12").is_err()); // short
        assert!(validate_loyalty_number("ABC1234").is_err()); // long
        assert!(validate_loyalty_number("123ABC").is_err()); // reversed
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for_spend(Money::from_cents(0)), LoyaltyTier::Bronze);
        assert_eq!(
            tier_for_spend(Money::from_cents(49_999)),
            LoyaltyTier::Bronze
        );
        assert_eq!(
            tier_for_spend(Money::from_cents(50_000)),
            LoyaltyTier::Silver
        );
        assert_eq!(
            tier_for_spend(Money::from_cents(149_999)),
            LoyaltyTier::Silver
        );
        assert_eq!(tier_for_spend(Money::from_cents(150_000)), LoyaltyTier::Gold);
        assert_eq!(
            tier_for_spend(Money::from_cents(500_000)),
            LoyaltyTier::Platinum
        );
    }
}
