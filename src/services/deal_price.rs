//! Deal price state
//!
//! Keeps a deal's current/original price pair consistent with each new
//! observation and guards the status lifecycle. Everything here is pure;
//! the callers in `price_history` and `deals` own the database writes.

use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::entities::deals;
use crate::entities::sea_orm_active_enums::DealStatus;
use crate::error::{CoreError, CoreResult};

/// Fractional digits stored for prices
pub const PRICE_SCALE: u32 = 8;

/// Exclusive upper bound for prices (10^12), the range of a `numeric(20, 8)` column
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Checks that `value` is a storable price: non-negative, below [`MAX_PRICE`]
/// and with at most [`PRICE_SCALE`] fractional digits.
pub fn validate_price(field: &str, value: Decimal) -> CoreResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "{} must be >= 0, got {}",
            field, value
        )));
    }
    if value >= MAX_PRICE {
        return Err(CoreError::validation(format!(
            "{} must be below {}, got {}",
            field, MAX_PRICE, value
        )));
    }
    if value.normalize().scale() > PRICE_SCALE {
        return Err(CoreError::validation(format!(
            "{} supports at most {} decimal places, got {}",
            field, PRICE_SCALE, value
        )));
    }
    Ok(value)
}

/// What to do when an update would leave `original_price <= price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginalPricePolicy {
    /// Raise the original price to `price + epsilon`
    Repair,
    /// Fail the update when an existing original price would be violated
    Reject,
}

impl FromStr for OriginalPricePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "repair" => Ok(OriginalPricePolicy::Repair),
            "reject" => Ok(OriginalPricePolicy::Reject),
            other => Err(format!("unknown original price policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PriceUpdateRules {
    pub policy: OriginalPricePolicy,
    pub epsilon: Decimal,
}

/// Applies a new observed price to a deal.
///
/// An unset original price is seeded with the deal's prior current price.
/// If the pair then breaks `original_price > price`, `rules.policy` decides:
/// `Repair` lifts the original to `price + epsilon`; `Reject` fails when the
/// original was already set and otherwise leaves it unset.
pub fn apply_price_update(
    mut deal: deals::Model,
    new_price: Decimal,
    rules: PriceUpdateRules,
    at: DateTimeWithTimeZone,
) -> CoreResult<deals::Model> {
    validate_price("price", new_price)?;

    let (original, seeded) = match deal.original_price {
        Some(original) => (original, false),
        None => (deal.price, true),
    };

    let original_price = if original > new_price {
        Some(original)
    } else {
        match rules.policy {
            OriginalPricePolicy::Repair => {
                let repaired = new_price
                    .checked_add(rules.epsilon)
                    .filter(|repaired| *repaired < MAX_PRICE)
                    .ok_or_else(|| {
                        CoreError::validation(format!(
                            "price {} leaves no room for an original price below {}",
                            new_price, MAX_PRICE
                        ))
                    })?;
                if !seeded {
                    warn!(
                        deal_id = %deal.id,
                        original = %original,
                        new_price = %new_price,
                        repaired = %repaired,
                        "Original price no longer above current price, repairing"
                    );
                }
                Some(repaired)
            }
            OriginalPricePolicy::Reject if seeded => None,
            OriginalPricePolicy::Reject => {
                return Err(CoreError::validation(format!(
                    "price {} is not below original price {}",
                    new_price, original
                )));
            }
        }
    };

    deal.price = new_price;
    deal.original_price = original_price;
    deal.updated_at = at;
    Ok(deal)
}

/// Checks the pair invariant for a freshly created deal.
pub fn validate_price_pair(price: Decimal, original_price: Option<Decimal>) -> CoreResult<()> {
    validate_price("price", price)?;
    if let Some(original) = original_price {
        validate_price("original price", original)?;
        if original <= price {
            return Err(CoreError::validation(format!(
                "original price {} must be greater than price {}",
                original, price
            )));
        }
    }
    Ok(())
}

impl DealStatus {
    /// Active deals may expire or be removed, expired deals may be removed.
    /// Nothing goes back to active.
    pub fn can_transition_to(&self, to: DealStatus) -> bool {
        use DealStatus::*;
        matches!(
            (self, to),
            (Active, Active)
                | (Expired, Expired)
                | (Removed, Removed)
                | (Active, Expired)
                | (Active, Removed)
                | (Expired, Removed)
        )
    }
}

pub fn validate_transition(from: DealStatus, to: DealStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::timestamps;
    use rust_decimal_macros::dec;
    use sea_orm::prelude::Uuid;

    fn deal(price: Decimal, original_price: Option<Decimal>) -> deals::Model {
        let now = timestamps::now();
        deals::Model {
            id: Uuid::new_v4(),
            title: "Headphones".to_string(),
            url: "https://shop.example/headphones".to_string(),
            price,
            original_price,
            currency: "USD".to_string(),
            source: "amazon".to_string(),
            status: DealStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn rules(policy: OriginalPricePolicy) -> PriceUpdateRules {
        PriceUpdateRules {
            policy,
            epsilon: dec!(0.01),
        }
    }

    #[test]
    fn test_seeds_original_from_prior_price() {
        let updated = apply_price_update(
            deal(dec!(99.99), None),
            dec!(89.99),
            rules(OriginalPricePolicy::Repair),
            timestamps::now(),
        )
        .unwrap();
        assert_eq!(updated.price, dec!(89.99));
        assert_eq!(updated.original_price, Some(dec!(99.99)));
    }

    #[test]
    fn test_keeps_existing_original() {
        let updated = apply_price_update(
            deal(dec!(80), Some(dec!(120))),
            dec!(95),
            rules(OriginalPricePolicy::Repair),
            timestamps::now(),
        )
        .unwrap();
        assert_eq!(updated.original_price, Some(dec!(120)));
    }

    #[test]
    fn test_repair_lifts_original_above_price() {
        let updated = apply_price_update(
            deal(dec!(80), Some(dec!(100))),
            dec!(110),
            rules(OriginalPricePolicy::Repair),
            timestamps::now(),
        )
        .unwrap();
        assert_eq!(updated.price, dec!(110));
        assert_eq!(updated.original_price, Some(dec!(110.01)));
    }

    #[test]
    fn test_repair_on_unchanged_seed() {
        let updated = apply_price_update(
            deal(dec!(50), None),
            dec!(50),
            rules(OriginalPricePolicy::Repair),
            timestamps::now(),
        )
        .unwrap();
        assert_eq!(updated.original_price, Some(dec!(50.01)));
    }

    #[test]
    fn test_reject_fails_on_existing_original() {
        let result = apply_price_update(
            deal(dec!(80), Some(dec!(100))),
            dec!(100),
            rules(OriginalPricePolicy::Reject),
            timestamps::now(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_reject_drops_invalid_seed() {
        let updated = apply_price_update(
            deal(dec!(50), None),
            dec!(60),
            rules(OriginalPricePolicy::Reject),
            timestamps::now(),
        )
        .unwrap();
        assert_eq!(updated.price, dec!(60));
        assert_eq!(updated.original_price, None);
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = apply_price_update(
            deal(dec!(50), None),
            dec!(-1),
            rules(OriginalPricePolicy::Repair),
            timestamps::now(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_invariant_holds_over_sequence() {
        let prices = [dec!(100), dec!(90), dec!(120), dec!(120), dec!(0), dec!(75.5), dec!(300)];
        let mut current = deal(dec!(100), None);
        for price in prices {
            current = apply_price_update(
                current,
                price,
                rules(OriginalPricePolicy::Repair),
                timestamps::now(),
            )
            .unwrap();
            if let Some(original) = current.original_price {
                assert!(original > current.price, "{} <= {}", original, current.price);
            }
        }
    }

    #[test]
    fn test_validate_price_pair() {
        assert!(validate_price_pair(dec!(10), None).is_ok());
        assert!(validate_price_pair(dec!(10), Some(dec!(12))).is_ok());
        assert!(validate_price_pair(dec!(10), Some(dec!(10))).is_err());
        assert!(validate_price_pair(dec!(-0.01), None).is_err());
    }

    #[test]
    fn test_max_price_constant() {
        assert_eq!(MAX_PRICE, dec!(1000000000000));
    }

    #[test]
    fn test_validate_price_bounds() {
        assert_eq!(validate_price("price", dec!(0)).unwrap(), dec!(0));
        assert!(validate_price("price", dec!(999999999999.99999999)).is_ok());
        assert!(validate_price("price", dec!(1.10000000000)).is_ok());
        assert!(validate_price("price", MAX_PRICE).is_err());
        assert!(validate_price("price", Decimal::MAX).is_err());
        assert!(validate_price("price", dec!(1.123456789123)).is_err());
        assert!(validate_price_pair(dec!(10), Some(Decimal::MAX)).is_err());
        assert!(validate_price_pair(dec!(10), Some(dec!(12.000000001))).is_err());
    }

    #[test]
    fn test_oversized_or_overscaled_update_rejected() {
        for price in [Decimal::MAX, dec!(1.123456789123)] {
            let result = apply_price_update(
                deal(dec!(50), None),
                price,
                rules(OriginalPricePolicy::Repair),
                timestamps::now(),
            );
            assert!(matches!(result, Err(CoreError::Validation(_))), "{}", price);
        }
    }

    #[test]
    fn test_repair_cannot_push_original_out_of_range() {
        let result = apply_price_update(
            deal(dec!(50), None),
            dec!(999999999999.995),
            rules(OriginalPricePolicy::Repair),
            timestamps::now(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_status_transitions() {
        use DealStatus::*;
        assert!(validate_transition(Active, Expired).is_ok());
        assert!(validate_transition(Active, Removed).is_ok());
        assert!(validate_transition(Expired, Removed).is_ok());
        assert!(validate_transition(Active, Active).is_ok());

        for (from, to) in [(Expired, Active), (Removed, Active), (Removed, Expired)] {
            assert!(matches!(
                validate_transition(from, to),
                Err(CoreError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Repair".parse::<OriginalPricePolicy>(), Ok(OriginalPricePolicy::Repair));
        assert_eq!("reject".parse::<OriginalPricePolicy>(), Ok(OriginalPricePolicy::Reject));
        assert!("ignore".parse::<OriginalPricePolicy>().is_err());
    }
}
