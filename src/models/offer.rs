use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::Rejection;

/// Base price per bundle size (1 to 4 levels).
pub const BUNDLE_PRICES: [(i64, i64); 4] = [(1, 1200), (2, 2300), (3, 3300), (4, 4200)];

pub fn bundle_price(levels: i64) -> Option<i64> {
    BUNDLE_PRICES
        .iter()
        .find(|(size, _)| *size == levels)
        .map(|(_, price)| *price)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountType {
    #[default]
    Amount,
    Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub lead_id: String,
    pub bundle_levels: Option<i64>,
    pub base_price: i64,
    pub discount_value: i64,
    pub discount_type: DiscountType,
    pub final_price: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Operator input for an offer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetOffer {
    pub bundle_levels: Option<i64>,
    pub discount_value: i64,
    pub discount_type: DiscountType,
    /// Explicit price; takes priority over `base - discount` when positive.
    pub final_price: Option<i64>,
}

/// Prices resolved from a [`SetOffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedOffer {
    pub bundle_levels: Option<i64>,
    pub base_price: i64,
    pub discount_value: i64,
    pub discount_type: DiscountType,
    pub final_price: i64,
}

impl SetOffer {
    pub fn price(&self) -> Result<PricedOffer, Rejection> {
        let explicit = match self.final_price {
            Some(p) if p < 0 => return Err(Rejection::InvalidAmount),
            Some(p) if p > 0 => Some(p),
            _ => None,
        };

        let base_price = match self.bundle_levels {
            Some(levels) => bundle_price(levels).ok_or(Rejection::InvalidBundle)?,
            None if explicit.is_some() => 0,
            None => return Err(Rejection::OfferRequired),
        };

        if self.discount_value < 0 {
            return Err(Rejection::InvalidDiscount);
        }
        let discount = match self.discount_type {
            DiscountType::Amount => self.discount_value,
            DiscountType::Percent => {
                if self.discount_value > 100 {
                    return Err(Rejection::InvalidDiscount);
                }
                base_price * self.discount_value / 100
            }
        };

        let final_price = match explicit {
            Some(p) => p,
            None => {
                let computed = base_price - discount;
                if computed <= 0 {
                    return Err(Rejection::InvalidDiscount);
                }
                computed
            }
        };

        Ok(PricedOffer {
            bundle_levels: self.bundle_levels,
            base_price,
            discount_value: self.discount_value,
            discount_type: self.discount_type,
            final_price,
        })
    }
}
