//! Monetary calculation helpers
//!
//! All money math runs on `Decimal` and converts to `f64` only at the
//! storage boundary, rounded to 2 decimal places. Totals are computed
//! exactly once, when the order is placed, and never recomputed from
//! stored floats afterwards.

use rust_decimal::prelude::*;
use shared::{CommandError, CommandResult, OrderItemInput};

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum unit price accepted for a line item
const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum quantity accepted for a line item
const MAX_QUANTITY: i32 = 9_999;

/// Validate one line item before it becomes part of an order.
///
/// Rejected items never reach the store; the whole place-order command
/// fails on the first bad line.
pub fn validate_item(item: &OrderItemInput) -> CommandResult<()> {
    if !item.price.is_finite() {
        return Err(CommandError::InvalidItem(format!(
            "{}: price must be a finite number",
            item.name
        )));
    }
    if item.price <= 0.0 {
        return Err(CommandError::InvalidItem(format!(
            "{}: price must be positive, got {}",
            item.name, item.price
        )));
    }
    if item.price > MAX_PRICE {
        return Err(CommandError::InvalidItem(format!(
            "{}: price exceeds maximum ({MAX_PRICE}), got {}",
            item.name, item.price
        )));
    }
    if item.quantity < 1 {
        return Err(CommandError::InvalidItem(format!(
            "{}: quantity must be at least 1, got {}",
            item.name, item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(CommandError::InvalidItem(format!(
            "{}: quantity exceeds maximum ({MAX_QUANTITY}), got {}",
            item.name, item.quantity
        )));
    }
    Ok(())
}

/// f64 -> Decimal. Inputs pass [`validate_item`] first; a non-finite
/// value reaching this point degrades to zero instead of poisoning the
/// whole total.
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value, "Non-finite price in monetary calculation, treating as zero");
        Decimal::ZERO
    })
}

/// Decimal -> f64 at the storage boundary, rounded to 2 decimal places.
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .expect("2-dp decimal always fits f64")
}

/// price × quantity for a single line, 2-dp rounded.
pub fn line_total(price: f64, quantity: i32) -> f64 {
    to_f64(to_decimal(price) * Decimal::from(quantity))
}

/// Grand total over all line items.
pub fn order_total(items: &[OrderItemInput]) -> f64 {
    let total: Decimal = items
        .iter()
        .map(|item| to_decimal(item.price) * Decimal::from(item.quantity))
        .sum();
    to_f64(total)
}
