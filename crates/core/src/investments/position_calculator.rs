//! Weighted-average cost basis arithmetic.
//!
//! Every function is pure: it validates its inputs first and returns a new
//! asset, leaving the argument untouched when an error is returned. Values are
//! kept at full precision; rounding happens only at presentation boundaries.

use rust_decimal::Decimal;

use super::investments_model::InvestmentAsset;
use crate::errors::{PositionError, ValidationError};
use crate::utils::decimal_utils::{
    checked_add, checked_div, checked_mul, checked_sub, within_tolerance,
};
use crate::Result;

fn require_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::out_of_range(field, "greater than 0", value).into());
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::out_of_range(field, "0 or greater", value).into());
    }
    Ok(())
}

/// Adds `quantity` units bought at `unit_price` plus `fees` to the position.
///
/// Fees are capitalized into the cost basis.
pub fn apply_buy(
    asset: &InvestmentAsset,
    quantity: Decimal,
    unit_price: Decimal,
    fees: Decimal,
) -> Result<InvestmentAsset> {
    require_positive("quantity", quantity)?;
    require_positive("unitPrice", unit_price)?;
    require_non_negative("fees", fees)?;

    let cost = checked_add("fees", checked_mul("totalAmount", quantity, unit_price)?, fees)?;
    let mut next = asset.clone();
    next.total_invested = checked_add("totalInvested", asset.total_invested, cost)?;
    next.quantity = checked_add("quantity", asset.quantity, quantity)?;
    if next.quantity.is_zero() {
        return Err(PositionError::DivisionByZero {
            asset_id: asset.id.clone(),
        }
        .into());
    }
    next.average_purchase_price =
        checked_div("averagePurchasePrice", next.total_invested, next.quantity)?;
    Ok(next)
}

/// Removes `quantity` units from the position. The average price never changes.
pub fn apply_sell(asset: &InvestmentAsset, quantity: Decimal) -> Result<InvestmentAsset> {
    require_positive("quantity", quantity)?;
    if quantity > asset.quantity {
        return Err(PositionError::InsufficientPosition {
            asset_id: asset.id.clone(),
            requested: quantity,
            held: asset.quantity,
        }
        .into());
    }

    let mut next = asset.clone();
    next.quantity = asset.quantity - quantity;
    next.total_invested = if next.quantity.is_zero() {
        Decimal::ZERO
    } else {
        checked_mul("totalInvested", asset.average_purchase_price, next.quantity)?
    };
    Ok(next)
}

/// Dividends, interest and yields are cash income; the position is unchanged.
pub fn apply_yield(asset: &InvestmentAsset, amount: Decimal) -> Result<InvestmentAsset> {
    require_non_negative("amount", amount)?;
    Ok(asset.clone())
}

/// Sets the market price. Derived fields are stale until [`recompute_derived`].
pub fn mark_price(asset: &InvestmentAsset, new_price: Decimal) -> Result<InvestmentAsset> {
    require_non_negative("currentPrice", new_price)?;
    let mut next = asset.clone();
    next.current_price = new_price;
    Ok(next)
}

/// Recomputes current value and unrealized P&L from quantity, price and cost.
pub fn recompute_derived(asset: &InvestmentAsset) -> Result<InvestmentAsset> {
    let mut next = asset.clone();
    next.current_value = checked_mul("currentValue", next.quantity, next.current_price)?;
    next.profit_loss = checked_sub("profitLoss", next.current_value, next.total_invested)?;
    next.profit_loss_percentage = if next.total_invested.is_zero() {
        Decimal::ZERO
    } else {
        let ratio = checked_div("profitLossPercentage", next.profit_loss, next.total_invested)?;
        checked_mul("profitLossPercentage", ratio, Decimal::ONE_HUNDRED)?
    };
    Ok(next)
}

pub fn realized_profit_loss(
    average_price: Decimal,
    sell_price: Decimal,
    quantity_sold: Decimal,
    fees: Decimal,
) -> Result<Decimal> {
    let spread = checked_sub("realizedProfitLoss", sell_price, average_price)?;
    let gross = checked_mul("realizedProfitLoss", spread, quantity_sold)?;
    checked_sub("realizedProfitLoss", gross, fees)
}

/// `total_invested == quantity * average_purchase_price` within the money
/// tolerance, and an empty position carries no cost.
pub fn is_cost_basis_consistent(asset: &InvestmentAsset) -> bool {
    if asset.quantity.is_zero() {
        return asset.total_invested.is_zero();
    }
    asset
        .quantity
        .checked_mul(asset.average_purchase_price)
        .is_some_and(|cost| within_tolerance(asset.total_invested, cost))
}
