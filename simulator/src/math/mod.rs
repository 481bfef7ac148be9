//! Pure pricing math for the pair operations.
//!
//! The pool prices lending and borrowing on a three-factor constant product
//! `k = (asset * interest * cdp) << 32`. Lend and borrow may move the factors
//! only in ways that keep the fee-adjusted product at or above `k`; mint grows
//! all three factors.
//!
//! Nothing in this module touches pool storage. Each operation module returns
//! an outcome record that the pool commits after its own balance checks.

pub mod borrow;
pub mod lend;
pub mod mint;

use crate::error::{Result, SimError};
use crate::types::RateState;
use crate::width::{self, div_up, widen, Width};
use alloy_primitives::{U256, U512};

/// Denominator of fee rates (`fee / 0x10000`)
pub const FEE_BASE: u64 = 0x10000;

/// Scale applied to interest and cdp factors before fee adjustment
pub const ADJUST_SHIFT: usize = 16;

/// Fixed-point scale of the invariant product
pub const INVARIANT_SHIFT: usize = 32;

/// Scale of the minimum interest change formula
pub const MINIMUM_SHIFT: usize = 12;

/// Seconds-weighted interest is scaled down by this many bits
pub const YIELD_SHIFT: usize = 32;

/// Seconds-weighted cdp growth on mint is scaled down by this many bits
pub const COLLATERAL_SHIFT: usize = 25;

/// Liquidity minted per unit of asset on the first mint, as a shift
pub const LIQUIDITY_SHIFT: usize = 16;

/// The invariant product `(asset * interest * cdp) << 32`.
///
/// The factors are uint112, so the product fits comfortably in 512 bits.
pub fn invariant(state: &RateState) -> U512 {
    (widen(state.asset) * widen(state.interest) * widen(state.cdp)) << INVARIANT_SHIFT
}

/// Seconds left until maturity; fails once the pool has matured
pub fn duration(maturity: u64, now: u64) -> Result<U256> {
    if now >= maturity {
        return Err(SimError::Expired);
    }
    Ok(U256::from(maturity - now))
}

/// Fail unless `asset * interest_adjusted * cdp_adjusted >= k`
pub fn check_product(
    asset: U256,
    interest_adjusted: U256,
    cdp_adjusted: U256,
    k: U512,
) -> Result<()> {
    let product = widen(asset) * widen(interest_adjusted) * widen(cdp_adjusted);
    if product < k {
        return Err(SimError::InvariantViolation(format!(
            "adjusted product {} below invariant {}",
            product, k
        )));
    }
    Ok(())
}

/// Fee floor shared by lend and borrow:
/// `((amount * interest) << 12) / (asset * fee_base)`
pub fn minimum_interest_change(state: &RateState, amount: U256, fee_base: U256) -> Result<U256> {
    let scaled_interest = width::checked_shl(state.interest, MINIMUM_SHIFT, Width::U256)?;
    let denominator = width::checked_mul(state.asset, fee_base, Width::U256)?;
    width::mul_div(amount, scaled_interest, denominator, Width::U256)
}

/// Smallest adjusted cdp factor that satisfies the product check, rounded up
pub(crate) fn required_cdp_adjusted(
    state: &RateState,
    asset: U256,
    interest_adjusted: U256,
) -> Result<U512> {
    let denominator = widen(asset) * widen(interest_adjusted);
    if denominator.is_zero() {
        return Err(SimError::Invalid("empty pool".to_string()));
    }
    Ok(div_up(invariant(state), denominator))
}

/// Collateral equivalent of moving `amount` asset across the curve, weighted
/// by time to maturity:
/// `amount * cdp * (duration * interest + (asset << 32)) / (asset_after * (asset << 32))`
pub(crate) fn time_weighted_collateral(
    state: &RateState,
    duration: U256,
    amount: U256,
    asset_after: U256,
    round_up: bool,
) -> Result<U256> {
    let scaled_asset = width::checked_shl(state.asset, YIELD_SHIFT, Width::U256)?;
    let numerator = width::checked_mul(amount, state.cdp, Width::U256)?;
    let weight = width::checked_add(
        width::checked_mul(duration, state.interest, Width::U256)?,
        scaled_asset,
        Width::U256,
    )?;
    let denominator = width::checked_mul(asset_after, scaled_asset, Width::U256)?;
    if round_up {
        width::mul_div_up(numerator, weight, denominator, Width::U128)
    } else {
        width::mul_div(numerator, weight, denominator, Width::U128)
    }
}
