//! Borrowing: asset out, interest and cdp factors up, a due recorded.

use super::{
    check_product, invariant, minimum_interest_change, required_cdp_adjusted,
    time_weighted_collateral, ADJUST_SHIFT, FEE_BASE, YIELD_SHIFT,
};
use crate::error::{Result, SimError};
use crate::params::BorrowParams;
use crate::types::RateState;
use crate::width::{self, div_up, narrow, widen, Width};
use alloy_primitives::U256;

/// Result of a borrow before it is committed to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowOutcome {
    /// State after the borrow
    pub state: RateState,
    /// Debt owed at maturity
    pub debt: U256,
    /// Collateral locked by the borrower
    pub collateral: U256,
    /// Asset skimmed for the protocol owner
    pub protocol_fee: U256,
}

/// Borrow fee base: `0x10000 - fee`
pub fn fee_base(fee: u16) -> U256 {
    U256::from(FEE_BASE - fee as u64)
}

/// Adjusted factor after an increase: `(reserve << 16) + increase * fee_base`
pub fn adjust(increase: U256, reserve: U256, fee_base: U256) -> Result<U256> {
    let scaled = width::checked_shl(reserve, ADJUST_SHIFT, Width::U256)?;
    let credited = width::checked_mul(increase, fee_base, Width::U256)?;
    width::checked_add(scaled, credited, Width::U256)
}

/// Protocol share of the asset borrowed, rounded up
pub fn protocol_skim(asset_out: U256, protocol_fee: u16) -> Result<U256> {
    width::mul_div_up(
        asset_out,
        U256::from(protocol_fee),
        U256::from(FEE_BASE),
        Width::U112,
    )
}

/// Debt owed: `asset_out + ceil(interest_increase * duration / 2^32)`
pub fn debt_out(duration: U256, asset_out: U256, interest_increase: U256) -> Result<U256> {
    let accrued = width::mul_div_up(
        interest_increase,
        duration,
        U256::from(1u64) << YIELD_SHIFT,
        Width::U256,
    )?;
    width::checked_add(asset_out, accrued, Width::U128)
}

/// Collateral locked: `cdp_increase` plus the time-weighted collateral value
/// of the asset borrowed, rounded up
pub fn collateral_in(
    duration: U256,
    state: &RateState,
    asset_out: U256,
    asset_after: U256,
    cdp_increase: U256,
) -> Result<U256> {
    let covered = time_weighted_collateral(state, duration, asset_out, asset_after, true)?;
    width::checked_add(cdp_increase, covered, Width::U128)
}

/// Asset factor after a borrow, net of the protocol skim
fn asset_after(state: &RateState, asset_out: U256, protocol_fee: u16) -> Result<(U256, U256)> {
    let skim = protocol_skim(asset_out, protocol_fee)?;
    let removed = width::checked_add(asset_out, skim, Width::U256)?;
    if removed >= state.asset {
        return Err(SimError::Invalid(
            "borrow drains the asset factor".to_string(),
        ));
    }
    Ok((state.asset - removed, skim))
}

/// Validate a borrow against `state` and compute its outcome
pub fn apply(
    state: &RateState,
    params: &BorrowParams,
    duration: U256,
    fee: u16,
    protocol_fee: u16,
) -> Result<BorrowOutcome> {
    let fee_base = fee_base(fee);
    let minimum = minimum_interest_change(state, params.asset_out, fee_base)?;
    if params.interest_increase < minimum {
        return Err(SimError::InterestTooLow {
            minimum: minimum.to_string(),
            actual: params.interest_increase.to_string(),
        });
    }

    let (asset, skim) = asset_after(state, params.asset_out, protocol_fee)?;
    let interest_adjusted = adjust(params.interest_increase, state.interest, fee_base)?;
    let cdp_adjusted = adjust(params.cdp_increase, state.cdp, fee_base)?;
    check_product(asset, interest_adjusted, cdp_adjusted, invariant(state))?;

    let interest = width::checked_add(state.interest, params.interest_increase, Width::U112)?;
    let cdp = width::checked_add(state.cdp, params.cdp_increase, Width::U112)?;

    let debt = debt_out(duration, params.asset_out, params.interest_increase)?;
    let collateral = collateral_in(duration, state, params.asset_out, asset, params.cdp_increase)?;

    Ok(BorrowOutcome {
        state: RateState {
            asset,
            interest,
            cdp,
        },
        debt,
        collateral,
        protocol_fee: skim,
    })
}

/// Smallest cdp increase that keeps the fee-adjusted product at or above `k`
/// for the given asset and interest increase. Zero when the interest
/// increase alone restores the product.
pub fn quote_cdp_increase(
    state: &RateState,
    asset_out: U256,
    interest_increase: U256,
    fee: u16,
    protocol_fee: u16,
) -> Result<U256> {
    let fee_base = fee_base(fee);
    let (asset, _) = asset_after(state, asset_out, protocol_fee)?;
    let interest_adjusted = adjust(interest_increase, state.interest, fee_base)?;
    let required = required_cdp_adjusted(state, asset, interest_adjusted)?;

    let scaled_cdp = widen(width::checked_shl(state.cdp, ADJUST_SHIFT, Width::U256)?);
    if required <= scaled_cdp {
        return Ok(U256::ZERO);
    }
    narrow(div_up(required - scaled_cdp, widen(fee_base)), Width::U112)
}
