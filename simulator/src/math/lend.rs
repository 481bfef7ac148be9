//! Lending: asset in, interest and cdp factors down, claims out.

use super::{
    check_product, invariant, minimum_interest_change, required_cdp_adjusted,
    time_weighted_collateral, ADJUST_SHIFT, FEE_BASE, YIELD_SHIFT,
};
use crate::error::{Result, SimError};
use crate::params::LendParams;
use crate::types::{Claims, RateState};
use crate::width::{self, narrow, widen, Width};
use alloy_primitives::U256;

/// Result of a lend before it is committed to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendOutcome {
    /// State after the lend
    pub state: RateState,
    /// Bond and insurance minted to the lender
    pub claims_out: Claims,
    /// Asset skimmed for the protocol owner
    pub protocol_fee: U256,
}

/// Lend fee base: `0x10000 + fee`
pub fn fee_base(fee: u16) -> U256 {
    U256::from(FEE_BASE + fee as u64)
}

/// Adjusted factor after a decrease: `(reserve << 16) - decrease * fee_base`
pub fn adjust(decrease: U256, reserve: U256, fee_base: U256) -> Result<U256> {
    let scaled = width::checked_shl(reserve, ADJUST_SHIFT, Width::U256)?;
    let charged = width::checked_mul(decrease, fee_base, Width::U256)?;
    if charged >= scaled {
        return Err(SimError::Invalid(
            "decrease exhausts the adjusted factor".to_string(),
        ));
    }
    Ok(scaled - charged)
}

/// Protocol share of the asset lent, rounded down
pub fn protocol_skim(asset_in: U256, protocol_fee: u16) -> Result<U256> {
    width::mul_div(
        asset_in,
        U256::from(protocol_fee),
        U256::from(FEE_BASE),
        Width::U112,
    )
}

/// Bond minted: `asset_in + (interest_decrease * duration) >> 32`
pub fn bond_out(duration: U256, asset_in: U256, interest_decrease: U256) -> Result<U256> {
    let accrued = width::checked_mul(interest_decrease, duration, Width::U256)? >> YIELD_SHIFT;
    width::checked_add(asset_in, accrued, Width::U128)
}

/// Insurance minted: `cdp_decrease` plus the time-weighted collateral value
/// of the asset lent, rounded down
pub fn insurance_out(
    duration: U256,
    state: &RateState,
    asset_in: U256,
    asset_after: U256,
    cdp_decrease: U256,
) -> Result<U256> {
    let covered = time_weighted_collateral(state, duration, asset_in, asset_after, false)?;
    width::checked_add(cdp_decrease, covered, Width::U128)
}

/// Asset factor after a lend, net of the protocol skim
fn asset_after(state: &RateState, asset_in: U256, protocol_fee: u16) -> Result<(U256, U256)> {
    let skim = protocol_skim(asset_in, protocol_fee)?;
    let asset = width::checked_add(state.asset, asset_in - skim, Width::U112)?;
    Ok((asset, skim))
}

/// Validate a lend against `state` and compute its outcome
pub fn apply(
    state: &RateState,
    params: &LendParams,
    duration: U256,
    fee: u16,
    protocol_fee: u16,
) -> Result<LendOutcome> {
    if params.interest_decrease > state.interest || params.cdp_decrease > state.cdp {
        return Err(SimError::Invalid(
            "decrease exceeds current factor".to_string(),
        ));
    }

    let fee_base = fee_base(fee);
    let minimum = minimum_interest_change(state, params.asset_in, fee_base)?;
    if params.interest_decrease < minimum {
        return Err(SimError::InterestTooLow {
            minimum: minimum.to_string(),
            actual: params.interest_decrease.to_string(),
        });
    }

    let (asset, skim) = asset_after(state, params.asset_in, protocol_fee)?;
    let interest_adjusted = adjust(params.interest_decrease, state.interest, fee_base)?;
    let cdp_adjusted = adjust(params.cdp_decrease, state.cdp, fee_base)?;
    check_product(asset, interest_adjusted, cdp_adjusted, invariant(state))?;

    let bond = bond_out(duration, params.asset_in, params.interest_decrease)?;
    let insurance = insurance_out(duration, state, params.asset_in, asset, params.cdp_decrease)?;

    Ok(LendOutcome {
        state: RateState {
            asset,
            interest: state.interest - params.interest_decrease,
            cdp: state.cdp - params.cdp_decrease,
        },
        claims_out: Claims::new(bond, insurance),
        protocol_fee: skim,
    })
}

/// Largest cdp decrease that keeps the fee-adjusted product at or above `k`
/// for the given asset and interest decrease.
///
/// Test drivers use this to derive the `cdp_decrease` they send to the
/// contract, so the simulator and the contract see identical calldata.
pub fn quote_cdp_decrease(
    state: &RateState,
    asset_in: U256,
    interest_decrease: U256,
    fee: u16,
    protocol_fee: u16,
) -> Result<U256> {
    let fee_base = fee_base(fee);
    let (asset, _) = asset_after(state, asset_in, protocol_fee)?;
    let interest_adjusted = adjust(interest_decrease, state.interest, fee_base)?;
    let required = required_cdp_adjusted(state, asset, interest_adjusted)?;

    let scaled_cdp = widen(width::checked_shl(state.cdp, ADJUST_SHIFT, Width::U256)?);
    if required > scaled_cdp {
        return Err(SimError::Invalid(
            "interest decrease too large for any cdp decrease".to_string(),
        ));
    }
    narrow((scaled_cdp - required) / widen(fee_base), Width::U112)
}
