//! Liquidity provision.

use super::{COLLATERAL_SHIFT, LIQUIDITY_SHIFT};
use crate::error::{Result, SimError};
use crate::params::MintParams;
use crate::types::RateState;
use crate::width::{self, Width};
use alloy_primitives::U256;

/// Result of a mint before it is committed to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintOutcome {
    /// State after the mint
    pub state: RateState,
    /// Liquidity credited to the recipient
    pub liquidity_out: U256,
    /// Collateral the minter deposits
    pub collateral_in: U256,
}

/// Liquidity minted for `asset_in`.
///
/// An empty pool mints `asset_in << 16`; otherwise liquidity is proportional to
/// the increase of the asset factor.
pub fn liquidity_out(state: &RateState, total_liquidity: U256, asset_in: U256) -> Result<U256> {
    let liquidity = if total_liquidity.is_zero() {
        width::checked_shl(asset_in, LIQUIDITY_SHIFT, Width::U256)?
    } else {
        width::mul_div(total_liquidity, asset_in, state.asset, Width::U256)?
    };
    if liquidity.is_zero() {
        return Err(SimError::Invalid("mint yields no liquidity".to_string()));
    }
    Ok(liquidity)
}

/// Collateral backing a cdp increase: `cdp_increase + ceil(cdp_increase * duration / 2^25)`
pub fn collateral_in(duration: U256, cdp_increase: U256) -> Result<U256> {
    let growth = width::mul_div_up(
        cdp_increase,
        duration,
        U256::from(1u64) << COLLATERAL_SHIFT,
        Width::U128,
    )?;
    width::checked_add(cdp_increase, growth, Width::U128)
}

/// Compute a mint against `state`
pub fn apply(
    state: &RateState,
    total_liquidity: U256,
    params: &MintParams,
    duration: U256,
) -> Result<MintOutcome> {
    let liquidity_out = liquidity_out(state, total_liquidity, params.asset_in)?;
    let collateral_in = collateral_in(duration, params.cdp_increase)?;

    let state = RateState {
        asset: width::checked_add(state.asset, params.asset_in, Width::U112)?,
        interest: width::checked_add(state.interest, params.interest_increase, Width::U112)?,
        cdp: width::checked_add(state.cdp, params.cdp_increase, Width::U112)?,
    };

    Ok(MintOutcome {
        state,
        liquidity_out,
        collateral_in,
    })
}
