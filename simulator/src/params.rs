//! Typed parameter records for the six pair operations.
//!
//! Each record mirrors the argument list of the matching contract call and is
//! validated before dispatch: amounts must fit the calldata width the contract
//! declares, and amounts that must be positive are checked here.

use crate::error::{Result, SimError};
use crate::types::Claims;
use crate::width::Width;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Parameters for adding liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintParams {
    /// Asset deposited (uint112)
    pub asset_in: U256,
    /// Increase of the interest factor (uint112)
    pub interest_increase: U256,
    /// Increase of the cdp factor (uint112)
    pub cdp_increase: U256,
}

impl MintParams {
    /// Create mint parameters from plain integers
    pub fn new(asset_in: u128, interest_increase: u128, cdp_increase: u128) -> Self {
        Self {
            asset_in: U256::from(asset_in),
            interest_increase: U256::from(interest_increase),
            cdp_increase: U256::from(cdp_increase),
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        for value in [self.asset_in, self.interest_increase, self.cdp_increase] {
            if value.is_zero() {
                return Err(SimError::Zero);
            }
            Width::U112.check(value)?;
        }
        Ok(())
    }
}

/// Parameters for lending asset into a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendParams {
    /// Asset deposited (uint112)
    pub asset_in: U256,
    /// Decrease of the interest factor (uint112)
    pub interest_decrease: U256,
    /// Decrease of the cdp factor (uint112)
    pub cdp_decrease: U256,
}

impl LendParams {
    /// Create lend parameters from plain integers
    pub fn new(asset_in: u128, interest_decrease: u128, cdp_decrease: u128) -> Self {
        Self {
            asset_in: U256::from(asset_in),
            interest_decrease: U256::from(interest_decrease),
            cdp_decrease: U256::from(cdp_decrease),
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.asset_in.is_zero() {
            return Err(SimError::Zero);
        }
        for value in [self.asset_in, self.interest_decrease, self.cdp_decrease] {
            Width::U112.check(value)?;
        }
        Ok(())
    }
}

/// Parameters for borrowing asset from a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowParams {
    /// Asset received by the borrower (uint112)
    pub asset_out: U256,
    /// Increase of the interest factor (uint112)
    pub interest_increase: U256,
    /// Increase of the cdp factor (uint112)
    pub cdp_increase: U256,
    /// Account the due is recorded for; the sender when `None`
    pub owner: Option<Address>,
}

impl BorrowParams {
    /// Create borrow parameters from plain integers
    pub fn new(asset_out: u128, interest_increase: u128, cdp_increase: u128) -> Self {
        Self {
            asset_out: U256::from(asset_out),
            interest_increase: U256::from(interest_increase),
            cdp_increase: U256::from(cdp_increase),
            owner: None,
        }
    }

    /// Record the due for `owner` instead of the sender
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.asset_out.is_zero() {
            return Err(SimError::Zero);
        }
        for value in [self.asset_out, self.interest_increase, self.cdp_increase] {
            Width::U112.check(value)?;
        }
        if self.owner == Some(Address::ZERO) {
            return Err(SimError::ZeroAddress);
        }
        Ok(())
    }
}

/// Parameters for removing liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnParams {
    /// Liquidity burned (uint256)
    pub liquidity_in: U256,
}

impl BurnParams {
    /// Create burn parameters
    pub fn new(liquidity_in: U256) -> Self {
        Self { liquidity_in }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.liquidity_in.is_zero() {
            return Err(SimError::Zero);
        }
        Ok(())
    }
}

/// Parameters for redeeming claims after maturity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawParams {
    /// Claims redeemed (uint128 each)
    pub claims_in: Claims,
}

impl WithdrawParams {
    /// Create withdraw parameters from plain integers
    pub fn new(bond: u128, insurance: u128) -> Self {
        Self {
            claims_in: Claims::new(U256::from(bond), U256::from(insurance)),
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.claims_in.is_zero() {
            return Err(SimError::Zero);
        }
        Width::U128.check(self.claims_in.bond)?;
        Width::U128.check(self.claims_in.insurance)?;
        Ok(())
    }
}

/// Parameters for repaying dues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayParams {
    /// Owner of the dues being paid
    pub owner: Address,
    /// Positions in the owner's due list
    pub ids: Vec<usize>,
    /// Debt repaid per due (uint112)
    pub debts_in: Vec<U256>,
    /// Collateral released per due (uint112)
    pub collaterals_out: Vec<U256>,
}

impl PayParams {
    /// Create pay parameters for a single due
    pub fn single(owner: Address, id: usize, debt_in: U256, collateral_out: U256) -> Self {
        Self {
            owner,
            ids: vec![id],
            debts_in: vec![debt_in],
            collaterals_out: vec![collateral_out],
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(SimError::Invalid("no dues given".to_string()));
        }
        if self.ids.len() != self.debts_in.len() || self.ids.len() != self.collaterals_out.len() {
            return Err(SimError::Invalid("mismatched pay lengths".to_string()));
        }
        for value in self.debts_in.iter().chain(self.collaterals_out.iter()) {
            Width::U112.check(*value)?;
        }
        Ok(())
    }
}
