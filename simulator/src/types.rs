//! Common value types shared by the pool, the math modules and the snapshots.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block context supplied by the chain collaborator for every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block timestamp in seconds
    pub timestamp: u64,
    /// Block number
    pub number: u64,
}

impl Block {
    /// Create a block context
    pub fn new(timestamp: u64, number: u64) -> Self {
        Self { timestamp, number }
    }
}

/// Tokens held by a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    /// Asset tokens held (uint128)
    pub asset: U256,
    /// Collateral tokens held (uint128)
    pub collateral: U256,
}

/// The three factors of the constant-product invariant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    /// Asset factor (uint112)
    pub asset: U256,
    /// Interest factor (uint112)
    pub interest: U256,
    /// Collateralization factor (uint112)
    pub cdp: U256,
}

/// Bond and insurance claim amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Asset payable at par after maturity (uint128)
    pub bond: U256,
    /// Share of defaulted collateral after maturity (uint128)
    pub insurance: U256,
}

impl Claims {
    /// Create a claims pair
    pub fn new(bond: U256, insurance: U256) -> Self {
        Self { bond, insurance }
    }

    /// Whether both legs are zero
    pub fn is_zero(&self) -> bool {
        self.bond.is_zero() && self.insurance.is_zero()
    }
}

/// Token movements produced by one operation, seen from the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    /// Asset received by the pool
    pub asset_in: U256,
    /// Collateral received by the pool
    pub collateral_in: U256,
    /// Asset sent out by the pool
    pub asset_out: U256,
    /// Collateral sent out by the pool
    pub collateral_out: U256,
}

/// Index of a due in a pool's due arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DueId(pub usize);

/// A borrower's collateralized debt obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    /// Account that owns the due
    pub owner: Address,
    /// Debt still owed (uint128)
    pub debt: U256,
    /// Collateral still locked (uint128)
    pub collateral: U256,
    /// Block number at which the due was created
    pub start_block: u64,
    /// Debt at creation, kept for status reporting
    pub debt_created: U256,
}

impl Due {
    /// Lifecycle state of the due at `now` for a pool maturing at `maturity`
    pub fn status(&self, maturity: u64, now: u64) -> DueStatus {
        if self.debt.is_zero() {
            DueStatus::Settled
        } else if now >= maturity {
            DueStatus::Defaulted
        } else if self.debt < self.debt_created {
            DueStatus::PartiallyPaid
        } else {
            DueStatus::Active
        }
    }
}

/// Lifecycle state of a [`Due`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DueStatus {
    /// Created, nothing repaid
    Active,
    /// Some debt repaid
    PartiallyPaid,
    /// All debt repaid
    Settled,
    /// Maturity passed with debt outstanding
    Defaulted,
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueStatus::Active => write!(f, "ACTIVE"),
            DueStatus::PartiallyPaid => write!(f, "PARTIALLY_PAID"),
            DueStatus::Settled => write!(f, "SETTLED"),
            DueStatus::Defaulted => write!(f, "DEFAULTED"),
        }
    }
}
