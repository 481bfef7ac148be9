//! Serializable projections of simulated state and field-by-field diffs.
//!
//! A test driver reads the live contract into the same shapes and calls
//! [`PoolSnapshot::diff`] or [`AccountView::diff`]; an empty result means the
//! simulator and the contract agree.

use crate::error::Result;
use crate::types::{Claims, DueStatus, RateState, Reserves};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Pool-wide state at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Maturity timestamp keying the pool
    pub maturity: u64,
    /// Tokens held
    pub reserves: Reserves,
    /// Invariant factors
    pub state: RateState,
    /// Outstanding liquidity
    pub total_liquidity: U256,
    /// Cumulative debt issued
    pub total_debt_created: U256,
    /// Outstanding claims
    pub total_claims: Claims,
    /// Asset held for the protocol owner
    pub protocol_fee_stored: U256,
}

/// One due as seen by its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueView {
    /// Debt still owed
    pub debt: U256,
    /// Collateral still locked
    pub collateral: U256,
    /// Block number at creation
    pub start_block: u64,
    /// Lifecycle state when the view was taken
    pub status: DueStatus,
}

/// An account's positions in one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    /// Account the view belongs to
    pub account: Address,
    /// Liquidity held
    pub liquidity: U256,
    /// Claims held
    pub claims: Claims,
    /// Dues in creation order
    pub dues: Vec<DueView>,
}

/// A field whose expected and observed values differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Dotted path of the field, e.g. `reserves.asset`
    pub field: String,
    /// Value computed by the simulator
    pub expected: String,
    /// Value read from the contract
    pub observed: String,
}

fn compare<T: PartialEq + Display>(out: &mut Vec<Mismatch>, field: &str, expected: &T, observed: &T) {
    if expected != observed {
        out.push(Mismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            observed: observed.to_string(),
        });
    }
}

impl PoolSnapshot {
    /// Fields that differ between `self` (expected) and `observed`
    pub fn diff(&self, observed: &PoolSnapshot) -> Vec<Mismatch> {
        let mut out = Vec::new();
        compare(&mut out, "maturity", &self.maturity, &observed.maturity);
        compare(&mut out, "reserves.asset", &self.reserves.asset, &observed.reserves.asset);
        compare(
            &mut out,
            "reserves.collateral",
            &self.reserves.collateral,
            &observed.reserves.collateral,
        );
        compare(&mut out, "state.asset", &self.state.asset, &observed.state.asset);
        compare(&mut out, "state.interest", &self.state.interest, &observed.state.interest);
        compare(&mut out, "state.cdp", &self.state.cdp, &observed.state.cdp);
        compare(
            &mut out,
            "total_liquidity",
            &self.total_liquidity,
            &observed.total_liquidity,
        );
        compare(
            &mut out,
            "total_debt_created",
            &self.total_debt_created,
            &observed.total_debt_created,
        );
        compare(
            &mut out,
            "total_claims.bond",
            &self.total_claims.bond,
            &observed.total_claims.bond,
        );
        compare(
            &mut out,
            "total_claims.insurance",
            &self.total_claims.insurance,
            &observed.total_claims.insurance,
        );
        compare(
            &mut out,
            "protocol_fee_stored",
            &self.protocol_fee_stored,
            &observed.protocol_fee_stored,
        );
        out
    }

    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

impl AccountView {
    /// Fields that differ between `self` (expected) and `observed`.
    ///
    /// Due status is derived, so only the stored due fields are compared.
    pub fn diff(&self, observed: &AccountView) -> Vec<Mismatch> {
        let mut out = Vec::new();
        compare(&mut out, "account", &self.account, &observed.account);
        compare(&mut out, "liquidity", &self.liquidity, &observed.liquidity);
        compare(&mut out, "claims.bond", &self.claims.bond, &observed.claims.bond);
        compare(
            &mut out,
            "claims.insurance",
            &self.claims.insurance,
            &observed.claims.insurance,
        );
        compare(&mut out, "dues.len", &self.dues.len(), &observed.dues.len());
        for (i, (expected, seen)) in self.dues.iter().zip(observed.dues.iter()).enumerate() {
            compare(&mut out, &format!("dues[{}].debt", i), &expected.debt, &seen.debt);
            compare(
                &mut out,
                &format!("dues[{}].collateral", i),
                &expected.collateral,
                &seen.collateral,
            );
            compare(
                &mut out,
                &format!("dues[{}].start_block", i),
                &expected.start_block,
                &seen.start_block,
            );
        }
        out
    }

    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
