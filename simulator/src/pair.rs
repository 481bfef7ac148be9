//! The pair simulator: configuration, pool registry and dispatch.
//!
//! [`PairSim`] mirrors one deployed pair contract. A test driver calls the
//! same operation on the contract and on the simulator, with the same
//! parameters and the block the transaction was mined in, then compares the
//! [`Receipt`] snapshot against what the contract reports.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::params::{BorrowParams, BurnParams, LendParams, MintParams, PayParams, WithdrawParams};
use crate::pool::Pool;
use crate::snapshot::{AccountView, PoolSnapshot};
use crate::types::{Block, Claims, Due, Tokens};
use crate::width::{self, Width};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Outcome of a successful operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Maturity of the pool the operation ran against
    pub maturity: u64,
    /// Tokens moved by the operation
    pub tokens: Tokens,
    /// Pool state after the operation
    pub pool: PoolSnapshot,
}

/// Source of token balances observed on chain
pub trait TokenBalances {
    /// Balance of `token` held by `account`
    fn balance_of(&self, token: Address, account: Address) -> Result<U256>;
}

/// Reference model of a pair contract
#[derive(Debug, Clone)]
pub struct PairSim {
    config: SimConfig,
    pools: BTreeMap<u64, Pool>,
}

impl PairSim {
    /// Create a simulator from a validated configuration
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Simulating pair {} (asset {}, collateral {}, fee {}, protocol fee {})",
            config.contract, config.asset, config.collateral, config.fee, config.protocol_fee
        );
        Ok(Self {
            config,
            pools: BTreeMap::new(),
        })
    }

    /// Create a simulator from the pair contract's constructor arguments
    pub fn from_parts(
        asset: Address,
        collateral: Address,
        fee: u16,
        protocol_fee: u16,
        contract: Address,
        factory: Address,
        owner: Address,
    ) -> Result<Self> {
        Self::new(
            SimConfig::new(asset, collateral)
                .with_fee(fee)
                .with_protocol_fee(protocol_fee)
                .with_contract(contract)
                .with_factory(factory)
                .with_owner(owner),
        )
    }

    /// Pair configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Pool at `maturity`, if one has been minted
    pub fn get_pool(&self, maturity: u64) -> Option<&Pool> {
        self.pools.get(&maturity)
    }

    /// Maturities with a pool, ascending
    pub fn maturities(&self) -> Vec<u64> {
        self.pools.keys().copied().collect()
    }

    /// Liquidity held by `account` at `maturity`
    pub fn get_liquidity(&self, maturity: u64, account: &Address) -> Result<U256> {
        Ok(self.pool(maturity)?.liquidity_of(account))
    }

    /// Claims held by `account` at `maturity`
    pub fn get_claims(&self, maturity: u64, account: &Address) -> Result<Claims> {
        Ok(self.pool(maturity)?.claims_of(account))
    }

    /// Dues owned by `account` at `maturity`
    pub fn get_dues(&self, maturity: u64, account: &Address) -> Result<Vec<Due>> {
        Ok(self
            .pool(maturity)?
            .dues_of(account)
            .into_iter()
            .cloned()
            .collect())
    }

    /// All positions of `account` at `maturity`, with due status at `now`
    pub fn get_account(&self, maturity: u64, account: &Address, now: u64) -> Result<AccountView> {
        Ok(self.pool(maturity)?.account_view(account, now))
    }

    fn pool(&self, maturity: u64) -> Result<&Pool> {
        self.pools
            .get(&maturity)
            .ok_or(SimError::PoolNotFound(maturity))
    }

    fn pool_mut(&mut self, maturity: u64) -> Result<&mut Pool> {
        self.pools
            .get_mut(&maturity)
            .ok_or(SimError::PoolNotFound(maturity))
    }

    fn finish(&self, operation: &str, maturity: u64, result: Result<Tokens>) -> Result<Receipt> {
        let tokens = match result {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!("{} at maturity {} rejected: {}", operation, maturity, err);
                return Err(err);
            }
        };
        let pool = self.pool(maturity)?.snapshot();
        debug!(
            "{} at maturity {}: {:?}, state {:?}",
            operation, maturity, tokens, pool.state
        );
        Ok(Receipt {
            maturity,
            tokens,
            pool,
        })
    }

    /// Add liquidity, creating the pool on its first successful mint
    pub fn mint(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
        params: &MintParams,
        block: Block,
    ) -> Result<Receipt> {
        debug!("mint from {} to {}", sender, recipient);
        let (fee, protocol_fee) = (self.config.fee, self.config.protocol_fee);
        let result = match self.pools.entry(maturity) {
            Entry::Occupied(mut entry) => entry.get_mut().mint(recipient, params, block),
            Entry::Vacant(entry) => {
                let mut pool = Pool::new(maturity, fee, protocol_fee);
                pool.mint(recipient, params, block).map(|tokens| {
                    info!("Created pool at maturity {}", maturity);
                    entry.insert(pool);
                    tokens
                })
            }
        };
        self.finish("mint", maturity, result)
    }

    /// Lend asset for claims credited to `recipient`
    pub fn lend(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
        params: &LendParams,
        block: Block,
    ) -> Result<Receipt> {
        debug!("lend from {} to {}", sender, recipient);
        let result = self
            .pool_mut(maturity)
            .and_then(|pool| pool.lend(recipient, params, block));
        self.finish("lend", maturity, result)
    }

    /// Borrow asset, sent to `recipient`, against a due owned by the sender
    /// or the owner named in `params`
    pub fn borrow(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
        params: &BorrowParams,
        block: Block,
    ) -> Result<Receipt> {
        debug!("borrow from {} to {}", sender, recipient);
        let result = self
            .pool_mut(maturity)
            .and_then(|pool| pool.borrow(sender, params, block))
            .map(|(tokens, id)| {
                debug!("Recorded due {:?}", id);
                tokens
            });
        self.finish("borrow", maturity, result)
    }

    /// Burn the sender's liquidity, paying out to `recipient`
    pub fn burn(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
        params: &BurnParams,
        block: Block,
    ) -> Result<Receipt> {
        debug!("burn from {} to {}", sender, recipient);
        let result = self
            .pool_mut(maturity)
            .and_then(|pool| pool.burn(sender, params, block));
        self.finish("burn", maturity, result)
    }

    /// Redeem the sender's claims after maturity, paying out to `recipient`
    pub fn withdraw(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
        params: &WithdrawParams,
        block: Block,
    ) -> Result<Receipt> {
        debug!("withdraw from {} to {}", sender, recipient);
        let result = self
            .pool_mut(maturity)
            .and_then(|pool| pool.withdraw(sender, params, block));
        self.finish("withdraw", maturity, result)
    }

    /// Repay dues; released collateral goes to `recipient`
    pub fn pay(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
        params: &PayParams,
        block: Block,
    ) -> Result<Receipt> {
        debug!("pay from {} to {}", sender, recipient);
        let result = self
            .pool_mut(maturity)
            .and_then(|pool| pool.pay(sender, params, block));
        self.finish("pay", maturity, result)
    }

    /// Send the protocol fee stored at `maturity` to `recipient`.
    /// Only the configured owner may collect.
    pub fn collect_protocol_fee(
        &mut self,
        maturity: u64,
        sender: Address,
        recipient: Address,
    ) -> Result<Receipt> {
        debug!("collect protocol fee from {} to {}", sender, recipient);
        let result = if sender != self.config.owner {
            Err(SimError::Forbidden)
        } else {
            self.pool_mut(maturity)
                .and_then(|pool| pool.collect_protocol_fee())
        };
        self.finish("collect_protocol_fee", maturity, result)
    }

    /// Asset and collateral the pair contract should hold across all pools
    pub fn expected_balances(&self) -> Result<(U256, U256)> {
        self.pools
            .values()
            .try_fold((U256::ZERO, U256::ZERO), |(asset, collateral), pool| {
                let reserves = pool.reserves();
                Ok((
                    width::checked_add(asset, reserves.asset, Width::U256)?,
                    width::checked_add(collateral, reserves.collateral, Width::U256)?,
                ))
            })
    }

    /// Compare the pair contract's token balances with the simulated reserves
    pub fn reconcile(&self, balances: &impl TokenBalances) -> Result<()> {
        let (asset, collateral) = self.expected_balances()?;
        for (token, expected) in [(self.config.asset, asset), (self.config.collateral, collateral)] {
            let observed = balances.balance_of(token, self.config.contract)?;
            if observed != expected {
                warn!(
                    "Balance mismatch for {}: expected {}, observed {}",
                    token, expected, observed
                );
                return Err(SimError::BalanceMismatch {
                    token: token.to_string(),
                    expected: expected.to_string(),
                    observed: observed.to_string(),
                });
            }
        }
        Ok(())
    }
}
