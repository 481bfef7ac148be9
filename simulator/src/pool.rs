//! Per-maturity pool ledger.
//!
//! A [`Pool`] holds everything the pair contract stores for one maturity:
//! reserves, invariant factors, supplies and per-account balances. Each
//! operation validates its parameters, computes every new value into locals
//! and only then writes them back, so a failed call leaves the pool exactly
//! as it was.

use crate::error::{Result, SimError};
use crate::math::{self, borrow, lend, mint};
use crate::params::{BorrowParams, BurnParams, LendParams, MintParams, PayParams, WithdrawParams};
use crate::snapshot::{AccountView, DueView, PoolSnapshot};
use crate::types::{Block, Claims, Due, DueId, RateState, Reserves, Tokens};
use crate::width::{self, Width};
use alloy_primitives::{Address, U256, U512};
use std::collections::BTreeMap;

/// State of one maturity of a pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    maturity: u64,
    fee: u16,
    protocol_fee: u16,
    reserves: Reserves,
    state: RateState,
    total_liquidity: U256,
    total_debt_created: U256,
    total_claims: Claims,
    protocol_fee_stored: U256,
    defaulted_collateral_paid: U256,
    liquidity_of: BTreeMap<Address, U256>,
    claims_of: BTreeMap<Address, Claims>,
    dues: Vec<Due>,
    dues_of: BTreeMap<Address, Vec<DueId>>,
}

impl Pool {
    /// Create an empty pool maturing at `maturity`
    pub fn new(maturity: u64, fee: u16, protocol_fee: u16) -> Self {
        Self {
            maturity,
            fee,
            protocol_fee,
            reserves: Reserves::default(),
            state: RateState::default(),
            total_liquidity: U256::ZERO,
            total_debt_created: U256::ZERO,
            total_claims: Claims::default(),
            protocol_fee_stored: U256::ZERO,
            defaulted_collateral_paid: U256::ZERO,
            liquidity_of: BTreeMap::new(),
            claims_of: BTreeMap::new(),
            dues: Vec::new(),
            dues_of: BTreeMap::new(),
        }
    }

    /// Maturity timestamp
    pub fn maturity(&self) -> u64 {
        self.maturity
    }

    /// Tokens held
    pub fn reserves(&self) -> Reserves {
        self.reserves
    }

    /// Invariant factors
    pub fn state(&self) -> RateState {
        self.state
    }

    /// Outstanding liquidity
    pub fn total_liquidity(&self) -> U256 {
        self.total_liquidity
    }

    /// Cumulative debt issued
    pub fn total_debt_created(&self) -> U256 {
        self.total_debt_created
    }

    /// Outstanding claims
    pub fn total_claims(&self) -> Claims {
        self.total_claims
    }

    /// Asset held for the protocol owner
    pub fn protocol_fee_stored(&self) -> U256 {
        self.protocol_fee_stored
    }

    /// Collateral of defaulted dues already paid out, to insurance holders
    /// or to liquidity burned after maturity
    pub fn defaulted_collateral_paid(&self) -> U256 {
        self.defaulted_collateral_paid
    }

    /// The invariant product of the current state
    pub fn invariant(&self) -> U512 {
        math::invariant(&self.state)
    }

    /// Liquidity held by `account`
    pub fn liquidity_of(&self, account: &Address) -> U256 {
        self.liquidity_of.get(account).copied().unwrap_or_default()
    }

    /// Claims held by `account`
    pub fn claims_of(&self, account: &Address) -> Claims {
        self.claims_of.get(account).copied().unwrap_or_default()
    }

    /// Dues owned by `account`, in creation order
    pub fn dues_of(&self, account: &Address) -> Vec<&Due> {
        self.dues_of
            .get(account)
            .map(|ids| ids.iter().filter_map(|id| self.dues.get(id.0)).collect())
            .unwrap_or_default()
    }

    /// Look up a due by arena index
    pub fn due(&self, id: DueId) -> Option<&Due> {
        self.dues.get(id.0)
    }

    /// Collateral backing dues that has not yet been paid out
    pub fn locked_collateral(&self) -> U256 {
        let locked = self
            .dues
            .iter()
            .fold(U256::ZERO, |acc, due| acc.saturating_add(due.collateral));
        locked.saturating_sub(self.defaulted_collateral_paid)
    }

    /// Collateral of dues that still carry debt. After maturity this is the
    /// insurance pot.
    pub fn defaulted_collateral(&self) -> U256 {
        self.dues
            .iter()
            .filter(|due| !due.debt.is_zero())
            .fold(U256::ZERO, |acc, due| acc.saturating_add(due.collateral))
    }

    /// Pool-wide snapshot
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            maturity: self.maturity,
            reserves: self.reserves,
            state: self.state,
            total_liquidity: self.total_liquidity,
            total_debt_created: self.total_debt_created,
            total_claims: self.total_claims,
            protocol_fee_stored: self.protocol_fee_stored,
        }
    }

    /// Positions of `account`, with due status evaluated at `now`
    pub fn account_view(&self, account: &Address, now: u64) -> AccountView {
        AccountView {
            account: *account,
            liquidity: self.liquidity_of(account),
            claims: self.claims_of(account),
            dues: self
                .dues_of(account)
                .into_iter()
                .map(|due| DueView {
                    debt: due.debt,
                    collateral: due.collateral,
                    start_block: due.start_block,
                    status: due.status(self.maturity, now),
                })
                .collect(),
        }
    }

    /// Check the ledger's standing invariants: supplies equal the sum of
    /// balances, stored values fit their widths, and reserves cover the
    /// protocol fee and locked collateral.
    pub fn check_invariants(&self) -> Result<()> {
        let liquidity = self
            .liquidity_of
            .values()
            .try_fold(U256::ZERO, |acc, v| width::checked_add(acc, *v, Width::U256))?;
        if liquidity != self.total_liquidity {
            return Err(SimError::InvariantViolation(format!(
                "total liquidity {} but balances sum to {}",
                self.total_liquidity, liquidity
            )));
        }

        let mut claims = Claims::default();
        for c in self.claims_of.values() {
            claims.bond = width::checked_add(claims.bond, c.bond, Width::U128)?;
            claims.insurance = width::checked_add(claims.insurance, c.insurance, Width::U128)?;
        }
        if claims != self.total_claims {
            return Err(SimError::InvariantViolation(format!(
                "total claims {:?} but balances sum to {:?}",
                self.total_claims, claims
            )));
        }

        for value in [self.state.asset, self.state.interest, self.state.cdp] {
            Width::U112.check(value)?;
        }
        for value in [self.reserves.asset, self.reserves.collateral] {
            Width::U128.check(value)?;
        }

        if self.reserves.asset < self.protocol_fee_stored {
            return Err(SimError::InvariantViolation(
                "asset reserve below stored protocol fee".to_string(),
            ));
        }
        if self.reserves.collateral < self.locked_collateral() {
            return Err(SimError::InvariantViolation(
                "collateral reserve below locked collateral".to_string(),
            ));
        }
        Ok(())
    }

    /// Asset not owed to the protocol owner
    fn free_asset(&self) -> U256 {
        self.reserves.asset.saturating_sub(self.protocol_fee_stored)
    }

    /// Defaulted collateral that no insurance claim can reach: the unpaid
    /// pot once the pool has matured with no insurance outstanding
    fn unclaimed_default(&self, now: u64) -> U256 {
        if now < self.maturity || !self.total_claims.insurance.is_zero() {
            return U256::ZERO;
        }
        self.defaulted_collateral()
            .saturating_sub(self.defaulted_collateral_paid)
    }

    /// Add liquidity. The first mint seeds the invariant factors directly.
    pub fn mint(&mut self, recipient: Address, params: &MintParams, block: Block) -> Result<Tokens> {
        params.validate()?;
        let duration = math::duration(self.maturity, block.timestamp)?;
        let outcome = mint::apply(&self.state, self.total_liquidity, params, duration)?;

        let reserves = Reserves {
            asset: width::checked_add(self.reserves.asset, params.asset_in, Width::U128)?,
            collateral: width::checked_add(self.reserves.collateral, outcome.collateral_in, Width::U128)?,
        };
        let total_liquidity =
            width::checked_add(self.total_liquidity, outcome.liquidity_out, Width::U256)?;
        let balance = width::checked_add(
            self.liquidity_of(&recipient),
            outcome.liquidity_out,
            Width::U256,
        )?;

        self.state = outcome.state;
        self.reserves = reserves;
        self.total_liquidity = total_liquidity;
        self.liquidity_of.insert(recipient, balance);

        Ok(Tokens {
            asset_in: params.asset_in,
            collateral_in: outcome.collateral_in,
            ..Tokens::default()
        })
    }

    /// Lend asset for bond and insurance claims
    pub fn lend(&mut self, recipient: Address, params: &LendParams, block: Block) -> Result<Tokens> {
        params.validate()?;
        let duration = math::duration(self.maturity, block.timestamp)?;
        if self.total_liquidity.is_zero() {
            return Err(SimError::Invalid("pool has no liquidity".to_string()));
        }
        let outcome = lend::apply(&self.state, params, duration, self.fee, self.protocol_fee)?;

        let asset = width::checked_add(self.reserves.asset, params.asset_in, Width::U128)?;
        let protocol_fee_stored =
            width::checked_add(self.protocol_fee_stored, outcome.protocol_fee, Width::U128)?;
        let total_claims = add_claims(self.total_claims, outcome.claims_out)?;
        let claims = add_claims(self.claims_of(&recipient), outcome.claims_out)?;

        self.state = outcome.state;
        self.reserves.asset = asset;
        self.protocol_fee_stored = protocol_fee_stored;
        self.total_claims = total_claims;
        self.claims_of.insert(recipient, claims);

        Ok(Tokens {
            asset_in: params.asset_in,
            ..Tokens::default()
        })
    }

    /// Borrow asset against collateral, recording a due for the owner
    /// (`sender` unless the params name one)
    pub fn borrow(&mut self, sender: Address, params: &BorrowParams, block: Block) -> Result<(Tokens, DueId)> {
        params.validate()?;
        let duration = math::duration(self.maturity, block.timestamp)?;
        if self.total_liquidity.is_zero() {
            return Err(SimError::Invalid("pool has no liquidity".to_string()));
        }
        let outcome = borrow::apply(&self.state, params, duration, self.fee, self.protocol_fee)?;

        let removed = width::checked_add(params.asset_out, outcome.protocol_fee, Width::U256)?;
        if removed > self.free_asset() {
            return Err(SimError::Invalid(
                "borrow exceeds free asset reserve".to_string(),
            ));
        }

        let reserves = Reserves {
            asset: self.reserves.asset - params.asset_out,
            collateral: width::checked_add(self.reserves.collateral, outcome.collateral, Width::U128)?,
        };
        let protocol_fee_stored =
            width::checked_add(self.protocol_fee_stored, outcome.protocol_fee, Width::U128)?;
        let total_debt_created =
            width::checked_add(self.total_debt_created, outcome.debt, Width::U256)?;

        let owner = params.owner.unwrap_or(sender);
        let id = DueId(self.dues.len());

        self.state = outcome.state;
        self.reserves = reserves;
        self.protocol_fee_stored = protocol_fee_stored;
        self.total_debt_created = total_debt_created;
        self.dues.push(Due {
            owner,
            debt: outcome.debt,
            collateral: outcome.collateral,
            start_block: block.number,
            debt_created: outcome.debt,
        });
        self.dues_of.entry(owner).or_default().push(id);

        let tokens = Tokens {
            collateral_in: outcome.collateral,
            asset_out: params.asset_out,
            ..Tokens::default()
        };
        Ok((tokens, id))
    }

    /// Burn liquidity for a proportional share of the free asset, the
    /// collateral not locked by dues, and the invariant factors.
    ///
    /// After maturity, defaulted collateral is added to the share when no
    /// insurance claims are outstanding.
    pub fn burn(&mut self, sender: Address, params: &BurnParams, block: Block) -> Result<Tokens> {
        params.validate()?;
        let balance = self.liquidity_of(&sender);
        if params.liquidity_in > balance {
            return Err(SimError::InsufficientBalance);
        }
        let liquidity_in = params.liquidity_in;
        let total = self.total_liquidity;

        let free_asset = self.free_asset().saturating_sub(self.total_claims.bond);
        let asset_out = width::mul_div(free_asset, liquidity_in, total, Width::U128)?;
        let lp_collateral = self
            .reserves
            .collateral
            .saturating_sub(self.locked_collateral());
        let released = width::mul_div(
            self.unclaimed_default(block.timestamp),
            liquidity_in,
            total,
            Width::U128,
        )?;
        let collateral_out = width::checked_add(
            width::mul_div(lp_collateral, liquidity_in, total, Width::U128)?,
            released,
            Width::U128,
        )?;
        let defaulted_collateral_paid =
            width::checked_add(self.defaulted_collateral_paid, released, Width::U128)?;

        let shrink = |factor: U256| -> Result<U256> {
            let share = width::mul_div(factor, liquidity_in, total, Width::U112)?;
            Ok(factor - share)
        };
        let state = RateState {
            asset: shrink(self.state.asset)?,
            interest: shrink(self.state.interest)?,
            cdp: shrink(self.state.cdp)?,
        };

        self.state = state;
        self.reserves.asset -= asset_out;
        self.reserves.collateral -= collateral_out;
        self.defaulted_collateral_paid = defaulted_collateral_paid;
        self.total_liquidity = total - liquidity_in;
        set_or_remove(&mut self.liquidity_of, sender, balance - liquidity_in);

        Ok(Tokens {
            asset_out,
            collateral_out,
            ..Tokens::default()
        })
    }

    /// Redeem claims after maturity. Bonds pay at par while the asset
    /// reserve covers all bonds and pro rata otherwise; insurance pays a
    /// share of the collateral of defaulted dues.
    pub fn withdraw(&mut self, sender: Address, params: &WithdrawParams, block: Block) -> Result<Tokens> {
        params.validate()?;
        if block.timestamp < self.maturity {
            return Err(SimError::NotMatured);
        }
        let held = self.claims_of(&sender);
        let claims_in = params.claims_in;
        if claims_in.bond > held.bond || claims_in.insurance > held.insurance {
            return Err(SimError::InsufficientBalance);
        }

        let available = self.free_asset();
        let bonds = self.total_claims.bond;
        let asset_out = if claims_in.bond.is_zero() {
            U256::ZERO
        } else if available >= bonds {
            claims_in.bond
        } else {
            width::mul_div(claims_in.bond, available, bonds, Width::U128)?
        };

        let pot = self
            .defaulted_collateral()
            .saturating_sub(self.defaulted_collateral_paid);
        let collateral_out = if claims_in.insurance.is_zero() {
            U256::ZERO
        } else {
            width::mul_div(
                claims_in.insurance,
                pot,
                self.total_claims.insurance,
                Width::U128,
            )?
        };

        let defaulted_collateral_paid =
            width::checked_add(self.defaulted_collateral_paid, collateral_out, Width::U128)?;

        self.reserves.asset -= asset_out;
        self.reserves.collateral -= collateral_out;
        self.defaulted_collateral_paid = defaulted_collateral_paid;
        self.total_claims = Claims::new(
            self.total_claims.bond - claims_in.bond,
            self.total_claims.insurance - claims_in.insurance,
        );
        let remaining = Claims::new(held.bond - claims_in.bond, held.insurance - claims_in.insurance);
        if remaining.is_zero() {
            self.claims_of.remove(&sender);
        } else {
            self.claims_of.insert(sender, remaining);
        }

        Ok(Tokens {
            asset_out,
            collateral_out,
            ..Tokens::default()
        })
    }

    /// Repay dues of `params.owner` and release their collateral.
    ///
    /// Entries are applied in order, so the same due may appear more than
    /// once. Anyone may repay; only the owner may release collateral.
    pub fn pay(&mut self, sender: Address, params: &PayParams, block: Block) -> Result<Tokens> {
        params.validate()?;
        if params
            .debts_in
            .iter()
            .chain(params.collaterals_out.iter())
            .all(|v| v.is_zero())
        {
            return Err(SimError::Zero);
        }
        let matured = block.timestamp >= self.maturity;
        let owned = self.dues_of.get(&params.owner).map(Vec::as_slice).unwrap_or(&[]);

        let mut staged: BTreeMap<usize, Due> = BTreeMap::new();
        let mut debt_total = U256::ZERO;
        let mut collateral_total = U256::ZERO;

        for ((index, debt_in), collateral_out) in params
            .ids
            .iter()
            .zip(params.debts_in.iter().copied())
            .zip(params.collaterals_out.iter().copied())
        {
            let id = owned
                .get(*index)
                .ok_or_else(|| SimError::Invalid(format!("unknown due {}", index)))?;
            let mut due = match staged.get(&id.0) {
                Some(due) => due.clone(),
                None => self.dues[id.0].clone(),
            };

            if matured && !due.debt.is_zero() {
                return Err(SimError::Expired);
            }
            if debt_in > due.debt {
                return Err(SimError::Invalid("repayment exceeds debt".to_string()));
            }
            let cap = if debt_in == due.debt {
                due.collateral
            } else {
                width::mul_div(due.collateral, debt_in, due.debt, Width::U128)?
            };
            if collateral_out > cap {
                return Err(SimError::Invalid(
                    "collateral release exceeds repayment".to_string(),
                ));
            }
            if !collateral_out.is_zero() && sender != params.owner {
                return Err(SimError::Forbidden);
            }

            due.debt -= debt_in;
            due.collateral -= collateral_out;
            debt_total = width::checked_add(debt_total, debt_in, Width::U128)?;
            collateral_total = width::checked_add(collateral_total, collateral_out, Width::U128)?;
            staged.insert(id.0, due);
        }

        let reserves = Reserves {
            asset: width::checked_add(self.reserves.asset, debt_total, Width::U128)?,
            collateral: width::checked_sub(self.reserves.collateral, collateral_total, Width::U128)?,
        };

        self.reserves = reserves;
        for (index, due) in staged {
            self.dues[index] = due;
        }

        Ok(Tokens {
            asset_in: debt_total,
            collateral_out: collateral_total,
            ..Tokens::default()
        })
    }

    /// Pay out the stored protocol fee
    pub fn collect_protocol_fee(&mut self) -> Result<Tokens> {
        if self.protocol_fee_stored.is_zero() {
            return Err(SimError::Zero);
        }
        let asset_out = self.protocol_fee_stored;
        self.reserves.asset -= asset_out;
        self.protocol_fee_stored = U256::ZERO;
        Ok(Tokens {
            asset_out,
            ..Tokens::default()
        })
    }
}

fn add_claims(a: Claims, b: Claims) -> Result<Claims> {
    Ok(Claims::new(
        width::checked_add(a.bond, b.bond, Width::U128)?,
        width::checked_add(a.insurance, b.insurance, Width::U128)?,
    ))
}

fn set_or_remove(map: &mut BTreeMap<Address, U256>, account: Address, value: U256) {
    if value.is_zero() {
        map.remove(&account);
    } else {
        map.insert(account, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DueStatus;
    use assert_matches::assert_matches;

    const YEAR: u64 = 31_536_000;
    const START: u64 = 1_000;
    const MATURITY: u64 = START + YEAR;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn before() -> Block {
        Block::new(START, 10)
    }

    fn at_maturity() -> Block {
        Block::new(MATURITY, 20)
    }

    fn seeded() -> Pool {
        let mut pool = Pool::new(MATURITY, 100, 50);
        pool.mint(alice(), &MintParams::new(10_000, 136_192, 10_000), before())
            .unwrap();
        pool
    }

    fn quoted_borrow(pool: &Pool, asset_out: u64, interest_increase: u64) -> BorrowParams {
        let cdp = borrow::quote_cdp_increase(
            &pool.state(),
            U256::from(asset_out),
            U256::from(interest_increase),
            100,
            50,
        )
        .unwrap();
        let mut params = BorrowParams::new(asset_out as u128, interest_increase as u128, 0);
        params.cdp_increase = cdp;
        params
    }

    fn quoted_lend(pool: &Pool, asset_in: u64, interest_decrease: u64) -> LendParams {
        let cdp = lend::quote_cdp_decrease(
            &pool.state(),
            U256::from(asset_in),
            U256::from(interest_decrease),
            100,
            50,
        )
        .unwrap();
        let mut params = LendParams::new(asset_in as u128, interest_decrease as u128, 0);
        params.cdp_decrease = cdp;
        params
    }

    #[test]
    fn test_mint_seeds_pool() {
        let pool = seeded();
        assert_eq!(pool.reserves().asset, U256::from(10_000u64));
        assert_eq!(pool.reserves().collateral, U256::from(19_399u64));
        assert_eq!(pool.total_liquidity(), U256::from(10_000u64) << 16);
        assert_eq!(pool.liquidity_of(&alice()), pool.total_liquidity());
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_mint_at_maturity_is_expired() {
        let mut pool = Pool::new(MATURITY, 100, 50);
        let result = pool.mint(alice(), &MintParams::new(1, 1, 1), at_maturity());
        assert_eq!(result, Err(SimError::Expired));
        assert_eq!(pool, Pool::new(MATURITY, 100, 50));
    }

    #[test]
    fn test_lend_on_empty_pool_is_invalid() {
        let mut pool = Pool::new(MATURITY, 100, 50);
        let result = pool.lend(alice(), &LendParams::new(100, 10, 0), before());
        assert_matches!(result, Err(SimError::Invalid(_)));
    }

    #[test]
    fn test_lend_mints_claims_and_stores_fee() {
        let mut pool = seeded();
        let params = quoted_lend(&pool, 1_000, 2_000);
        let tokens = pool.lend(bob(), &params, before()).unwrap();

        assert_eq!(tokens.asset_in, U256::from(1_000u64));
        assert_eq!(pool.reserves().asset, U256::from(11_000u64));
        assert_eq!(pool.protocol_fee_stored(), U256::ZERO);
        assert!(!pool.claims_of(&bob()).bond.is_zero());
        assert_eq!(pool.total_claims(), pool.claims_of(&bob()));
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_failed_lend_leaves_pool_unchanged() {
        let mut pool = seeded();
        let mut params = quoted_lend(&pool, 1_000, 2_000);
        params.cdp_decrease += U256::from(1u64);
        let before_pool = pool.clone();

        assert_matches!(
            pool.lend(bob(), &params, before()),
            Err(SimError::InvariantViolation(_))
        );
        assert_eq!(pool, before_pool);
    }

    #[test]
    fn test_borrow_records_due() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, id) = pool.borrow(bob(), &params, before()).unwrap();

        assert_eq!(id, DueId(0));
        assert_eq!(tokens.asset_out, U256::from(500u64));
        assert_eq!(pool.reserves().asset, U256::from(9_500u64));
        assert_eq!(pool.protocol_fee_stored(), U256::from(1u64));

        let dues = pool.dues_of(&bob());
        assert_eq!(dues.len(), 1);
        assert_eq!(dues[0].debt, U256::from(508u64));
        assert_eq!(dues[0].collateral, tokens.collateral_in);
        assert_eq!(dues[0].start_block, 10);
        assert_eq!(pool.total_debt_created(), U256::from(508u64));
        assert_eq!(pool.locked_collateral(), tokens.collateral_in);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_borrow_for_another_owner() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000).with_owner(alice());
        pool.borrow(bob(), &params, before()).unwrap();
        assert!(pool.dues_of(&bob()).is_empty());
        assert_eq!(pool.dues_of(&alice()).len(), 1);
    }

    #[test]
    fn test_burn_requires_balance() {
        let mut pool = seeded();
        let params = BurnParams::new(U256::from(1u64));
        assert_eq!(
            pool.burn(bob(), &params, before()),
            Err(SimError::InsufficientBalance)
        );
        assert_eq!(
            pool.burn(alice(), &BurnParams::new(U256::ZERO), before()),
            Err(SimError::Zero)
        );
    }

    #[test]
    fn test_burn_all_returns_everything() {
        let mut pool = seeded();
        let all = pool.total_liquidity();
        let tokens = pool.burn(alice(), &BurnParams::new(all), before()).unwrap();

        assert_eq!(tokens.asset_out, U256::from(10_000u64));
        assert_eq!(tokens.collateral_out, U256::from(19_399u64));
        assert_eq!(pool.reserves(), Reserves::default());
        assert_eq!(pool.state(), RateState::default());
        assert_eq!(pool.liquidity_of(&alice()), U256::ZERO);
    }

    #[test]
    fn test_burn_keeps_locked_collateral() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, _) = pool.borrow(bob(), &params, before()).unwrap();

        let all = pool.total_liquidity();
        pool.burn(alice(), &BurnParams::new(all), before()).unwrap();
        assert_eq!(pool.reserves().collateral, tokens.collateral_in);
        assert_eq!(pool.reserves().asset, pool.protocol_fee_stored());
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_burn_after_maturity_releases_unclaimed_default() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, _) = pool.borrow(bob(), &params, before()).unwrap();
        let lp_collateral = pool.reserves().collateral - tokens.collateral_in;

        let half = pool.total_liquidity() / U256::from(2u64);
        let first = pool.burn(alice(), &BurnParams::new(half), at_maturity()).unwrap();
        assert!(first.collateral_out > lp_collateral / U256::from(2u64));
        assert!(pool.check_invariants().is_ok());

        let rest = pool.total_liquidity();
        let second = pool.burn(alice(), &BurnParams::new(rest), at_maturity()).unwrap();
        assert_eq!(
            first.collateral_out + second.collateral_out,
            lp_collateral + tokens.collateral_in
        );
        assert_eq!(pool.reserves().collateral, U256::ZERO);
        assert_eq!(pool.locked_collateral(), U256::ZERO);
        assert_eq!(pool.defaulted_collateral_paid(), tokens.collateral_in);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_burn_after_maturity_leaves_default_to_insurance() {
        let mut pool = seeded();
        let lend = quoted_lend(&pool, 1_000, 2_000);
        pool.lend(bob(), &lend, before()).unwrap();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, _) = pool.borrow(bob(), &params, before()).unwrap();

        let all = pool.total_liquidity();
        pool.burn(alice(), &BurnParams::new(all), at_maturity()).unwrap();
        assert_eq!(pool.reserves().collateral, tokens.collateral_in);
        assert_eq!(pool.defaulted_collateral_paid(), U256::ZERO);

        let claims = pool.claims_of(&bob());
        let paid = pool
            .withdraw(bob(), &WithdrawParams { claims_in: claims }, at_maturity())
            .unwrap();
        assert_eq!(paid.collateral_out, tokens.collateral_in);
        assert_eq!(pool.reserves().collateral, U256::ZERO);
    }

    #[test]
    fn test_withdraw_before_maturity() {
        let mut pool = seeded();
        let params = quoted_lend(&pool, 1_000, 2_000);
        pool.lend(bob(), &params, before()).unwrap();
        let claims = pool.claims_of(&bob());
        let request = WithdrawParams { claims_in: claims };

        assert_eq!(
            pool.withdraw(bob(), &request, Block::new(MATURITY - 1, 19)),
            Err(SimError::NotMatured)
        );
        let tokens = pool.withdraw(bob(), &request, at_maturity()).unwrap();
        assert_eq!(tokens.asset_out, claims.bond);
        assert_eq!(tokens.collateral_out, U256::ZERO);
        assert!(pool.total_claims().is_zero());
    }

    #[test]
    fn test_withdraw_more_than_held() {
        let mut pool = seeded();
        let request = WithdrawParams::new(1, 0);
        assert_eq!(
            pool.withdraw(bob(), &request, at_maturity()),
            Err(SimError::InsufficientBalance)
        );
    }

    #[test]
    fn test_pay_full_releases_collateral() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, _) = pool.borrow(bob(), &params, before()).unwrap();

        let pay = PayParams::single(bob(), 0, U256::from(508u64), tokens.collateral_in);
        let paid = pool.pay(bob(), &pay, before()).unwrap();
        assert_eq!(paid.asset_in, U256::from(508u64));
        assert_eq!(paid.collateral_out, tokens.collateral_in);

        let due = pool.dues_of(&bob())[0].clone();
        assert_eq!(due.status(MATURITY, START), DueStatus::Settled);
        assert_eq!(pool.locked_collateral(), U256::ZERO);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_pay_partial_caps_collateral() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, _) = pool.borrow(bob(), &params, before()).unwrap();
        let cap = tokens.collateral_in * U256::from(254u64) / U256::from(508u64);

        let over = PayParams::single(bob(), 0, U256::from(254u64), cap + U256::from(1u64));
        assert_matches!(pool.pay(bob(), &over, before()), Err(SimError::Invalid(_)));

        let ok = PayParams::single(bob(), 0, U256::from(254u64), cap);
        pool.pay(bob(), &ok, before()).unwrap();
        let due = pool.dues_of(&bob())[0].clone();
        assert_eq!(due.debt, U256::from(254u64));
        assert_eq!(due.status(MATURITY, START), DueStatus::PartiallyPaid);
    }

    #[test]
    fn test_pay_is_applied_in_sequence() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        pool.borrow(bob(), &params, before()).unwrap();

        // the second entry sees the debt left by the first
        let pay = PayParams {
            owner: bob(),
            ids: vec![0, 0],
            debts_in: vec![U256::from(300u64), U256::from(300u64)],
            collaterals_out: vec![U256::ZERO, U256::ZERO],
        };
        let before_pool = pool.clone();
        assert_matches!(pool.pay(bob(), &pay, before()), Err(SimError::Invalid(_)));
        assert_eq!(pool, before_pool);
    }

    #[test]
    fn test_pay_rules() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        let (tokens, _) = pool.borrow(bob(), &params, before()).unwrap();

        let overpay = PayParams::single(bob(), 0, U256::from(509u64), U256::ZERO);
        assert_matches!(pool.pay(bob(), &overpay, before()), Err(SimError::Invalid(_)));

        let unknown = PayParams::single(bob(), 3, U256::from(1u64), U256::ZERO);
        assert_matches!(pool.pay(bob(), &unknown, before()), Err(SimError::Invalid(_)));

        let nothing = PayParams::single(bob(), 0, U256::ZERO, U256::ZERO);
        assert_eq!(pool.pay(bob(), &nothing, before()), Err(SimError::Zero));

        let stranger = PayParams::single(bob(), 0, U256::from(508u64), tokens.collateral_in);
        assert_eq!(pool.pay(alice(), &stranger, before()), Err(SimError::Forbidden));

        let late = PayParams::single(bob(), 0, U256::from(508u64), U256::ZERO);
        assert_eq!(pool.pay(bob(), &late, at_maturity()), Err(SimError::Expired));
    }

    #[test]
    fn test_collect_protocol_fee() {
        let mut pool = seeded();
        assert_eq!(pool.collect_protocol_fee(), Err(SimError::Zero));

        let params = quoted_borrow(&pool, 500, 1_000);
        pool.borrow(bob(), &params, before()).unwrap();
        let tokens = pool.collect_protocol_fee().unwrap();
        assert_eq!(tokens.asset_out, U256::from(1u64));
        assert_eq!(pool.protocol_fee_stored(), U256::ZERO);
        assert_eq!(pool.reserves().asset, U256::from(9_499u64));
    }

    #[test]
    fn test_account_view_reports_default() {
        let mut pool = seeded();
        let params = quoted_borrow(&pool, 500, 1_000);
        pool.borrow(bob(), &params, before()).unwrap();

        let view = pool.account_view(&bob(), MATURITY);
        assert_eq!(view.dues.len(), 1);
        assert_eq!(view.dues[0].status, DueStatus::Defaulted);
        assert_eq!(pool.defaulted_collateral(), view.dues[0].collateral);
    }
}
