//! Property tests for the arithmetic layer and the pool invariants

use alloy_primitives::{Address, U256, U512};
use pair_sim::math::{self, borrow, lend};
use pair_sim::width::{self, Width};
use pair_sim::{Block, BorrowParams, BurnParams, LendParams, MintParams, Pool, SimError};
use proptest::prelude::*;

const START: u64 = 1_000;
const MATURITY: u64 = START + 31_536_000;

fn width_strategy() -> impl Strategy<Value = Width> {
    prop_oneof![Just(Width::U112), Just(Width::U128), Just(Width::U256)]
}

fn value_strategy() -> impl Strategy<Value = U256> {
    (any::<[u64; 4]>(), 0usize..=256).prop_map(|(limbs, bits)| {
        let value = U256::from_limbs(limbs);
        if bits == 256 {
            value
        } else {
            value & ((U256::from(1u64) << bits) - U256::from(1u64))
        }
    })
}

fn wide_fits(value: U512, width: Width) -> bool {
    value.bit_len() <= width.bits()
}

proptest! {
    #[test]
    fn prop_add_fails_exactly_past_width(
        w in width_strategy(),
        a in value_strategy(),
        b in value_strategy(),
    ) {
        let exact = width::widen(a) + width::widen(b);
        let result = width::checked_add(a, b, w);
        if wide_fits(exact, w) && w.fits(a) && w.fits(b) {
            prop_assert_eq!(result, width::narrow(exact, Width::U256));
        } else if !wide_fits(exact, w) {
            prop_assert_eq!(result, Err(SimError::Overflow { width: w.bits() as u16 }));
        }
    }

    #[test]
    fn prop_mul_fails_exactly_past_width(
        w in width_strategy(),
        a in value_strategy(),
        b in value_strategy(),
    ) {
        let exact = width::widen(a) * width::widen(b);
        let result = width::checked_mul(a, b, w);
        prop_assert_eq!(result.is_ok(), wide_fits(exact, w));
    }

    #[test]
    fn prop_sub_never_wraps(
        w in width_strategy(),
        a in value_strategy(),
        b in value_strategy(),
    ) {
        let result = width::checked_sub(a, b, w);
        if a < b {
            prop_assert_eq!(result, Err(SimError::Overflow { width: w.bits() as u16 }));
        } else if w.fits(a) {
            prop_assert_eq!(result, Ok(a - b));
        }
    }

    #[test]
    fn prop_mul_div_up_is_at_most_one_above_floor(
        a in value_strategy(),
        b in value_strategy(),
        d in value_strategy(),
    ) {
        prop_assume!(!d.is_zero());
        let floor = width::mul_div(a, b, d, Width::U256);
        let ceil = width::mul_div_up(a, b, d, Width::U256);
        if let (Ok(floor), Ok(ceil)) = (floor, ceil) {
            prop_assert!(ceil == floor || ceil == floor + U256::from(1u64));
        }
    }
}

#[derive(Debug, Clone)]
enum Step {
    Lend { amount: u64, extra: u64 },
    Borrow { amount: u64, extra: u64 },
    Burn { share: u8 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u64..3_000, 0u64..20_000).prop_map(|(amount, extra)| Step::Lend { amount, extra }),
        (1u64..3_000, 0u64..20_000).prop_map(|(amount, extra)| Step::Borrow { amount, extra }),
        (1u8..=100).prop_map(|share| Step::Burn { share }),
    ]
}

fn account(i: usize) -> Address {
    Address::repeat_byte(0x40 + (i % 8) as u8)
}

/// Build quoted parameters for a step and apply it, returning whether it
/// was applied
fn apply_step(pool: &mut Pool, step: &Step, i: usize, block: Block) -> Result<bool, SimError> {
    let state = pool.state();
    match *step {
        Step::Lend { amount, extra } => {
            let asset_in = U256::from(amount);
            let minimum = math::minimum_interest_change(&state, asset_in, lend::fee_base(100))?;
            let interest = minimum + U256::from(extra);
            let cdp = match lend::quote_cdp_decrease(&state, asset_in, interest, 100, 50) {
                Ok(cdp) => cdp,
                Err(_) => return Ok(false),
            };
            let params = LendParams {
                asset_in,
                interest_decrease: interest,
                cdp_decrease: cdp,
            };
            pool.lend(account(i), &params, block).map(|_| true)
        }
        Step::Borrow { amount, extra } => {
            let asset_out = U256::from(amount);
            let minimum = math::minimum_interest_change(&state, asset_out, borrow::fee_base(100))?;
            let interest = minimum + U256::from(extra);
            let cdp = match borrow::quote_cdp_increase(&state, asset_out, interest, 100, 50) {
                Ok(cdp) => cdp,
                Err(_) => return Ok(false),
            };
            let mut params = BorrowParams::new(0, 0, 0);
            params.asset_out = asset_out;
            params.interest_increase = interest;
            params.cdp_increase = cdp;
            pool.borrow(account(i), &params, block).map(|_| true)
        }
        Step::Burn { share } => {
            let lp = Address::repeat_byte(0x11);
            let held = pool.liquidity_of(&lp);
            let liquidity = held * U256::from(share) / U256::from(100u64);
            if liquidity.is_zero() {
                return Ok(false);
            }
            pool.burn(lp, &BurnParams::new(liquidity), block).map(|_| true)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_lend_borrow_never_decrease_invariant(
        seed in (1_000u64..1_000_000, 10_000u64..500_000, 1_000u64..1_000_000),
        steps in prop::collection::vec(step_strategy(), 1..16),
    ) {
        let mut pool = Pool::new(MATURITY, 100, 50);
        let lp = Address::repeat_byte(0x11);
        pool.mint(lp, &MintParams::new(seed.0 as u128, seed.1 as u128, seed.2 as u128), Block::new(START, 1))
            .unwrap();

        for (i, step) in steps.iter().enumerate() {
            let block = Block::new(START + 1_000 * (i as u64 + 1), i as u64 + 2);
            let before = pool.clone();
            match apply_step(&mut pool, step, i, block) {
                Ok(true) => {
                    if !matches!(step, Step::Burn { .. }) {
                        prop_assert!(pool.invariant() >= before.invariant());
                    }
                }
                Ok(false) => prop_assert_eq!(&pool, &before),
                Err(err) => {
                    prop_assert!(!err.is_fatal(), "quoted step broke the product: {}", err);
                    prop_assert_eq!(&pool, &before);
                }
            }
            prop_assert!(pool.check_invariants().is_ok());
        }
    }

    #[test]
    fn prop_mint_burn_round_trip(
        asset in 1u64..u64::MAX,
        interest in 1u64..u64::MAX,
        cdp in 1u64..1u64 << 40,
    ) {
        let mut pool = Pool::new(MATURITY, 100, 50);
        let lp = Address::repeat_byte(0x11);
        let minted = pool
            .mint(lp, &MintParams::new(asset as u128, interest as u128, cdp as u128), Block::new(START, 1))
            .unwrap();
        let burned = pool
            .burn(lp, &BurnParams::new(pool.total_liquidity()), Block::new(START + 1, 2))
            .unwrap();

        prop_assert_eq!(burned.asset_out, minted.asset_in);
        prop_assert_eq!(burned.collateral_out, minted.collateral_in);
        prop_assert_eq!(pool.reserves(), pair_sim::Reserves::default());
        prop_assert_eq!(pool.state(), pair_sim::RateState::default());
    }
}
