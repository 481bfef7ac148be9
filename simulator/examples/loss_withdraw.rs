//! Example: Loss withdraw
//!
//! Seeds a pool, lends into it, lets a borrower drain most of the asset and
//! default, then redeems the lender's claims after maturity. Bonds are paid
//! pro rata because the asset reserve no longer covers them.

use alloy_primitives::{Address, U256};
use anyhow::Context;
use pair_sim::math::{borrow, lend};
use pair_sim::{Block, BorrowParams, LendParams, MintParams, PairSim, SimConfig, WithdrawParams};

const YEAR: u64 = 31_556_952;

fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("pair_sim=debug")
        .init();

    println!("=== Pair Simulator Loss Withdraw Example ===\n");

    let config = SimConfig::new(Address::repeat_byte(0xa5), Address::repeat_byte(0xc5))
        .with_contract(Address::repeat_byte(0x9a))
        .with_owner(Address::repeat_byte(0x0e));
    let (fee, protocol_fee) = (config.fee, config.protocol_fee);
    let mut sim = PairSim::new(config)?;

    let (lp, lender, borrower) = (
        Address::repeat_byte(0x11),
        Address::repeat_byte(0x22),
        Address::repeat_byte(0x33),
    );
    let now = 1_700_000_000;
    let maturity = now + YEAR;

    sim.mint(maturity, lp, lp, &MintParams::new(10_000, 136_192, 10_000), Block::new(now, 1))?;
    println!("✓ Minted pool at maturity {}", maturity);

    let state = sim.get_pool(maturity).context("pool missing")?.state();
    let mut lend_params = LendParams::new(1_000, 2_000, 0);
    lend_params.cdp_decrease = lend::quote_cdp_decrease(
        &state,
        lend_params.asset_in,
        lend_params.interest_decrease,
        fee,
        protocol_fee,
    )?;
    sim.lend(maturity, lender, lender, &lend_params, Block::new(now + 12, 2))?;
    let claims = sim.get_claims(maturity, &lender)?;
    println!("✓ Lent 1000: bond {}, insurance {}", claims.bond, claims.insurance);

    let state = sim.get_pool(maturity).context("pool missing")?.state();
    let mut borrow_params = BorrowParams::new(10_000, 400_000, 0);
    borrow_params.cdp_increase = borrow::quote_cdp_increase(
        &state,
        borrow_params.asset_out,
        borrow_params.interest_increase,
        fee,
        protocol_fee,
    )?;
    let receipt = sim.borrow(maturity, borrower, borrower, &borrow_params, Block::new(now + 24, 3))?;
    println!(
        "✓ Borrowed 10000 against {} collateral, then defaulted",
        receipt.tokens.collateral_in
    );

    let pool = sim.get_pool(maturity).context("pool missing")?;
    let available = pool.reserves().asset - pool.protocol_fee_stored();
    println!(
        "\nAt maturity: {} asset available for {} bonds",
        available,
        pool.total_claims().bond
    );

    let receipt = sim.withdraw(
        maturity,
        lender,
        lender,
        &WithdrawParams { claims_in: claims },
        Block::new(maturity, 4),
    )?;
    println!(
        "✓ Withdrew {} asset and {} collateral",
        receipt.tokens.asset_out, receipt.tokens.collateral_out
    );
    if receipt.tokens.asset_out < claims.bond {
        println!(
            "  Bond loss: {}",
            claims.bond - receipt.tokens.asset_out
        );
    }
    assert_eq!(receipt.pool.total_claims.bond, U256::ZERO);

    println!("\nFinal pool snapshot:\n{}", receipt.pool.to_json()?);
    Ok(())
}
