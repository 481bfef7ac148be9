//! Reference simulator for a fixed-maturity lending pair
//!
//! This library recomputes, bit-width-exact, every state transition the pair
//! contract performs, so a differential test driver can compare the contract's
//! storage with an independent model after each transaction.
//!
//! # Features
//!
//! - **Fixed-width arithmetic**: uint112/uint128/uint256 checked operations
//!   that fail exactly where the contract's storage would overflow
//! - **Pricing math**: the three-factor constant product, fee floors and
//!   claim/debt formulas for mint, lend and borrow
//! - **Pool ledger**: reserves, supplies, claims and dues per maturity, with
//!   atomic failure
//! - **Pair and factory**: configuration, pool registry and pair creation
//! - **Snapshots**: serde projections with field-by-field diffs and token
//!   balance reconciliation
//!
//! # Quick Start
//!
//! ```rust
//! use pair_sim::{Block, LendParams, MintParams, PairSim, SimConfig};
//! use alloy_primitives::{Address, U256};
//!
//! # fn main() -> Result<(), pair_sim::SimError> {
//! pair_sim::init_tracing();
//!
//! let config = SimConfig::new(Address::repeat_byte(1), Address::repeat_byte(2));
//! let mut sim = PairSim::new(config)?;
//!
//! let lp = Address::repeat_byte(3);
//! let now = 1_000;
//! let maturity = now + 31_536_000;
//! let block = Block::new(now, 1);
//!
//! sim.mint(maturity, lp, lp, &MintParams::new(10_000, 136_192, 10_000), block)?;
//!
//! let state = sim.get_pool(maturity).unwrap().state();
//! let cdp = pair_sim::math::lend::quote_cdp_decrease(
//!     &state,
//!     U256::from(1_000u64),
//!     U256::from(2_000u64),
//!     sim.config().fee,
//!     sim.config().protocol_fee,
//! )?;
//! let mut params = LendParams::new(1_000, 2_000, 0);
//! params.cdp_decrease = cdp;
//!
//! let receipt = sim.lend(maturity, lp, lp, &params, block)?;
//! assert_eq!(receipt.pool.reserves.asset, U256::from(11_000u64));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod error;
pub mod factory;
pub mod math;
pub mod pair;
pub mod params;
pub mod pool;
pub mod snapshot;
pub mod types;
pub mod width;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use factory::PairFactory;
pub use pair::{PairSim, Receipt, TokenBalances};
pub use params::{BorrowParams, BurnParams, LendParams, MintParams, PayParams, WithdrawParams};
pub use pool::Pool;
pub use snapshot::{AccountView, DueView, Mismatch, PoolSnapshot};
pub use types::{Block, Claims, Due, DueId, DueStatus, RateState, Reserves, Tokens};
pub use width::Width;

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
