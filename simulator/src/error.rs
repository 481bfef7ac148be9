//! Error types for the pair simulator.
//!
//! Every failure the live contract can revert with has a counterpart here, so a
//! differential test can check that the simulator and the contract fail on the
//! same inputs. Failures are atomic: a pool is never left half-updated.

use thiserror::Error;

/// Main error type for simulated pair operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A required positive amount was zero
    #[error("Amount must be greater than zero")]
    Zero,

    /// A value exceeded its nominal fixed width
    #[error("Overflow: value exceeds uint{width}")]
    Overflow {
        /// Bit width of the storage slot that overflowed
        width: u16,
    },

    /// The interest change is below the fee floor
    #[error("Interest change below minimum: required {minimum}, got {actual}")]
    InterestTooLow {
        /// Minimum interest change accepted
        minimum: String,
        /// Interest change supplied
        actual: String,
    },

    /// A structural precondition failed
    #[error("Invalid: {0}")]
    Invalid(String),

    /// Claim, liquidity or due balance too small
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Withdraw attempted before maturity
    #[error("Pool has not matured")]
    NotMatured,

    /// Mint, lend or borrow attempted at or after maturity
    #[error("Pool has matured")]
    Expired,

    /// Caller is not allowed to perform the operation
    #[error("Forbidden")]
    Forbidden,

    /// The product check failed after an operation. Fatal for quoted
    /// parameters, an ordinary revert for hand-picked ones.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// No pool exists at the given maturity
    #[error("No pool at maturity {0}")]
    PoolNotFound(u64),

    /// Asset and collateral tokens are the same
    #[error("Identical asset and collateral")]
    Identical,

    /// A required address is the zero address
    #[error("Zero address")]
    ZeroAddress,

    /// A pair for the token combination already exists
    #[error("Pair already exists")]
    PairExists,

    /// Simulated holdings disagree with the observed token balance
    #[error("Balance mismatch for {token}: expected {expected}, observed {observed}")]
    BalanceMismatch {
        /// Token whose balance disagrees
        token: String,
        /// Balance implied by the simulated pools
        expected: String,
        /// Balance reported by the provider
        observed: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl SimError {
    /// Whether the error signals a modelling bug rather than a rejected input.
    ///
    /// This holds only for lend and borrow parameters built with the quote
    /// helpers. A caller-chosen cdp change that fails the product check also
    /// reports [`SimError::InvariantViolation`]; the contract reverts on the
    /// same input, so a driver cross-checking reverts should compare it like
    /// any other rejection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::InvariantViolation(_))
    }
}

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
