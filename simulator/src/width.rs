//! Fixed-width checked arithmetic.
//!
//! Values are carried as [`U256`] but every stored quantity has a nominal
//! width matching the contract's storage slot. The helpers here fail with
//! [`SimError::Overflow`] exactly when the contract's checked arithmetic would
//! revert, not when `U256` itself would wrap.

use crate::error::{Result, SimError};
use alloy_primitives::{U256, U512};

/// Nominal bit width of a stored quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Invariant factors (`state.asset`, `state.interest`, `state.cdp`)
    U112,
    /// Reserves, claims and due amounts
    U128,
    /// Liquidity and cumulative debt
    U256,
}

impl Width {
    /// Number of bits in this width
    pub const fn bits(self) -> usize {
        match self {
            Width::U112 => 112,
            Width::U128 => 128,
            Width::U256 => 256,
        }
    }

    /// Largest value representable in this width
    pub fn max(self) -> U256 {
        match self {
            Width::U256 => U256::MAX,
            w => (U256::from(1u64) << w.bits()) - U256::from(1u64),
        }
    }

    /// Whether `value` fits in this width
    pub fn fits(self, value: U256) -> bool {
        value.bit_len() <= self.bits()
    }

    /// Return `value` unchanged if it fits, otherwise an overflow error
    pub fn check(self, value: U256) -> Result<U256> {
        if self.fits(value) {
            Ok(value)
        } else {
            Err(self.overflow())
        }
    }

    fn overflow(self) -> SimError {
        SimError::Overflow {
            width: self.bits() as u16,
        }
    }
}

/// `a + b`, failing when the sum does not fit `width`
pub fn checked_add(a: U256, b: U256, width: Width) -> Result<U256> {
    let sum = a.checked_add(b).ok_or(width.overflow())?;
    width.check(sum)
}

/// `a - b`, failing on underflow
pub fn checked_sub(a: U256, b: U256, width: Width) -> Result<U256> {
    let diff = a.checked_sub(b).ok_or(width.overflow())?;
    width.check(diff)
}

/// `a * b`, failing when the product does not fit `width`
pub fn checked_mul(a: U256, b: U256, width: Width) -> Result<U256> {
    let product = a.checked_mul(b).ok_or(width.overflow())?;
    width.check(product)
}

/// `a << bits`, failing when set bits are shifted past `width`
pub fn checked_shl(a: U256, bits: usize, width: Width) -> Result<U256> {
    let shifted = a.checked_shl(bits).ok_or(width.overflow())?;
    width.check(shifted)
}

/// Widen a 256-bit value into 512 bits
pub fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

/// Narrow a 512-bit value to `width`
pub fn narrow(value: U512, width: Width) -> Result<U256> {
    if value.bit_len() > width.bits() {
        return Err(width.overflow());
    }
    let l = value.as_limbs();
    Ok(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// `floor(a * b / denominator)` with a 512-bit intermediate
pub fn mul_div(a: U256, b: U256, denominator: U256, width: Width) -> Result<U256> {
    if denominator.is_zero() {
        return Err(SimError::Invalid("division by zero".to_string()));
    }
    narrow(widen(a) * widen(b) / widen(denominator), width)
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate
pub fn mul_div_up(a: U256, b: U256, denominator: U256, width: Width) -> Result<U256> {
    if denominator.is_zero() {
        return Err(SimError::Invalid("division by zero".to_string()));
    }
    narrow(div_up(widen(a) * widen(b), widen(denominator)), width)
}

/// `ceil(numerator / denominator)` in 512 bits. `denominator` must be nonzero.
pub fn div_up(numerator: U512, denominator: U512) -> U512 {
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        quotient
    } else {
        quotient + U512::from(1u64)
    }
}
