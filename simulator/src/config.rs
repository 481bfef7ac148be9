//! Pair configuration.
//!
//! A [`SimConfig`] carries everything that is fixed when the pair contract is
//! deployed: the token pair, the fee rates and the addresses of the pair, its
//! factory and the protocol owner. It can be built in code with the `with_*`
//! setters or loaded from a TOML file shared with the test driver.

use crate::error::{Result, SimError};
use crate::math::FEE_BASE;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default liquidity provider fee, out of `0x10000`
pub const DEFAULT_FEE: u16 = 100;

/// Default protocol fee, out of `0x10000`
pub const DEFAULT_PROTOCOL_FEE: u16 = 50;

/// Configuration of a simulated pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Asset token
    pub asset: Address,

    /// Collateral token
    pub collateral: Address,

    /// Liquidity provider fee, out of `0x10000`
    #[serde(default = "default_fee")]
    pub fee: u16,

    /// Protocol fee, out of `0x10000`
    #[serde(default = "default_protocol_fee")]
    pub protocol_fee: u16,

    /// Address of the pair contract holding the tokens
    #[serde(default)]
    pub contract: Address,

    /// Address of the factory that created the pair
    #[serde(default)]
    pub factory: Address,

    /// Account allowed to collect the protocol fee
    #[serde(default)]
    pub owner: Address,
}

fn default_fee() -> u16 {
    DEFAULT_FEE
}

fn default_protocol_fee() -> u16 {
    DEFAULT_PROTOCOL_FEE
}

impl SimConfig {
    /// Create a configuration for a token pair with default fees
    pub fn new(asset: Address, collateral: Address) -> Self {
        Self {
            asset,
            collateral,
            fee: DEFAULT_FEE,
            protocol_fee: DEFAULT_PROTOCOL_FEE,
            contract: Address::ZERO,
            factory: Address::ZERO,
            owner: Address::ZERO,
        }
    }

    /// Set the liquidity provider fee
    pub fn with_fee(mut self, fee: u16) -> Self {
        self.fee = fee;
        self
    }

    /// Set the protocol fee
    pub fn with_protocol_fee(mut self, protocol_fee: u16) -> Self {
        self.protocol_fee = protocol_fee;
        self
    }

    /// Set the pair contract address
    pub fn with_contract(mut self, contract: Address) -> Self {
        self.contract = contract;
        self
    }

    /// Set the factory address
    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = factory;
        self
    }

    /// Set the protocol owner
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = owner;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.asset == self.collateral {
            return Err(SimError::Identical);
        }
        if self.asset == Address::ZERO || self.collateral == Address::ZERO {
            return Err(SimError::ZeroAddress);
        }
        if self.fee as u64 + self.protocol_fee as u64 >= FEE_BASE {
            return Err(SimError::Config(
                "Combined fees must be below 0x10000".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)
            .map_err(|e| SimError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SimError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }
}
