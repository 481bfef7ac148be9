//! Pair registry mirroring the factory contract.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::pair::PairSim;
use alloy_primitives::Address;
use std::collections::BTreeMap;
use tracing::info;

/// Creates pairs and remembers them by token pair
#[derive(Debug, Clone)]
pub struct PairFactory {
    address: Address,
    owner: Address,
    fee: u16,
    protocol_fee: u16,
    pairs: BTreeMap<(Address, Address), PairSim>,
}

impl PairFactory {
    /// Create a factory. The owner becomes the protocol owner of every pair.
    pub fn new(address: Address, owner: Address, fee: u16, protocol_fee: u16) -> Result<Self> {
        if owner == Address::ZERO {
            return Err(SimError::ZeroAddress);
        }
        Ok(Self {
            address,
            owner,
            fee,
            protocol_fee,
            pairs: BTreeMap::new(),
        })
    }

    /// Factory address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Protocol owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Number of pairs created
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair has been created
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Create the pair for `asset` and `collateral` deployed at `pair`
    pub fn create_pair(
        &mut self,
        asset: Address,
        collateral: Address,
        pair: Address,
    ) -> Result<&mut PairSim> {
        if asset == collateral {
            return Err(SimError::Identical);
        }
        if asset == Address::ZERO || collateral == Address::ZERO {
            return Err(SimError::ZeroAddress);
        }
        if self.pairs.contains_key(&(asset, collateral)) {
            return Err(SimError::PairExists);
        }

        let config = SimConfig::new(asset, collateral)
            .with_fee(self.fee)
            .with_protocol_fee(self.protocol_fee)
            .with_contract(pair)
            .with_factory(self.address)
            .with_owner(self.owner);
        let sim = PairSim::new(config)?;
        info!("Created pair {} for {}/{}", pair, asset, collateral);
        Ok(self.pairs.entry((asset, collateral)).or_insert(sim))
    }

    /// Pair for `asset` and `collateral`, if created
    pub fn get_pair(&self, asset: Address, collateral: Address) -> Option<&PairSim> {
        self.pairs.get(&(asset, collateral))
    }

    /// Mutable pair for `asset` and `collateral`, if created
    pub fn get_pair_mut(&mut self, asset: Address, collateral: Address) -> Option<&mut PairSim> {
        self.pairs.get_mut(&(asset, collateral))
    }
}
