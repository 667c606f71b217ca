//! # Routing Registry
//!
//! The Hub's configuration store: which vault serves a
//! `(chain, protocol, asset)` key, which Entry speaks for each chain, and
//! which hub-side asset represents each chain's stable coin.
//!
//! Writes never delete, they overwrite. Every write bumps `version`, so a
//! caller can tell whether the routing it read earlier is still current.
//! A missing entry is a routing failure, never an implicit default.
//!
//! Every Entry ever registered for a chain is remembered: legs it sent
//! before being replaced can still fail back to the Hub.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use nexus_protocol::types::{Address, AssetId, ChainId, VaultKey};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no vault registered for {0}")]
    VaultNotRegistered(VaultKey),

    #[error("no entry registered for chain {0}")]
    EntryNotRegistered(ChainId),

    #[error("no target asset configured for chain {0}")]
    TargetAssetNotSet(ChainId),

    #[error("refusing to register the zero address")]
    ZeroAddress,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoutingRegistry {
    version: u64,
    vaults: BTreeMap<VaultKey, Address>,
    entries: BTreeMap<ChainId, Address>,
    entry_history: BTreeMap<ChainId, BTreeSet<Address>>,
    target_assets: BTreeMap<ChainId, AssetId>,
}

impl RoutingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented on every successful write.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_vault(&mut self, key: VaultKey, vault: Address) -> Result<u64, RegistryError> {
        if vault.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.vaults.insert(key, vault);
        Ok(self.bump())
    }

    pub fn set_entry(&mut self, chain: ChainId, entry: Address) -> Result<u64, RegistryError> {
        if entry.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.entries.insert(chain, entry);
        self.entry_history.entry(chain).or_default().insert(entry);
        Ok(self.bump())
    }

    pub fn set_target_asset(&mut self, chain: ChainId, asset: AssetId) -> Result<u64, RegistryError> {
        if asset.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.target_assets.insert(chain, asset);
        Ok(self.bump())
    }

    pub fn vault(&self, key: &VaultKey) -> Result<Address, RegistryError> {
        self.vaults
            .get(key)
            .copied()
            .ok_or(RegistryError::VaultNotRegistered(*key))
    }

    pub fn entry(&self, chain: ChainId) -> Result<Address, RegistryError> {
        self.entries
            .get(&chain)
            .copied()
            .ok_or(RegistryError::EntryNotRegistered(chain))
    }

    pub fn target_asset(&self, chain: ChainId) -> Result<AssetId, RegistryError> {
        self.target_assets
            .get(&chain)
            .copied()
            .ok_or(RegistryError::TargetAssetNotSet(chain))
    }

    /// `true` when `sender` is the registered Entry for `chain`.
    pub fn is_entry(&self, chain: ChainId, sender: &Address) -> bool {
        self.entries.get(&chain) == Some(sender)
    }

    /// `true` when `sender` is or ever was the Entry for `chain`.
    pub fn was_entry(&self, chain: ChainId, sender: &Address) -> bool {
        self.entry_history
            .get(&chain)
            .is_some_and(|known| known.contains(sender))
    }

    pub fn vaults(&self) -> impl Iterator<Item = (&VaultKey, &Address)> {
        self.vaults.iter()
    }

    fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}
