//! # Refund Ledger
//!
//! `(owner, asset) → outstanding` for every failed leg whose value could
//! not be returned synchronously. Entries are created on first credit,
//! only ever incremented by compensation, and removed whole on claim.
//!
//! The Hub holds the tokens backing every entry; the ledger itself is just
//! the book of who may pull them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use nexus_protocol::types::{Address, AssetId};

#[derive(Debug, Error)]
pub enum RefundError {
    #[error("nothing to claim for {owner} in {asset}")]
    NothingToClaim { owner: Address, asset: AssetId },

    #[error("refund balance overflow for {owner} in {asset}")]
    Overflow { owner: Address, asset: AssetId },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RefundLedger {
    entries: BTreeMap<(Address, AssetId), u64>,
}

impl RefundLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the owner's balance. Returns the new balance.
    pub fn credit(&mut self, owner: Address, asset: AssetId, amount: u64) -> Result<u64, RefundError> {
        if amount == 0 {
            return Ok(self.outstanding(&owner, &asset));
        }
        let entry = self.entries.entry((owner, asset)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(RefundError::Overflow { owner, asset })?;
        Ok(*entry)
    }

    pub fn outstanding(&self, owner: &Address, asset: &AssetId) -> u64 {
        self.entries.get(&(*owner, *asset)).copied().unwrap_or(0)
    }

    /// Removes and returns the whole balance.
    pub fn take(&mut self, owner: &Address, asset: &AssetId) -> Result<u64, RefundError> {
        match self.entries.remove(&(*owner, *asset)) {
            Some(amount) if amount > 0 => Ok(amount),
            _ => Err(RefundError::NothingToClaim {
                owner: *owner,
                asset: *asset,
            }),
        }
    }

    /// Every outstanding balance of `owner`.
    pub fn entries_for(&self, owner: &Address) -> Vec<(AssetId, u64)> {
        self.entries
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|((_, asset), amount)| (*asset, *amount))
            .collect()
    }

    /// Sum of outstanding balances in `asset` across all owners.
    pub fn total_for_asset(&self, asset: &AssetId) -> u128 {
        self.entries
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount as u128)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
