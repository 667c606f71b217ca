//! # Yield Source
//!
//! The external lending market a vault parks its principal in. The vault
//! only needs four things from it: supply, withdraw, the current balance of
//! its position, and which asset the market takes. That is the
//! [`YieldSource`] trait.
//!
//! [`LendingPool`] is a single-asset market that keeps per-owner positions
//! and holds the underlying tokens under its own address. Interest is
//! injected explicitly with [`LendingPool::accrue_interest`], which is how
//! tests and the devnet simulate yield.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::ledger::{LedgerError, TokenLedger};
use crate::types::{Address, AssetId};

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("position of {owner} holds {available}, requested {requested}")]
    InsufficientPosition {
        owner: Address,
        available: u64,
        requested: u64,
    },

    #[error("position overflow for {0}")]
    Overflow(Address),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// An external market the vault supplies into.
pub trait YieldSource {
    /// The underlying asset.
    fn asset(&self) -> AssetId;

    /// Moves `amount` from `owner` into the market and credits its position.
    fn supply(&mut self, tokens: &mut TokenLedger, owner: &Address, amount: u64) -> Result<(), LendingError>;

    /// Debits `owner`'s position and pays `amount` to `to`.
    fn withdraw(
        &mut self,
        tokens: &mut TokenLedger,
        owner: &Address,
        amount: u64,
        to: &Address,
    ) -> Result<u64, LendingError>;

    /// Current value of `owner`'s position, interest included.
    fn balance_of(&self, owner: &Address) -> u64;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LendingPool {
    address: Address,
    asset: AssetId,
    positions: BTreeMap<Address, u64>,
}

impl LendingPool {
    pub fn new(address: Address, asset: AssetId) -> Self {
        Self {
            address,
            asset,
            positions: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sum of all positions.
    pub fn total_supplied(&self) -> u64 {
        self.positions.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Grows `owner`'s position by `amount`, minting the backing tokens to
    /// the pool.
    pub fn accrue_interest(
        &mut self,
        tokens: &mut TokenLedger,
        owner: &Address,
        amount: u64,
    ) -> Result<(), LendingError> {
        let position = self.positions.get(owner).copied().unwrap_or(0);
        let updated = position
            .checked_add(amount)
            .ok_or(LendingError::Overflow(*owner))?;
        tokens.mint(&self.asset, &self.address, amount)?;
        self.positions.insert(*owner, updated);
        debug!(pool = %self.address, %owner, amount, "interest accrued");
        Ok(())
    }

    /// Shrinks `owner`'s position by `amount` (bad debt), burning the
    /// backing tokens.
    pub fn realize_loss(
        &mut self,
        tokens: &mut TokenLedger,
        owner: &Address,
        amount: u64,
    ) -> Result<(), LendingError> {
        let position = self.positions.get(owner).copied().unwrap_or(0);
        let updated = position
            .checked_sub(amount)
            .ok_or(LendingError::InsufficientPosition {
                owner: *owner,
                available: position,
                requested: amount,
            })?;
        tokens.burn(&self.asset, &self.address, amount)?;
        self.set_position(owner, updated);
        Ok(())
    }

    fn set_position(&mut self, owner: &Address, amount: u64) {
        if amount == 0 {
            self.positions.remove(owner);
        } else {
            self.positions.insert(*owner, amount);
        }
    }
}

impl YieldSource for LendingPool {
    fn asset(&self) -> AssetId {
        self.asset
    }

    fn supply(&mut self, tokens: &mut TokenLedger, owner: &Address, amount: u64) -> Result<(), LendingError> {
        let position = self.positions.get(owner).copied().unwrap_or(0);
        let updated = position
            .checked_add(amount)
            .ok_or(LendingError::Overflow(*owner))?;
        tokens.transfer(&self.asset, owner, &self.address, amount)?;
        self.set_position(owner, updated);
        Ok(())
    }

    fn withdraw(
        &mut self,
        tokens: &mut TokenLedger,
        owner: &Address,
        amount: u64,
        to: &Address,
    ) -> Result<u64, LendingError> {
        let position = self.positions.get(owner).copied().unwrap_or(0);
        let updated = position
            .checked_sub(amount)
            .ok_or(LendingError::InsufficientPosition {
                owner: *owner,
                available: position,
                requested: amount,
            })?;
        tokens.transfer(&self.asset, &self.address, to, amount)?;
        self.set_position(owner, updated);
        Ok(amount)
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.positions.get(owner).copied().unwrap_or(0)
    }
}
