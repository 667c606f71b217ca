//! # Token Ledger
//!
//! The fungible-token state of one chain: `(asset, account) → amount`.
//! Every contract (vault, hub, entry, gateway escrow, lending pool) holds
//! its tokens here under its own address, exactly like any user.
//!
//! All arithmetic is checked. A debit that would go below zero is an
//! [`LedgerError::InsufficientBalance`], never a wrap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::{Address, AssetId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Attempted to debit more than the available balance.
    #[error("insufficient balance of {asset} for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: AssetId,
        account: Address,
        /// The current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// Arithmetic overflow while crediting. Either a bug or an attack.
    #[error("balance overflow of {asset} for {account}: current {current}, credit {credit}")]
    Overflow {
        asset: AssetId,
        account: Address,
        current: u64,
        credit: u64,
    },
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// Balances of every asset on one chain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    balances: BTreeMap<(AssetId, Address), u64>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance, zero for accounts never touched.
    pub fn balance_of(&self, asset: &AssetId, account: &Address) -> u64 {
        self.balances.get(&(*asset, *account)).copied().unwrap_or(0)
    }

    /// Creates `amount` new units in `account`.
    pub fn mint(&mut self, asset: &AssetId, account: &Address, amount: u64) -> Result<(), LedgerError> {
        let current = self.balance_of(asset, account);
        let updated = current.checked_add(amount).ok_or(LedgerError::Overflow {
            asset: *asset,
            account: *account,
            current,
            credit: amount,
        })?;
        self.set(asset, account, updated);
        Ok(())
    }

    /// Destroys `amount` units held by `account`.
    pub fn burn(&mut self, asset: &AssetId, account: &Address, amount: u64) -> Result<(), LedgerError> {
        let current = self.balance_of(asset, account);
        let updated = current
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                asset: *asset,
                account: *account,
                available: current,
                requested: amount,
            })?;
        self.set(asset, account, updated);
        Ok(())
    }

    /// Moves `amount` from `from` to `to`. A zero transfer and a
    /// self-transfer are both no-ops that still check the balance.
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: *asset,
                account: *from,
                available,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let receiving = self.balance_of(asset, to);
        if receiving.checked_add(amount).is_none() {
            return Err(LedgerError::Overflow {
                asset: *asset,
                account: *to,
                current: receiving,
                credit: amount,
            });
        }
        self.burn(asset, from, amount)?;
        self.mint(asset, to, amount)
    }

    /// Total supply of `asset` on this chain.
    pub fn supply_of(&self, asset: &AssetId) -> u128 {
        self.balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .map(|(_, amount)| *amount as u128)
            .sum()
    }

    /// Every non-zero balance held by `account`.
    pub fn holdings(&self, account: &Address) -> Vec<(AssetId, u64)> {
        self.balances
            .iter()
            .filter(|((_, holder), _)| holder == account)
            .map(|((asset, _), amount)| (*asset, *amount))
            .collect()
    }

    fn set(&mut self, asset: &AssetId, account: &Address, amount: u64) {
        if amount == 0 {
            self.balances.remove(&(*asset, *account));
        } else {
            self.balances.insert((*asset, *account), amount);
        }
    }
}
