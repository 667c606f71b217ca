//! # Access Control
//!
//! Owner, guardians and the two independent pause switches shared by the
//! Hub, every Entry and every Vault.
//!
//! Each direction (deposit, withdraw) is its own two-state machine:
//! **Active → Paused** by a guardian (or the owner), **Paused → Active** by
//! the owner only. Pausing one direction never blocks the other, and never
//! blocks admin calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

use nexus_protocol::types::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("{caller} is neither a guardian nor the owner")]
    NotGuardian { caller: Address },

    #[error("{0} is paused")]
    Paused(Direction),

    #[error("new owner must not be the zero address")]
    ZeroOwner,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two independently pausable entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Deposit,
    Withdraw,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Deposit => write!(f, "deposit"),
            Direction::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// Whether one direction is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseState {
    #[default]
    Active,
    Paused,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    guardians: BTreeSet<Address>,
    deposit: PauseState,
    withdraw: PauseState,
}

impl AccessControl {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            guardians: BTreeSet::new(),
            deposit: PauseState::Active,
            withdraw: PauseState::Active,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_guardian(&self, account: &Address) -> bool {
        self.guardians.contains(account)
    }

    pub fn only_owner(&self, caller: &Address) -> Result<(), AccessError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(AccessError::NotOwner { caller: *caller })
        }
    }

    /// Fails with [`AccessError::Paused`] when `direction` is paused.
    pub fn ensure_active(&self, direction: Direction) -> Result<(), AccessError> {
        match self.state(direction) {
            PauseState::Active => Ok(()),
            PauseState::Paused => Err(AccessError::Paused(direction)),
        }
    }

    pub fn state(&self, direction: Direction) -> PauseState {
        match direction {
            Direction::Deposit => self.deposit,
            Direction::Withdraw => self.withdraw,
        }
    }

    pub fn is_paused(&self, direction: Direction) -> bool {
        self.state(direction) == PauseState::Paused
    }

    /// `true` only when both directions are paused.
    pub fn fully_paused(&self) -> bool {
        self.is_paused(Direction::Deposit) && self.is_paused(Direction::Withdraw)
    }

    pub fn pause(&mut self, caller: &Address, direction: Direction) -> Result<(), AccessError> {
        if *caller != self.owner && !self.is_guardian(caller) {
            return Err(AccessError::NotGuardian { caller: *caller });
        }
        self.set(direction, PauseState::Paused);
        info!(%caller, %direction, "paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address, direction: Direction) -> Result<(), AccessError> {
        self.only_owner(caller)?;
        self.set(direction, PauseState::Active);
        info!(%caller, %direction, "unpaused");
        Ok(())
    }

    pub fn set_guardian(&mut self, caller: &Address, guardian: Address, enabled: bool) -> Result<(), AccessError> {
        self.only_owner(caller)?;
        if enabled {
            self.guardians.insert(guardian);
        } else {
            self.guardians.remove(&guardian);
        }
        info!(%guardian, enabled, "guardian updated");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), AccessError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AccessError::ZeroOwner);
        }
        info!(previous = %self.owner, %new_owner, "ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    fn set(&mut self, direction: Direction, state: PauseState) {
        match direction {
            Direction::Deposit => self.deposit = state,
            Direction::Withdraw => self.withdraw = state,
        }
    }
}
