//! # Nexus Contracts
//!
//! The three contracts of the Nexus cross-chain vault system and the
//! in-process network that connects them:
//!
//! - **Entry** — one per chain. Takes deposits and withdrawal requests from
//!   users and forwards them to the Hub, or serves them from a local vault.
//! - **Hub** — one, on the hub chain. Authenticates Entries, normalizes
//!   assets, funds destination gas, routes each leg to the right vault and
//!   turns every failure into a refund.
//! - **Vault** — one per `(chain, protocol, asset)`. Keeps the share
//!   ledger, supplies principal to a lending pool and charges a
//!   performance fee on yield.
//!
//! Around them:
//!
//! - **registry** — the Hub's routing tables.
//! - **refund** / **compensation** — the refund ledger and the per-leg
//!   settlement state machine.
//! - **access** — owner, guardians and per-direction pause switches.
//! - **chain** / **network** — simulated chains and the relayer that
//!   delivers, reverts and aborts legs between them.
//!
//! ## Design Principles
//!
//! 1. Every unit of value has exactly one owner at every step: a user, a
//!    vault position, a gateway escrow, or a refund-ledger entry.
//! 2. A failed call leaves no trace. Each delivery is one transaction.
//! 3. Settlement is terminal. A leg is compensated at most once.

pub mod access;
pub mod chain;
pub mod compensation;
pub mod entry;
pub mod hub;
pub mod network;
pub mod refund;
pub mod registry;
pub mod vault;

pub use chain::{CallOutcome, Chain, ChainError, ChainState};
pub use entry::{Entry, EntryConfig, EntryError, EntryOutcome, Permit};
pub use hub::{Hub, HubConfig, HubError, HubOutcome, RefundClaim};
pub use network::{AssetBridge, DeliveryOutcome, DeliveryReport, Fault, LocalNetwork, NetworkError};
pub use vault::{Payout, Vault, VaultConfig, VaultError, WithdrawAuth, WithdrawReceipt, WithdrawRequest};
