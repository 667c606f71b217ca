// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Nexus Protocol — Core Library
//!
//! The shared vocabulary of the Nexus cross-chain vault system: the types
//! that cross chain boundaries and the collaborators the contracts lean on
//! but do not own.
//!
//! A user on any chain deposits a stable asset into a vault that may live on
//! a different chain, and later withdraws to any chain. Everything routes
//! through a single hub. The contracts that do that live in
//! `nexus-contracts`; this crate gives them something to stand on.
//!
//! ## Architecture
//!
//! - **types** — Chain ids, addresses, vault keys, dispatch handles.
//! - **config** — Protocol constants: wire tags, fee bounds, signature domains.
//! - **crypto** — Ed25519 keys, domain-separated digests, signed intents,
//!   EOA and contract-wallet signature checks.
//! - **wire** — The tagged message format and compensation payloads.
//! - **ledger** — Per-chain fungible token balances.
//! - **transport** — The cross-chain call primitive and its per-chain gateway.
//! - **swap** — Asset normalization and gas purchase.
//! - **lending** — The external yield source vaults supply into.
//!
//! ## Design Philosophy
//!
//! 1. Money math is checked. Always. `u128` for every mul-div.
//! 2. Bytes on the wire decode into exactly one typed value or an error.
//! 3. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod ledger;
pub mod lending;
pub mod swap;
pub mod transport;
pub mod types;
pub mod wire;

pub use types::{Address, AssetId, ChainId, DispatchId, ProtocolId, VaultKey};
