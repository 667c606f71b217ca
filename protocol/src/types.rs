//! # Identifiers
//!
//! The handful of strongly-typed identifiers every other module passes
//! around: chains, accounts, assets, protocols, vault keys and dispatch
//! handles. Keeping them as newtypes means a chain id can never be handed
//! to something expecting a protocol id, which is exactly the kind of bug
//! that only shows up once money is already on the wrong chain.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::crypto::hash::sha256_array;

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// Numeric identifier of a chain (EIP-155 style).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account or contract address.
///
/// For externally-owned accounts the address *is* the ed25519 public key,
/// so a signature can be checked against the address without any lookup.
/// Contract addresses are derived from a label via [`Address::derive`].
///
/// Serializes as a `0x`-prefixed hex string in human-readable formats
/// (JSON) and as 32 raw bytes in binary formats (the wire codec).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 32]);

/// Errors produced when parsing an [`Address`] from text.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid hex in address: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("address must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl Address {
    /// The all-zero address. Used as "no address" in configuration.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Deterministically derives an address from a human label.
    ///
    /// `SHA-256("nexus/address" || 0x00 || label)`. Used for contracts,
    /// assets and devnet accounts that have no key of their own.
    pub fn derive(label: &str) -> Self {
        let mut preimage = Vec::with_capacity(label.len() + 16);
        preimage.extend_from_slice(b"nexus/address");
        preimage.push(0x00);
        preimage.extend_from_slice(label.as_bytes());
        Self(sha256_array(&preimage))
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses hex with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)?;
        if bytes.len() != 32 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` for [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Address)
        }
    }
}

/// Assets are identified by the address of their token contract on the
/// chain where they live. The same stablecoin on two chains has two ids.
pub type AssetId = Address;

// ---------------------------------------------------------------------------
// ProtocolId / VaultKey
// ---------------------------------------------------------------------------

/// Identifier of a yield protocol (lending market family) a vault uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolId(pub u32);

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol#{}", self.0)
    }
}

/// The routing key of a vault: which chain, which protocol, which asset.
///
/// `asset` is the hub-side representation of the chain's stable asset,
/// because the hub is the only party that resolves keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VaultKey {
    pub chain: ChainId,
    pub protocol: ProtocolId,
    pub asset: AssetId,
}

impl VaultKey {
    pub fn new(chain: ChainId, protocol: ProtocolId, asset: AssetId) -> Self {
        Self {
            chain,
            protocol,
            asset,
        }
    }
}

impl fmt::Display for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.chain, self.protocol, self.asset)
    }
}

// ---------------------------------------------------------------------------
// DispatchId
// ---------------------------------------------------------------------------

/// Handle of one outbound cross-chain leg. Assigned by the dispatching
/// contract and echoed back by the transport in every callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DispatchId(pub Uuid);

impl DispatchId {
    /// A fresh random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
