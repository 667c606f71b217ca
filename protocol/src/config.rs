//! # Protocol Configuration & Constants
//!
//! Every magic number in Nexus lives here: operation tags, fee bounds,
//! signature domains and the chain ids of the local devnet. The wire tags
//! in particular are part of the cross-chain message format, so changing
//! one after deployment strands every in-flight message that uses it.

use crate::types::ChainId;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the protocol crate.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Wire Operation Tags
// ---------------------------------------------------------------------------

/// First byte of a deposit message.
pub const OP_DEPOSIT: u8 = 0x01;

/// First byte of a withdrawal message.
pub const OP_WITHDRAW: u8 = 0x02;

/// First byte of a vault-originated callback (withdrawal payout in flight).
pub const OP_CALLBACK: u8 = 0x03;

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Basis-point denominator. 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Highest performance fee a vault owner may configure: 50%.
pub const MAX_FEE_BPS: u16 = 5_000;

// ---------------------------------------------------------------------------
// Signature Domains
// ---------------------------------------------------------------------------

/// Domain tag for signature-authorized vault withdrawals.
pub const WITHDRAW_DOMAIN: &[u8] = b"NEXUS/VAULT_WITHDRAW/v1";

/// Domain tag for delegated (permit-style) token transfers into an Entry.
pub const PERMIT_DOMAIN: &[u8] = b"NEXUS/ENTRY_PERMIT/v1";

/// Domain tag for relayed refund claims against the hub's refund ledger.
pub const REFUND_CLAIM_DOMAIN: &[u8] = b"NEXUS/REFUND_CLAIM/v1";

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Gas limit used for outbound legs when the caller leaves it at zero.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// Safety valve for the local network harness: the most deliveries a single
/// `deliver_all` call will process before assuming a routing loop.
pub const MAX_DELIVERIES_PER_FLUSH: usize = 1_024;

// ---------------------------------------------------------------------------
// Devnet Chains
// ---------------------------------------------------------------------------

/// The coordinating chain that hosts the hub.
pub const DEVNET_HUB_CHAIN: ChainId = ChainId(7000);

/// An EVM-style spoke chain.
pub const DEVNET_ETHEREUM: ChainId = ChainId(1);

/// A second spoke chain.
pub const DEVNET_BSC: ChainId = ChainId(56);

/// Returns a friendly name for a chain id, mainly for logging.
pub fn chain_name(chain: ChainId) -> String {
    match chain {
        DEVNET_HUB_CHAIN => "hub".to_string(),
        DEVNET_ETHEREUM => "ethereum".to_string(),
        DEVNET_BSC => "bsc".to_string(),
        other => format!("chain-{}", other.0),
    }
}
