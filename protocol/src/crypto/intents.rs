//! # Signed Intents
//!
//! The three things a user can authorize off-chain and hand to somebody
//! else to submit: a vault withdrawal, a permit that lets an Entry pull
//! tokens, and a refund claim paid to an arbitrary recipient.
//!
//! Every intent binds the chain and the verifying contract, a per-signer
//! nonce and a deadline (unix seconds). The digest is computed with
//! [`domain_digest`] under a distinct domain per intent kind.

use serde::{Deserialize, Serialize};

use super::hash::domain_digest;
use super::keys::{Keypair, Signature};
use crate::config::{PERMIT_DOMAIN, REFUND_CLAIM_DOMAIN, WITHDRAW_DOMAIN};
use crate::types::{Address, AssetId, ChainId};

/// Authorization for a vault to burn `shares` of `sender` and pay `receiver`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawIntent {
    /// Chain the vault lives on.
    pub chain: ChainId,
    /// The vault contract.
    pub vault: Address,
    /// Share owner and signer.
    pub sender: Address,
    pub receiver: Address,
    pub shares: u64,
    /// Chain the payout should land on.
    pub destination_chain: ChainId,
    pub nonce: u64,
    /// Unix seconds. Valid up to and including this second.
    pub deadline: i64,
}

impl WithdrawIntent {
    pub fn digest(&self) -> Result<[u8; 32], bincode::Error> {
        domain_digest(WITHDRAW_DOMAIN, self)
    }

    pub fn sign(&self, keypair: &Keypair) -> Result<Signature, bincode::Error> {
        Ok(keypair.sign(&self.digest()?))
    }
}

/// Lets `spender` (an Entry) move `amount` of `asset` out of `owner`'s
/// balance exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitIntent {
    pub owner: Address,
    pub spender: Address,
    pub asset: AssetId,
    pub amount: u64,
    pub nonce: u64,
    pub deadline: i64,
    pub chain: ChainId,
}

impl PermitIntent {
    pub fn digest(&self) -> Result<[u8; 32], bincode::Error> {
        domain_digest(PERMIT_DOMAIN, self)
    }

    pub fn sign(&self, keypair: &Keypair) -> Result<Signature, bincode::Error> {
        Ok(keypair.sign(&self.digest()?))
    }
}

/// Lets a relayer drain `owner`'s refund-ledger entry for `asset` to
/// `recipient`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundClaimIntent {
    /// The hub contract holding the ledger.
    pub hub: Address,
    pub owner: Address,
    pub asset: AssetId,
    pub recipient: Address,
    pub nonce: u64,
    pub deadline: i64,
}

impl RefundClaimIntent {
    pub fn digest(&self) -> Result<[u8; 32], bincode::Error> {
        domain_digest(REFUND_CLAIM_DOMAIN, self)
    }

    pub fn sign(&self, keypair: &Keypair) -> Result<Signature, bincode::Error> {
        Ok(keypair.sign(&self.digest()?))
    }
}
