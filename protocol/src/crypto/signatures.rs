//! # Signature Verification
//!
//! Two kinds of signer can authorize an intent:
//!
//! 1. **Externally-owned accounts** — the address is an Ed25519 public key
//!    and the signature is a plain 64-byte detached signature.
//! 2. **Contract wallets** — the address belongs to a contract registered in
//!    the chain's [`WalletRegistry`], and the contract itself decides whether
//!    a signature blob is valid for a digest (the `isValidSignature` pattern).
//!
//! [`verify_signer`] hides the difference: callers hand it an address, a
//! digest and a blob and get back `Ok(())` or a [`SignatureError`]. Errors are
//! intentionally coarse, we don't tell a caller *which* part was wrong.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::keys::{PublicKey, Signature};
use crate::types::Address;

/// Errors during signature operations.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("signer {0} is neither a valid public key nor a registered contract wallet")]
    UnknownSigner(Address),

    #[error("failed to encode signed payload: {0}")]
    Encoding(String),
}

impl From<bincode::Error> for SignatureError {
    fn from(e: bincode::Error) -> Self {
        SignatureError::Encoding(e.to_string())
    }
}

/// Contract-side signature validation.
///
/// Implemented by anything that lives at an address and can vouch for a
/// digest on that address's behalf.
pub trait SignatureValidator {
    /// Returns `true` when `signature` authorizes `digest` for this contract.
    fn is_valid_signature(&self, digest: &[u8; 32], signature: &[u8]) -> bool;
}

/// An m-of-n wallet: the signature blob is the concatenation of 64-byte
/// Ed25519 signatures, each from a distinct registered signer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultisigWallet {
    signers: Vec<PublicKey>,
    threshold: usize,
}

impl MultisigWallet {
    /// Creates a wallet. A threshold of zero or above the signer count can
    /// never be met, which is the safe failure mode for a bad config.
    pub fn new(signers: Vec<PublicKey>, threshold: usize) -> Self {
        Self { signers, threshold }
    }

    /// Concatenates member signatures into the blob this wallet expects.
    pub fn aggregate(signatures: &[Signature]) -> Vec<u8> {
        signatures
            .iter()
            .flat_map(|s| s.as_bytes().iter().copied())
            .collect()
    }
}

impl SignatureValidator for MultisigWallet {
    fn is_valid_signature(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        if self.threshold == 0 || signature.len() % 64 != 0 {
            return false;
        }
        let mut used = vec![false; self.signers.len()];
        let mut approvals = 0usize;
        for chunk in signature.chunks(64) {
            let sig = Signature::from_slice(chunk);
            let matched = self
                .signers
                .iter()
                .enumerate()
                .find(|(i, signer)| !used[*i] && signer.verify(digest, &sig));
            if let Some((i, _)) = matched {
                used[i] = true;
                approvals += 1;
            }
        }
        approvals >= self.threshold
    }
}

/// The contract wallets deployed on one chain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WalletRegistry {
    wallets: BTreeMap<Address, MultisigWallet>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys (or replaces) a contract wallet at `address`.
    pub fn register(&mut self, address: Address, wallet: MultisigWallet) {
        self.wallets.insert(address, wallet);
    }

    /// Returns the wallet at `address`, if it is a contract wallet.
    pub fn get(&self, address: &Address) -> Option<&MultisigWallet> {
        self.wallets.get(address)
    }
}

/// Verifies that `signer` authorized `digest`.
///
/// Contract wallets take precedence: if the address has code, its
/// [`SignatureValidator`] is authoritative. Otherwise the address is treated
/// as an Ed25519 public key.
pub fn verify_signer(
    signer: &Address,
    digest: &[u8; 32],
    signature: &[u8],
    wallets: &WalletRegistry,
) -> Result<(), SignatureError> {
    if let Some(wallet) = wallets.get(signer) {
        return if wallet.is_valid_signature(digest, signature) {
            Ok(())
        } else {
            Err(SignatureError::VerificationFailed)
        };
    }

    let key = PublicKey::from_address(signer).map_err(|_| SignatureError::UnknownSigner(*signer))?;
    if key.verify(digest, &Signature::from_slice(signature)) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}
