//! # Cryptographic Primitives for Nexus
//!
//! Everything that authorizes value movement without the owner being the
//! caller goes through here: account keys, domain-separated digests, the
//! signed intents built on top of them, and signer verification that works
//! for both plain keys and contract wallets.
//!
//! - **Ed25519** for account keys and signatures.
//! - **SHA-256** for digests and address derivation.
//!
//! Nothing in here is novel. It is a thin, typed layer over audited crates.

pub mod hash;
pub mod intents;
pub mod keys;
pub mod signatures;

pub use hash::{domain_digest, sha256_array};
pub use intents::{PermitIntent, RefundClaimIntent, WithdrawIntent};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
pub use signatures::{verify_signer, MultisigWallet, SignatureError, SignatureValidator, WalletRegistry};
