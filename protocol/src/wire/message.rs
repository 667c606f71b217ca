//! # Hub Messages
//!
//! The payload a cross-chain leg carries to the Hub (and from the Hub on to
//! a vault). On the wire a message is
//!
//! ```text
//! [tag: u8] ++ bincode(payload)
//! ```
//!
//! with `0x01` deposit, `0x02` withdraw and `0x03` vault-originated callback.
//! In memory it is the [`HubMessage`] sum type, so a handler matches on a
//! typed variant instead of peeking at a byte.

use serde::{Deserialize, Serialize};

use super::codec;
use super::error::CodecError;
use crate::config::{OP_CALLBACK, OP_DEPOSIT, OP_WITHDRAW};
use crate::types::{Address, ChainId, ProtocolId};

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The operation kind carried in the leading tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Operation {
    Deposit = OP_DEPOSIT,
    Withdraw = OP_WITHDRAW,
    Callback = OP_CALLBACK,
}

impl Operation {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Operation {
    type Error = CodecError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            OP_DEPOSIT => Ok(Operation::Deposit),
            OP_WITHDRAW => Ok(Operation::Withdraw),
            OP_CALLBACK => Ok(Operation::Callback),
            other => Err(CodecError::UnknownOperation(other)),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Deposit => write!(f, "deposit"),
            Operation::Withdraw => write!(f, "withdraw"),
            Operation::Callback => write!(f, "callback"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A deposit on its way to a vault.
///
/// `amount` is informational on the Entry→Hub leg (the transport carries
/// the value) and is rewritten to the net amount on the Hub→Vault leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMessage {
    /// Who paid. Refunds go here.
    pub sender: Address,
    pub origin_chain: ChainId,
    pub target_chain: ChainId,
    pub protocol: ProtocolId,
    /// Who receives the shares.
    pub beneficiary: Address,
    pub amount: u64,
    pub gas_limit: u64,
    /// Minimum accepted output of the normalizing swap at the Hub.
    pub min_out: u64,
}

/// The signed half of a relayed withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawAuthorization {
    pub nonce: u64,
    /// Unix seconds.
    pub deadline: i64,
    pub signature: Vec<u8>,
}

/// A withdrawal request travelling to a vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawMessage {
    /// Share owner and signer.
    pub sender: Address,
    pub receiver: Address,
    pub origin_chain: ChainId,
    pub target_chain: ChainId,
    pub destination_chain: ChainId,
    pub protocol: ProtocolId,
    pub shares: u64,
    pub gas_limit: u64,
    pub authorization: WithdrawAuthorization,
}

/// A withdrawal payout pushed by a vault's Entry toward the Hub because its
/// destination is neither the vault's chain nor a direct transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackMessage {
    /// The share owner the payout belongs to.
    pub sender: Address,
    pub receiver: Address,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub amount: u64,
    pub gas_limit: u64,
}

// ---------------------------------------------------------------------------
// HubMessage
// ---------------------------------------------------------------------------

/// A decoded cross-chain message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubMessage {
    Deposit(DepositMessage),
    Withdraw(WithdrawMessage),
    Callback(CallbackMessage),
}

impl HubMessage {
    pub fn operation(&self) -> Operation {
        match self {
            HubMessage::Deposit(_) => Operation::Deposit,
            HubMessage::Withdraw(_) => Operation::Withdraw,
            HubMessage::Callback(_) => Operation::Callback,
        }
    }

    /// Encodes as `[tag] ++ bincode(payload)`.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let body = match self {
            HubMessage::Deposit(m) => codec::to_bytes(m),
            HubMessage::Withdraw(m) => codec::to_bytes(m),
            HubMessage::Callback(m) => codec::to_bytes(m),
        }
        .map_err(|e| CodecError::Encode(e.to_string()))?;

        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(self.operation().tag());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decodes a tagged message. Unknown tags are fatal.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let (&tag, body) = bytes.split_first().ok_or(CodecError::Empty)?;
        let operation = Operation::try_from(tag)?;
        let malformed = |what: &'static str| {
            move |e: bincode::Error| CodecError::Malformed {
                what,
                reason: e.to_string(),
            }
        };
        match operation {
            Operation::Deposit => codec::from_bytes(body)
                .map(HubMessage::Deposit)
                .map_err(malformed("deposit")),
            Operation::Withdraw => codec::from_bytes(body)
                .map(HubMessage::Withdraw)
                .map_err(malformed("withdraw")),
            Operation::Callback => codec::from_bytes(body)
                .map(HubMessage::Callback)
                .map_err(malformed("callback")),
        }
    }
}
