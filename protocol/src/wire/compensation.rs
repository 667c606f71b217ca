//! # Compensation Payloads
//!
//! Every outbound leg carries an opaque `revert_message` that the transport
//! hands back verbatim on revert or abort. We put a [`CompensationPayload`]
//! in it: just enough of the original call to know whom to refund.
//!
//! The variant says who built it. A Hub-originated leg records the account
//! to refund and the chain the request came from (a refund on the hub's own
//! chain can be paid directly). An Entry-originated leg only records the
//! original sender.

use serde::{Deserialize, Serialize};

use super::codec;
use super::error::CodecError;
use super::message::Operation;
use crate::types::{Address, ChainId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompensationPayload {
    /// Built by the Hub when it dispatches toward a vault or a receiver.
    Hub {
        /// Account that gets the principal back if the leg fails.
        refund_to: Address,
        /// Chain the request originally came from.
        origin_chain: ChainId,
        operation: Operation,
    },
    /// Built by an Entry when it forwards to the Hub.
    Entry { sender: Address, operation: Operation },
}

impl CompensationPayload {
    pub fn operation(&self) -> Operation {
        match self {
            CompensationPayload::Hub { operation, .. } => *operation,
            CompensationPayload::Entry { operation, .. } => *operation,
        }
    }

    /// The account a failed leg is ultimately refunded to.
    pub fn refund_target(&self) -> Address {
        match self {
            CompensationPayload::Hub { refund_to, .. } => *refund_to,
            CompensationPayload::Entry { sender, .. } => *sender,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::to_bytes(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Empty);
        }
        codec::from_bytes(bytes).map_err(|e| CodecError::Malformed {
            what: "compensation",
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_refund_target() {
        let hub = CompensationPayload::Hub {
            refund_to: Address::derive("bob"),
            origin_chain: ChainId(56),
            operation: Operation::Callback,
        };
        let decoded = CompensationPayload::decode(&hub.encode().unwrap()).unwrap();
        assert_eq!(decoded, hub);
        assert_eq!(decoded.refund_target(), Address::derive("bob"));

        let entry = CompensationPayload::Entry {
            sender: Address::derive("alice"),
            operation: Operation::Deposit,
        };
        assert_eq!(entry.refund_target(), Address::derive("alice"));
        assert_eq!(entry.operation(), Operation::Deposit);
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            CompensationPayload::decode(&[9, 9, 9]),
            Err(CodecError::Malformed { what: "compensation", .. })
        ));
        assert!(matches!(CompensationPayload::decode(&[]), Err(CodecError::Empty)));
    }
}
