//! Call contexts: what the initiating party fills in before anything is
//! dispatched. Immutable once handed to an Entry or the Hub.

use serde::{Deserialize, Serialize};

use super::message::{
    DepositMessage, Operation, WithdrawAuthorization, WithdrawMessage,
};
use crate::types::{Address, AssetId, ChainId, ProtocolId};

/// Parameters of a deposit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositContext {
    /// Chain hosting the vault.
    pub target_chain: ChainId,
    pub protocol: ProtocolId,
    pub beneficiary: Address,
    /// Asset paid in, as known on the chain where the call is made.
    pub asset: AssetId,
    pub amount: u64,
    /// Gas limit for the leg that reaches the vault. Zero means default.
    pub gas_limit: u64,
    pub min_out: u64,
}

impl DepositContext {
    pub fn to_message(&self, sender: Address, origin_chain: ChainId, gas_limit: u64) -> DepositMessage {
        DepositMessage {
            sender,
            origin_chain,
            target_chain: self.target_chain,
            protocol: self.protocol,
            beneficiary: self.beneficiary,
            amount: self.amount,
            gas_limit,
            min_out: self.min_out,
        }
    }
}

/// Parameters of a withdrawal.
///
/// `gas_amount` of `gas_asset` travels with the request to pay for the
/// Hub→vault leg. Whatever the Hub does not spend is credited back to the
/// sender's refund balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawContext {
    pub target_chain: ChainId,
    pub protocol: ProtocolId,
    pub receiver: Address,
    pub shares: u64,
    pub destination_chain: ChainId,
    pub gas_asset: AssetId,
    pub gas_amount: u64,
    pub gas_limit: u64,
    pub authorization: WithdrawAuthorization,
}

impl WithdrawContext {
    pub fn to_message(&self, sender: Address, origin_chain: ChainId, gas_limit: u64) -> WithdrawMessage {
        WithdrawMessage {
            sender,
            receiver: self.receiver,
            origin_chain,
            target_chain: self.target_chain,
            destination_chain: self.destination_chain,
            protocol: self.protocol,
            shares: self.shares,
            gas_limit,
            authorization: self.authorization.clone(),
        }
    }
}

/// Either kind of user request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallContext {
    Deposit(DepositContext),
    Withdraw(WithdrawContext),
}

impl CallContext {
    pub fn operation(&self) -> Operation {
        match self {
            CallContext::Deposit(_) => Operation::Deposit,
            CallContext::Withdraw(_) => Operation::Withdraw,
        }
    }

    pub fn target_chain(&self) -> ChainId {
        match self {
            CallContext::Deposit(c) => c.target_chain,
            CallContext::Withdraw(c) => c.target_chain,
        }
    }
}
