//! # Cross-Chain Transport
//!
//! The asynchronous call primitive every leg rides on. A contract hands the
//! local [`Gateway`] a [`SendRequest`]; the gateway takes the value into
//! escrow, charges gas, assigns a [`DispatchId`] and queues an
//! [`OutboundCall`]. Whatever relays the outbox later reports back exactly
//! one of:
//!
//! - an [`InboundCall`] on the destination (`on_call`),
//! - a [`RevertContext`] on the origin if the leg never took effect there
//!   (`on_revert`), or
//! - an [`AbortContext`] on the coordinating chain if the destination took
//!   custody and then failed, or the revert itself failed (`on_abort`).
//!
//! The contracts treat this module as an external collaborator: they only
//! see the [`Transport`] trait and these plain data types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::config::DEFAULT_GAS_LIMIT;
use crate::ledger::{LedgerError, TokenLedger};
use crate::types::{Address, AssetId, ChainId, DispatchId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    /// The sender cannot cover the gas fee for the leg.
    #[error("insufficient gas: need {fee} of {asset}, have {available}")]
    InsufficientGas {
        asset: AssetId,
        fee: u64,
        available: u64,
    },

    #[error("gas fee overflow for gas limit {0}")]
    FeeOverflow(u64),

    #[error("cannot send to own chain {0}")]
    SameChain(ChainId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a failed leg's value goes and what to tell the recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertOptions {
    /// Receives the escrowed value on the origin chain on revert.
    pub revert_address: Address,
    /// Whether `revert_address` gets an `on_revert` call.
    pub call_on_revert: bool,
    /// Receives the value on the coordinating chain on abort.
    pub abort_address: Address,
    /// Echoed back verbatim in revert and abort contexts.
    pub revert_message: Vec<u8>,
}

/// What a contract asks its gateway to send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub sender: Address,
    pub destination_chain: ChainId,
    pub receiver: Address,
    pub asset: AssetId,
    /// Zero for a pure call.
    pub amount: u64,
    /// `None` is a plain transfer: the receiver is credited and no handler
    /// runs.
    pub message: Option<Vec<u8>>,
    pub gas_limit: u64,
    pub revert: RevertOptions,
}

/// A queued leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCall {
    pub id: DispatchId,
    pub origin_chain: ChainId,
    pub sender: Address,
    pub destination_chain: ChainId,
    pub receiver: Address,
    pub asset: AssetId,
    pub amount: u64,
    pub message: Option<Vec<u8>>,
    pub gas_limit: u64,
    pub revert: RevertOptions,
}

/// Delivered to the receiver on the destination chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCall {
    pub dispatch: DispatchId,
    /// The contract that sent the leg, as seen on its own chain.
    pub sender: Address,
    pub origin_chain: ChainId,
    /// The asset as known on the destination chain.
    pub asset: AssetId,
    pub amount: u64,
    pub message: Vec<u8>,
}

/// Delivered to `revert_address` on the origin chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertContext {
    pub dispatch: DispatchId,
    pub sender: Address,
    pub asset: AssetId,
    pub amount: u64,
    pub revert_message: Vec<u8>,
}

/// Delivered to `abort_address` on the coordinating chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortContext {
    pub dispatch: DispatchId,
    /// The contract that sent the failed leg.
    pub sender: Address,
    /// The chain that leg was sent from.
    pub origin_chain: ChainId,
    /// The asset as known on the coordinating chain.
    pub asset: AssetId,
    pub amount: u64,
    /// `true` when the failed leg left the coordinating chain.
    pub outgoing: bool,
    pub revert_message: Vec<u8>,
}

/// Gas price for legs toward one destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    pub asset: AssetId,
    pub per_gas: u64,
}

/// The fee a leg will cost, in the sender's gas asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasQuote {
    pub asset: AssetId,
    pub fee: u64,
}

/// Zero means "use the default".
pub fn effective_gas_limit(gas_limit: u64) -> u64 {
    if gas_limit == 0 {
        DEFAULT_GAS_LIMIT
    } else {
        gas_limit
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait Transport {
    /// Escrows value, charges gas and queues the leg.
    fn send(&mut self, tokens: &mut TokenLedger, request: SendRequest) -> Result<DispatchId, TransportError>;

    /// Gas cost of a leg toward `destination`. `None` when unpriced (free).
    fn gas_quote(&self, destination: ChainId, gas_limit: u64) -> Result<Option<GasQuote>, TransportError>;
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// The per-chain transport endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gateway {
    /// Escrow account holding in-flight value.
    address: Address,
    chain: ChainId,
    gas_prices: BTreeMap<ChainId, GasPrice>,
    outbox: Vec<OutboundCall>,
}

impl Gateway {
    pub fn new(address: Address, chain: ChainId) -> Self {
        Self {
            address,
            chain,
            gas_prices: BTreeMap::new(),
            outbox: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn set_gas_price(&mut self, destination: ChainId, price: GasPrice) {
        self.gas_prices.insert(destination, price);
    }

    /// Legs queued and not yet relayed.
    pub fn pending(&self) -> &[OutboundCall] {
        &self.outbox
    }

    /// Hands every queued leg to the relayer.
    pub fn drain(&mut self) -> Vec<OutboundCall> {
        std::mem::take(&mut self.outbox)
    }
}

impl Transport for Gateway {
    fn send(&mut self, tokens: &mut TokenLedger, request: SendRequest) -> Result<DispatchId, TransportError> {
        if request.destination_chain == self.chain {
            return Err(TransportError::SameChain(self.chain));
        }
        let gas_limit = effective_gas_limit(request.gas_limit);

        if let Some(quote) = self.gas_quote(request.destination_chain, gas_limit)? {
            let available = tokens.balance_of(&quote.asset, &request.sender);
            if available < quote.fee {
                return Err(TransportError::InsufficientGas {
                    asset: quote.asset,
                    fee: quote.fee,
                    available,
                });
            }
            tokens.burn(&quote.asset, &request.sender, quote.fee)?;
        }
        tokens.transfer(&request.asset, &request.sender, &self.address, request.amount)?;

        let id = DispatchId::new();
        debug!(
            dispatch = %id,
            from = %self.chain,
            to = %request.destination_chain,
            amount = request.amount,
            "leg queued"
        );
        self.outbox.push(OutboundCall {
            id,
            origin_chain: self.chain,
            sender: request.sender,
            destination_chain: request.destination_chain,
            receiver: request.receiver,
            asset: request.asset,
            amount: request.amount,
            message: request.message,
            gas_limit,
            revert: request.revert,
        });
        Ok(id)
    }

    fn gas_quote(&self, destination: ChainId, gas_limit: u64) -> Result<Option<GasQuote>, TransportError> {
        let Some(price) = self.gas_prices.get(&destination) else {
            return Ok(None);
        };
        let gas_limit = effective_gas_limit(gas_limit);
        let fee = gas_limit
            .checked_mul(price.per_gas)
            .ok_or(TransportError::FeeOverflow(gas_limit))?;
        Ok(Some(GasQuote {
            asset: price.asset,
            fee,
        }))
    }
}
