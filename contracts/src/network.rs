//! # Local Network
//!
//! An in-process relayer connecting several [`Chain`]s. It collects every
//! gateway's outbox into one FIFO queue and delivers legs one at a time,
//! so a test (or the devnet node) can interleave user calls with partial
//! delivery and observe every intermediate state.
//!
//! Per leg, exactly one of three things happens:
//!
//! 1. **Delivered.** The value is minted on the destination (translated by
//!    the [`AssetBridge`]) and the receiver's `on_call` runs, all in one
//!    destination transaction. The origin escrow is burned.
//! 2. **Reverted.** The destination transaction failed (or a
//!    [`Fault::Revert`] was injected). The escrow goes to the revert
//!    address on the origin and `on_revert` runs there.
//! 3. **Aborted.** The destination took custody and failed
//!    ([`Fault::Abort`]), or the revert itself failed. The escrow is burned
//!    and its hub-chain representation is minted to the abort address,
//!    whose `on_abort` runs on the hub chain.
//!
//! If even `on_abort` fails, the minted value stays at the abort address
//! unattributed and the report says so.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;
use tracing::{error, info, warn};

use nexus_protocol::config::MAX_DELIVERIES_PER_FLUSH;
use nexus_protocol::ledger::LedgerError;
use nexus_protocol::transport::{AbortContext, InboundCall, OutboundCall, RevertContext};
use nexus_protocol::types::{AssetId, ChainId, DispatchId};
use nexus_protocol::wire::Operation;

use crate::chain::{Chain, ChainError};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("chain {0} is not part of this network")]
    UnknownChain(ChainId),

    #[error("asset {asset} on chain {from} has no representation on chain {to}")]
    Unbridged { asset: AssetId, from: ChainId, to: ChainId },

    /// The queue kept refilling; most likely two contracts ping-ponging.
    #[error("more than {0} deliveries in one flush")]
    DeliveryLimit(usize),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// AssetBridge
// ---------------------------------------------------------------------------

/// Which asset on one chain is "the same" as which asset on another.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetBridge {
    groups: Vec<BTreeMap<ChainId, AssetId>>,
    index: BTreeMap<(ChainId, AssetId), usize>,
}

impl AssetBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `members` to be one asset across chains.
    pub fn link(&mut self, members: &[(ChainId, AssetId)]) {
        let group = self.groups.len();
        self.groups.push(members.iter().copied().collect());
        for member in members {
            self.index.insert(*member, group);
        }
    }

    pub fn translate(&self, from: ChainId, asset: &AssetId, to: ChainId) -> Option<AssetId> {
        if from == to {
            return Some(*asset);
        }
        let group = self.index.get(&(from, *asset))?;
        self.groups[*group].get(&to).copied()
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Forces the next leg toward a chain to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// Fail before the destination takes custody.
    Revert,
    /// Fail after the destination took custody.
    Abort,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Reverted { reason: String },
    Aborted { reason: String },
    /// Value reached the abort address but its handler failed.
    Stranded { reason: String },
}

impl DeliveryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Reverted { .. } => "reverted",
            DeliveryOutcome::Aborted { .. } => "aborted",
            DeliveryOutcome::Stranded { .. } => "stranded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub dispatch: DispatchId,
    pub origin: ChainId,
    pub destination: ChainId,
    /// `None` for a plain transfer.
    pub operation: Option<Operation>,
    pub amount: u64,
    pub outcome: DeliveryOutcome,
}

// ---------------------------------------------------------------------------
// LocalNetwork
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct LocalNetwork {
    hub_chain: ChainId,
    chains: BTreeMap<ChainId, Chain>,
    bridge: AssetBridge,
    queue: VecDeque<OutboundCall>,
    faults: BTreeMap<ChainId, VecDeque<Fault>>,
}

impl LocalNetwork {
    pub fn new(hub_chain: ChainId, bridge: AssetBridge) -> Self {
        Self {
            hub_chain,
            chains: BTreeMap::new(),
            bridge,
            queue: VecDeque::new(),
            faults: BTreeMap::new(),
        }
    }

    pub fn add_chain(&mut self, chain: Chain) {
        self.chains.insert(chain.id(), chain);
    }

    pub fn hub_chain(&self) -> ChainId {
        self.hub_chain
    }

    pub fn bridge(&self) -> &AssetBridge {
        &self.bridge
    }

    pub fn chain(&self, id: ChainId) -> Result<&Chain, NetworkError> {
        self.chains.get(&id).ok_or(NetworkError::UnknownChain(id))
    }

    pub fn chain_mut(&mut self, id: ChainId) -> Result<&mut Chain, NetworkError> {
        self.chains.get_mut(&id).ok_or(NetworkError::UnknownChain(id))
    }

    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    /// Moves every chain's clock.
    pub fn set_time(&mut self, now: DateTime<Utc>) {
        for chain in self.chains.values_mut() {
            chain.state.now = now;
        }
    }

    /// Makes the next leg toward `destination` fail with `fault`. Faults
    /// queue up in the order injected.
    pub fn inject_fault(&mut self, destination: ChainId, fault: Fault) {
        self.faults.entry(destination).or_default().push_back(fault);
    }

    /// Legs sent and not yet delivered.
    pub fn pending(&self) -> usize {
        self.queue.len()
            + self
                .chains
                .values()
                .map(|c| c.state.gateway.pending().len())
                .sum::<usize>()
    }

    /// Delivers the oldest pending leg, if any.
    pub fn deliver_next(&mut self) -> Result<Option<DeliveryReport>, NetworkError> {
        self.collect();
        match self.queue.pop_front() {
            Some(call) => self.deliver(call).map(Some),
            None => Ok(None),
        }
    }

    /// Delivers until nothing is pending, including legs created by the
    /// deliveries themselves.
    pub fn deliver_all(&mut self) -> Result<Vec<DeliveryReport>, NetworkError> {
        let mut reports = Vec::new();
        while let Some(report) = self.deliver_next()? {
            reports.push(report);
            if reports.len() >= MAX_DELIVERIES_PER_FLUSH && self.pending() > 0 {
                return Err(NetworkError::DeliveryLimit(MAX_DELIVERIES_PER_FLUSH));
            }
        }
        Ok(reports)
    }

    fn collect(&mut self) {
        for chain in self.chains.values_mut() {
            self.queue.extend(chain.state.gateway.drain());
        }
    }

    fn deliver(&mut self, call: OutboundCall) -> Result<DeliveryReport, NetworkError> {
        let fault = self
            .faults
            .get_mut(&call.destination_chain)
            .and_then(VecDeque::pop_front);

        let outcome = match fault {
            Some(Fault::Revert) => self.revert(&call, "injected revert".to_string())?,
            Some(Fault::Abort) => self.abort(&call, "injected abort".to_string())?,
            None => match self.execute(&call) {
                Ok(()) => {
                    self.release_escrow(&call)?;
                    self.acknowledge(&call);
                    DeliveryOutcome::Delivered
                }
                Err(reason) => self.revert(&call, reason)?,
            },
        };

        let operation = call
            .message
            .as_ref()
            .and_then(|m| m.first())
            .and_then(|tag| Operation::try_from(*tag).ok());
        info!(
            dispatch = %call.id,
            from = %call.origin_chain,
            to = %call.destination_chain,
            amount = call.amount,
            outcome = outcome.label(),
            "leg settled"
        );
        Ok(DeliveryReport {
            dispatch: call.id,
            origin: call.origin_chain,
            destination: call.destination_chain,
            operation,
            amount: call.amount,
            outcome,
        })
    }

    /// Runs the leg on its destination. Returns the failure reason.
    fn execute(&mut self, call: &OutboundCall) -> Result<(), String> {
        let asset = match self
            .bridge
            .translate(call.origin_chain, &call.asset, call.destination_chain)
        {
            Some(asset) => asset,
            None if call.amount == 0 => call.asset,
            None => {
                return Err(format!(
                    "asset {} has no representation on chain {}",
                    call.asset, call.destination_chain
                ))
            }
        };
        let destination = self
            .chains
            .get_mut(&call.destination_chain)
            .ok_or_else(|| format!("unknown destination chain {}", call.destination_chain))?;

        destination
            .transact(|chain| {
                chain.state.tokens.mint(&asset, &call.receiver, call.amount)?;
                if let Some(message) = &call.message {
                    let inbound = InboundCall {
                        dispatch: call.id,
                        sender: call.sender,
                        origin_chain: call.origin_chain,
                        asset,
                        amount: call.amount,
                        message: message.clone(),
                    };
                    chain.on_call(&call.receiver, &inbound)?;
                }
                Ok(())
            })
            .map_err(|e| e.to_string())
    }

    fn release_escrow(&mut self, call: &OutboundCall) -> Result<(), NetworkError> {
        let origin = self.chain_mut(call.origin_chain)?;
        let escrow = origin.state.gateway.address();
        origin.state.tokens.burn(&call.asset, &escrow, call.amount)?;
        Ok(())
    }

    /// Tells the Hub one of its own legs landed.
    fn acknowledge(&mut self, call: &OutboundCall) {
        if call.origin_chain != self.hub_chain {
            return;
        }
        let Some(hub_chain) = self.chains.get_mut(&self.hub_chain) else {
            return;
        };
        if hub_chain.hub().map(|h| h.address()) != Some(call.sender) {
            return;
        }
        if let Err(e) = hub_chain.transact(|chain| chain.on_delivered(call.id)) {
            warn!(dispatch = %call.id, error = %e, "delivery acknowledgement refused");
        }
    }

    fn revert(&mut self, call: &OutboundCall, reason: String) -> Result<DeliveryOutcome, NetworkError> {
        warn!(dispatch = %call.id, %reason, "reverting leg");
        let origin = self.chain_mut(call.origin_chain)?;
        let result = origin.transact(|chain| {
            let escrow = chain.state.gateway.address();
            chain
                .state
                .tokens
                .transfer(&call.asset, &escrow, &call.revert.revert_address, call.amount)?;
            if call.revert.call_on_revert {
                let ctx = RevertContext {
                    dispatch: call.id,
                    sender: call.sender,
                    asset: call.asset,
                    amount: call.amount,
                    revert_message: call.revert.revert_message.clone(),
                };
                chain.on_revert(&call.revert.revert_address, &ctx)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => Ok(DeliveryOutcome::Reverted { reason }),
            Err(e) => self.abort(call, format!("{reason}; revert failed: {e}")),
        }
    }

    fn abort(&mut self, call: &OutboundCall, reason: String) -> Result<DeliveryOutcome, NetworkError> {
        let hub_asset = match self.bridge.translate(call.origin_chain, &call.asset, self.hub_chain) {
            Some(asset) => asset,
            None if call.amount == 0 => call.asset,
            None => {
                return Err(NetworkError::Unbridged {
                    asset: call.asset,
                    from: call.origin_chain,
                    to: self.hub_chain,
                })
            }
        };

        self.release_escrow(call)?;

        let ctx = AbortContext {
            dispatch: call.id,
            sender: call.sender,
            origin_chain: call.origin_chain,
            asset: hub_asset,
            amount: call.amount,
            outgoing: call.origin_chain == self.hub_chain,
            revert_message: call.revert.revert_message.clone(),
        };
        let abort_address = call.revert.abort_address;
        let hub_chain = self.chain_mut(self.hub_chain)?;
        let result = hub_chain.transact(|chain| {
            chain.state.tokens.mint(&hub_asset, &abort_address, call.amount)?;
            chain.on_abort(&abort_address, &ctx)
        });

        match result {
            Ok(()) => {
                warn!(dispatch = %call.id, %reason, "leg aborted");
                Ok(DeliveryOutcome::Aborted { reason })
            }
            Err(e) => {
                hub_chain.state.tokens.mint(&hub_asset, &abort_address, call.amount)?;
                error!(
                    dispatch = %call.id,
                    %abort_address,
                    amount = call.amount,
                    error = %e,
                    "abort handler failed, value left unattributed"
                );
                Ok(DeliveryOutcome::Stranded {
                    reason: format!("{reason}; abort handler failed: {e}"),
                })
            }
        }
    }
}
