//! # Chain
//!
//! One simulated chain: its token ledger, gateway, swap router, lending
//! pools and contract wallets ([`ChainState`]), plus whichever protocol
//! contracts are deployed on it ([`Chain`]).
//!
//! Every externally triggered call runs inside [`Chain::transact`]: the
//! chain is snapshotted first and restored if the call fails, so a failed
//! handler leaves no partial writes behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use nexus_protocol::crypto::WalletRegistry;
use nexus_protocol::ledger::{LedgerError, TokenLedger};
use nexus_protocol::lending::LendingPool;
use nexus_protocol::swap::FixedRateRouter;
use nexus_protocol::transport::{AbortContext, Gateway, InboundCall, RevertContext};
use nexus_protocol::types::{Address, AssetId, ChainId, DispatchId};
use nexus_protocol::wire::{CallContext, DepositContext};

use crate::entry::{Entry, EntryError, EntryOutcome, Permit};
use crate::hub::{Hub, HubError, HubOutcome, RefundClaim};
use crate::vault::{Payout, Vault, VaultCall, VaultError, WithdrawAuth, WithdrawReceipt, WithdrawRequest};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("no hub deployed on chain {0}")]
    NoHub(ChainId),

    #[error("no entry deployed on chain {0}")]
    NoEntry(ChainId),

    #[error("no vault at {0}")]
    NoVault(Address),

    /// Nothing at `receiver` can handle the call.
    #[error("no contract at {0} handles this call")]
    NoHandler(Address),
}

// ---------------------------------------------------------------------------
// ChainState
// ---------------------------------------------------------------------------

/// Everything on a chain except the protocol contracts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainState {
    pub chain_id: ChainId,
    pub tokens: TokenLedger,
    pub gateway: Gateway,
    pub router: FixedRateRouter,
    pub pools: BTreeMap<Address, LendingPool>,
    pub wallets: WalletRegistry,
    /// Block time.
    pub now: DateTime<Utc>,
}

impl ChainState {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            tokens: TokenLedger::new(),
            gateway: Gateway::new(Address::derive(&format!("gateway.{}", chain_id.0)), chain_id),
            router: FixedRateRouter::new(Address::derive(&format!("router.{}", chain_id.0))),
            pools: BTreeMap::new(),
            wallets: WalletRegistry::new(),
            now: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// What a call did on this chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    Hub(HubOutcome),
    Entry(EntryOutcome),
    /// `forwarded` is the payout leg when a withdrawal left the chain.
    Vault {
        call: VaultCall,
        forwarded: Option<DispatchId>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chain {
    pub state: ChainState,
    hub: Option<Hub>,
    entry: Option<Entry>,
    vaults: BTreeMap<Address, Vault>,
}

impl Chain {
    pub fn new(state: ChainState) -> Self {
        Self {
            state,
            hub: None,
            entry: None,
            vaults: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ChainId {
        self.state.chain_id
    }

    pub fn deploy_hub(&mut self, hub: Hub) {
        self.hub = Some(hub);
    }

    pub fn deploy_entry(&mut self, entry: Entry) {
        self.entry = Some(entry);
    }

    pub fn deploy_vault(&mut self, vault: Vault) {
        self.vaults.insert(vault.address(), vault);
    }

    /// Runs `f` atomically: on error the chain is restored to what it was.
    pub fn transact<T>(&mut self, f: impl FnOnce(&mut Chain) -> Result<T, ChainError>) -> Result<T, ChainError> {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            debug!(chain = %self.id(), "transaction rolled back");
            *self = snapshot;
        }
        result
    }

    // -- Contracts ----------------------------------------------------------

    pub fn hub(&self) -> Option<&Hub> {
        self.hub.as_ref()
    }

    pub fn hub_mut(&mut self) -> Result<&mut Hub, ChainError> {
        let id = self.id();
        self.hub.as_mut().ok_or(ChainError::NoHub(id))
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn entry_mut(&mut self) -> Result<&mut Entry, ChainError> {
        let id = self.id();
        self.entry.as_mut().ok_or(ChainError::NoEntry(id))
    }

    pub fn vault(&self, address: &Address) -> Option<&Vault> {
        self.vaults.get(address)
    }

    pub fn vault_mut(&mut self, address: &Address) -> Result<&mut Vault, ChainError> {
        self.vaults.get_mut(address).ok_or(ChainError::NoVault(*address))
    }

    pub fn vaults(&self) -> impl Iterator<Item = &Vault> {
        self.vaults.values()
    }

    // -- User calls ---------------------------------------------------------

    /// Routes a user request to this chain's Entry, or to the Hub on the
    /// hub chain.
    pub fn submit(&mut self, caller: &Address, ctx: &CallContext) -> Result<CallOutcome, ChainError> {
        let caller = *caller;
        self.transact(|chain| {
            let Chain {
                state,
                hub,
                entry,
                vaults,
            } = chain;
            if let Some(entry) = entry.as_mut() {
                let outcome = match ctx {
                    CallContext::Deposit(c) => entry.deposit(state, vaults, &caller, c)?,
                    CallContext::Withdraw(c) => entry.withdraw(state, vaults, &caller, c)?,
                };
                return Ok(CallOutcome::Entry(outcome));
            }
            if let Some(hub) = hub.as_mut() {
                let outcome = match ctx {
                    CallContext::Deposit(c) => hub.deposit(state, vaults, &caller, c)?,
                    CallContext::Withdraw(c) => hub.withdraw(state, vaults, &caller, c)?,
                };
                return Ok(CallOutcome::Hub(outcome));
            }
            Err(ChainError::NoEntry(state.chain_id))
        })
    }

    pub fn deposit_with_permit(
        &mut self,
        owner: &Address,
        ctx: &DepositContext,
        permit: &Permit,
    ) -> Result<CallOutcome, ChainError> {
        self.transact(|chain| {
            let Chain {
                state, entry, vaults, ..
            } = chain;
            let entry = entry.as_mut().ok_or(ChainError::NoEntry(state.chain_id))?;
            Ok(CallOutcome::Entry(entry.deposit_with_permit(state, vaults, owner, ctx, permit)?))
        })
    }

    /// Deposit straight into a vault, bypassing Entry and Hub.
    pub fn vault_deposit(
        &mut self,
        vault: &Address,
        caller: &Address,
        amount: u64,
        beneficiary: Address,
    ) -> Result<u64, ChainError> {
        self.transact(|chain| {
            let Chain { state, vaults, .. } = chain;
            let vault = vaults.get_mut(vault).ok_or(ChainError::NoVault(*vault))?;
            Ok(vault.deposit(state, caller, amount, beneficiary)?)
        })
    }

    /// Withdrawal called directly on a vault. A cross-chain payout is handed
    /// to the vault's callback contract in the same transaction.
    pub fn vault_withdraw(
        &mut self,
        vault: &Address,
        caller: &Address,
        request: &WithdrawRequest,
        auth: &WithdrawAuth,
    ) -> Result<(WithdrawReceipt, Option<DispatchId>), ChainError> {
        let vault_address = *vault;
        self.transact(|chain| {
            let receipt = {
                let Chain { state, vaults, .. } = &mut *chain;
                let vault = vaults
                    .get_mut(&vault_address)
                    .ok_or(ChainError::NoVault(vault_address))?;
                vault.withdraw(state, caller, request, auth)?
            };
            let forwarded = chain.settle_payout(&vault_address, &receipt.payout)?;
            Ok((receipt, forwarded))
        })
    }

    pub fn claim_refund(&mut self, caller: &Address, asset: AssetId) -> Result<u64, ChainError> {
        self.transact(|chain| {
            let Chain { state, hub, .. } = chain;
            let hub = hub.as_mut().ok_or(ChainError::NoHub(state.chain_id))?;
            Ok(hub.claim_refund(state, caller, asset)?)
        })
    }

    pub fn claim_refund_for(&mut self, claim: &RefundClaim) -> Result<u64, ChainError> {
        self.transact(|chain| {
            let Chain { state, hub, .. } = chain;
            let hub = hub.as_mut().ok_or(ChainError::NoHub(state.chain_id))?;
            Ok(hub.claim_refund_for(state, claim)?)
        })
    }

    // -- Transport callbacks ------------------------------------------------
    //
    // Not wrapped in `transact`: the network runs each delivery as one
    // transaction that also covers minting and escrow movements.

    pub fn on_call(&mut self, receiver: &Address, inbound: &InboundCall) -> Result<CallOutcome, ChainError> {
        if self.hub.as_ref().map(Hub::address) == Some(*receiver) {
            let Chain {
                state, hub, vaults, ..
            } = self;
            let hub = hub.as_mut().ok_or(ChainError::NoHub(state.chain_id))?;
            return Ok(CallOutcome::Hub(hub.on_call(state, vaults, inbound)?));
        }

        if self.vaults.contains_key(receiver) {
            let call = {
                let Chain { state, vaults, .. } = &mut *self;
                let vault = vaults.get_mut(receiver).ok_or(ChainError::NoVault(*receiver))?;
                vault.on_call(state, inbound)?
            };
            let forwarded = match &call {
                VaultCall::Withdrawn(receipt) => self.settle_payout(receiver, &receipt.payout)?,
                VaultCall::Deposited { .. } => None,
            };
            return Ok(CallOutcome::Vault { call, forwarded });
        }

        Err(ChainError::NoHandler(*receiver))
    }

    pub fn on_revert(&mut self, receiver: &Address, ctx: &RevertContext) -> Result<(), ChainError> {
        let Chain {
            state, hub, entry, ..
        } = self;
        if let Some(hub) = hub.as_mut().filter(|h| h.address() == *receiver) {
            return Ok(hub.on_revert(state, ctx)?);
        }
        if let Some(entry) = entry.as_mut().filter(|e| e.address() == *receiver) {
            return Ok(entry.on_revert(state, ctx)?);
        }
        Err(ChainError::NoHandler(*receiver))
    }

    pub fn on_abort(&mut self, receiver: &Address, ctx: &AbortContext) -> Result<(), ChainError> {
        match self.hub.as_mut() {
            Some(hub) if hub.address() == *receiver => Ok(hub.on_abort(ctx)?),
            _ => Err(ChainError::NoHandler(*receiver)),
        }
    }

    pub fn on_delivered(&mut self, dispatch: DispatchId) -> Result<(), ChainError> {
        Ok(self.hub_mut()?.on_delivered(dispatch)?)
    }

    /// Continues a vault's cross-chain payout through its callback contract.
    fn settle_payout(&mut self, vault: &Address, payout: &Payout) -> Result<Option<DispatchId>, ChainError> {
        let Payout::Forward {
            callback,
            asset,
            message,
        } = payout
        else {
            return Ok(None);
        };
        let Chain {
            state, hub, entry, ..
        } = self;

        if let Some(entry) = entry.as_mut().filter(|e| e.address() == *callback) {
            return Ok(Some(entry.callback(state, vault, *asset, message.clone())?));
        }
        if let Some(hub) = hub.as_mut().filter(|h| h.address() == *callback) {
            return match hub.callback(state, vault, *asset, message)? {
                HubOutcome::Dispatched { dispatch, .. } => Ok(Some(dispatch)),
                _ => Ok(None),
            };
        }
        Err(ChainError::NoHandler(*callback))
    }
}
