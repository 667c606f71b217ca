//! # Entry
//!
//! The per-chain front door. Users deposit and withdraw here; the Entry
//! either serves the request from a vault on its own chain or forwards it
//! to the Hub as a tagged message, with itself as the revert address so a
//! leg that never reaches the Hub comes straight back to the user.
//!
//! The Entry is also the hand-off point for withdrawal payouts leaving a
//! vault on its chain toward another chain (`callback`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use nexus_protocol::crypto::{verify_signer, PermitIntent, SignatureError};
use nexus_protocol::ledger::LedgerError;
use nexus_protocol::transport::{RevertContext, RevertOptions, SendRequest, Transport, TransportError};
use nexus_protocol::types::{Address, AssetId, ChainId, DispatchId, ProtocolId};
use nexus_protocol::wire::{
    CallbackMessage, CodecError, CompensationPayload, DepositContext, HubMessage, Operation, WithdrawContext,
};

use crate::access::{AccessControl, AccessError, Direction};
use crate::chain::ChainState;
use crate::vault::{Payout, Vault, VaultError, WithdrawAuth, WithdrawReceipt, WithdrawRequest};

#[derive(Debug, Error)]
pub enum EntryError {
    /// The Entry is paused for this direction, or the caller lacks the role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The local vault refused a same-chain deposit or withdrawal.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The gateway refused to dispatch the leg to the Hub.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Pulling funds from the user or refunding them failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A message or compensation payload did not encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The deposit permit was not signed by its owner.
    #[error("bad permit signature: {0}")]
    Signature(#[from] SignatureError),

    /// A deposit of nothing.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// A deposit of an asset this Entry does not bridge.
    #[error("entry accepts {expected}, got {got}")]
    UnsupportedAsset {
        /// The Entry's asset.
        expected: AssetId,
        /// Asset offered.
        got: AssetId,
    },

    /// No vault is registered for the protocol on this chain.
    #[error("no local vault for {0}")]
    NoLocalVault(ProtocolId),

    /// The registered local vault does not exist on this chain.
    #[error("vault {0} is registered but not deployed")]
    VaultNotDeployed(Address),

    /// A payout callback from a caller that is not a registered local vault.
    #[error("{0} is not a vault registered with this entry")]
    NotAVault(Address),

    /// A deposit permit past its deadline.
    #[error("permit expired at {deadline}, now {now}")]
    Expired {
        /// Unix seconds the permit was valid until.
        deadline: i64,
        /// Unix seconds on the Entry's chain.
        now: i64,
    },

    /// A deposit permit for another nonce, usually a replay.
    #[error("permit nonce mismatch for {owner}: expected {expected}, got {got}")]
    NonceMismatch {
        /// Permit signer.
        owner: Address,
        /// Next unused nonce.
        expected: u64,
        /// Nonce in the permit.
        got: u64,
    },

    /// A Hub payload reached the Entry's revert handler.
    #[error("compensation payload of the wrong kind for this handler")]
    UnexpectedPayload,
}

impl From<bincode::Error> for EntryError {
    fn from(e: bincode::Error) -> Self {
        EntryError::Signature(SignatureError::from(e))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryConfig {
    pub address: Address,
    pub chain: ChainId,
    pub hub: Address,
    pub hub_chain: ChainId,
    /// The stable asset this Entry accepts.
    pub asset: AssetId,
    pub owner: Address,
}

/// Signed approval letting the Entry pull a deposit from `owner`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub nonce: u64,
    pub deadline: i64,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    Deposited {
        vault: Address,
        beneficiary: Address,
        shares: u64,
    },
    Withdrawn {
        vault: Address,
        receipt: WithdrawReceipt,
        forwarded: Option<DispatchId>,
    },
    /// Forwarded to the Hub.
    Dispatched(DispatchId),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entry {
    address: Address,
    chain: ChainId,
    hub: Address,
    hub_chain: ChainId,
    asset: AssetId,
    access: AccessControl,
    vaults: BTreeMap<ProtocolId, Address>,
    permit_nonces: BTreeMap<Address, u64>,
}

impl Entry {
    pub fn new(config: EntryConfig) -> Self {
        Self {
            address: config.address,
            chain: config.chain,
            hub: config.hub,
            hub_chain: config.hub_chain,
            asset: config.asset,
            access: AccessControl::new(config.owner),
            vaults: BTreeMap::new(),
            permit_nonces: BTreeMap::new(),
        }
    }

    pub fn deposit(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        caller: &Address,
        ctx: &DepositContext,
    ) -> Result<EntryOutcome, EntryError> {
        self.access.ensure_active(Direction::Deposit)?;
        self.pull(state, caller, ctx)?;
        self.forward_deposit(state, vaults, *caller, ctx)
    }

    /// Deposit funded from `owner`'s balance on the strength of a signed
    /// permit. Anybody may submit it.
    pub fn deposit_with_permit(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        owner: &Address,
        ctx: &DepositContext,
        permit: &Permit,
    ) -> Result<EntryOutcome, EntryError> {
        self.access.ensure_active(Direction::Deposit)?;

        let now = state.now.timestamp();
        if now > permit.deadline {
            return Err(EntryError::Expired {
                deadline: permit.deadline,
                now,
            });
        }
        let expected = self.permit_nonce(owner);
        if permit.nonce != expected {
            return Err(EntryError::NonceMismatch {
                owner: *owner,
                expected,
                got: permit.nonce,
            });
        }
        let intent = PermitIntent {
            owner: *owner,
            spender: self.address,
            asset: ctx.asset,
            amount: ctx.amount,
            nonce: permit.nonce,
            deadline: permit.deadline,
            chain: self.chain,
        };
        verify_signer(owner, &intent.digest()?, &permit.signature, &state.wallets)?;
        self.permit_nonces.insert(*owner, expected + 1);

        self.pull(state, owner, ctx)?;
        self.forward_deposit(state, vaults, *owner, ctx)
    }

    /// `ctx.gas_amount` of `ctx.gas_asset` is taken from the caller to pay
    /// for the Hub→vault leg.
    pub fn withdraw(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        caller: &Address,
        ctx: &WithdrawContext,
    ) -> Result<EntryOutcome, EntryError> {
        self.access.ensure_active(Direction::Withdraw)?;

        if ctx.target_chain == self.chain {
            let (vault_address, vault) = self.local_vault(vaults, ctx.protocol)?;
            let request = WithdrawRequest {
                owner: *caller,
                receiver: ctx.receiver,
                shares: ctx.shares,
                destination_chain: ctx.destination_chain,
                gas_limit: ctx.gas_limit,
            };
            let receipt = vault.withdraw(
                state,
                &self.address,
                &request,
                &WithdrawAuth::Signed(ctx.authorization.clone()),
            )?;
            let forwarded = match &receipt.payout {
                Payout::Direct { .. } => None,
                Payout::Forward { asset, message, .. } => Some(self.send_callback(state, *asset, message.clone())?),
            };
            return Ok(EntryOutcome::Withdrawn {
                vault: vault_address,
                receipt,
                forwarded,
            });
        }

        state
            .tokens
            .transfer(&ctx.gas_asset, caller, &self.address, ctx.gas_amount)?;
        let message = HubMessage::Withdraw(ctx.to_message(*caller, self.chain, ctx.gas_limit));
        let dispatch = self.send_to_hub(
            state,
            *caller,
            Operation::Withdraw,
            ctx.gas_asset,
            ctx.gas_amount,
            &message,
        )?;
        Ok(EntryOutcome::Dispatched(dispatch))
    }

    /// Payout from a local vault bound for another chain.
    pub fn callback(
        &mut self,
        state: &mut ChainState,
        caller: &Address,
        asset: AssetId,
        message: CallbackMessage,
    ) -> Result<DispatchId, EntryError> {
        if !self.vaults.values().any(|v| v == caller) {
            return Err(EntryError::NotAVault(*caller));
        }
        self.send_callback(state, asset, message)
    }

    /// A leg toward the Hub never took effect: hand the value straight back.
    pub fn on_revert(&mut self, state: &mut ChainState, ctx: &RevertContext) -> Result<(), EntryError> {
        let CompensationPayload::Entry { sender, operation } = CompensationPayload::decode(&ctx.revert_message)?
        else {
            return Err(EntryError::UnexpectedPayload);
        };
        state.tokens.transfer(&ctx.asset, &self.address, &sender, ctx.amount)?;
        warn!(
            dispatch = %ctx.dispatch,
            entry = %self.address,
            %operation,
            %sender,
            amount = ctx.amount,
            "leg to hub reverted, refunded"
        );
        Ok(())
    }

    fn pull(&self, state: &mut ChainState, from: &Address, ctx: &DepositContext) -> Result<(), EntryError> {
        if ctx.amount == 0 {
            return Err(EntryError::ZeroAmount);
        }
        if ctx.asset != self.asset {
            return Err(EntryError::UnsupportedAsset {
                expected: self.asset,
                got: ctx.asset,
            });
        }
        state.tokens.transfer(&ctx.asset, from, &self.address, ctx.amount)?;
        Ok(())
    }

    fn forward_deposit(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        sender: Address,
        ctx: &DepositContext,
    ) -> Result<EntryOutcome, EntryError> {
        if ctx.target_chain == self.chain {
            let (vault_address, vault) = self.local_vault(vaults, ctx.protocol)?;
            let shares = vault.deposit(state, &self.address, ctx.amount, ctx.beneficiary)?;
            return Ok(EntryOutcome::Deposited {
                vault: vault_address,
                beneficiary: ctx.beneficiary,
                shares,
            });
        }
        let message = HubMessage::Deposit(ctx.to_message(sender, self.chain, ctx.gas_limit));
        let dispatch = self.send_to_hub(state, sender, Operation::Deposit, ctx.asset, ctx.amount, &message)?;
        Ok(EntryOutcome::Dispatched(dispatch))
    }

    fn send_callback(
        &mut self,
        state: &mut ChainState,
        asset: AssetId,
        message: CallbackMessage,
    ) -> Result<DispatchId, EntryError> {
        let owner = message.sender;
        let amount = message.amount;
        self.send_to_hub(
            state,
            owner,
            Operation::Callback,
            asset,
            amount,
            &HubMessage::Callback(message),
        )
    }

    fn send_to_hub(
        &mut self,
        state: &mut ChainState,
        sender: Address,
        operation: Operation,
        asset: AssetId,
        amount: u64,
        message: &HubMessage,
    ) -> Result<DispatchId, EntryError> {
        let payload = CompensationPayload::Entry { sender, operation };
        let request = SendRequest {
            sender: self.address,
            destination_chain: self.hub_chain,
            receiver: self.hub,
            asset,
            amount,
            message: Some(message.encode()?),
            gas_limit: 0,
            revert: RevertOptions {
                revert_address: self.address,
                call_on_revert: true,
                abort_address: self.hub,
                revert_message: payload.encode()?,
            },
        };
        let dispatch = state.gateway.send(&mut state.tokens, request)?;
        info!(%dispatch, entry = %self.address, %operation, %sender, amount, "forwarded to hub");
        Ok(dispatch)
    }

    fn local_vault<'v>(
        &self,
        vaults: &'v mut BTreeMap<Address, Vault>,
        protocol: ProtocolId,
    ) -> Result<(Address, &'v mut Vault), EntryError> {
        let address = self
            .vaults
            .get(&protocol)
            .copied()
            .ok_or(EntryError::NoLocalVault(protocol))?;
        let vault = vaults
            .get_mut(&address)
            .ok_or(EntryError::VaultNotDeployed(address))?;
        Ok((address, vault))
    }

    // -- Admin --------------------------------------------------------------

    pub fn register_vault(&mut self, caller: &Address, protocol: ProtocolId, vault: Address) -> Result<(), EntryError> {
        self.access.only_owner(caller)?;
        self.vaults.insert(protocol, vault);
        info!(entry = %self.address, %protocol, %vault, "local vault registered");
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address, direction: Direction) -> Result<(), EntryError> {
        Ok(self.access.pause(caller, direction)?)
    }

    pub fn unpause(&mut self, caller: &Address, direction: Direction) -> Result<(), EntryError> {
        Ok(self.access.unpause(caller, direction)?)
    }

    pub fn set_guardian(&mut self, caller: &Address, guardian: Address, enabled: bool) -> Result<(), EntryError> {
        Ok(self.access.set_guardian(caller, guardian, enabled)?)
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), EntryError> {
        Ok(self.access.transfer_ownership(caller, new_owner)?)
    }

    // -- Views --------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn is_paused(&self, direction: Direction) -> bool {
        self.access.is_paused(direction)
    }

    pub fn permit_nonce(&self, owner: &Address) -> u64 {
        self.permit_nonces.get(owner).copied().unwrap_or(0)
    }

    pub fn vault_for(&self, protocol: ProtocolId) -> Option<Address> {
        self.vaults.get(&protocol).copied()
    }
}
