//! # Hub
//!
//! The coordinator on the hub chain. Every cross-chain request passes
//! through here exactly once on its way to a vault, and every withdrawal
//! payout that leaves the vault's chain passes through here on its way to
//! the receiver.
//!
//! The Hub:
//! - authenticates inbound legs against the [`RoutingRegistry`] (only the
//!   registered Entry of the origin chain may call),
//! - normalizes deposits to the target chain's asset through the swap
//!   router, buying destination gas out of principal when its own float is
//!   short,
//! - dispatches the next leg and opens a [`CompensationTracker`] record for
//!   it,
//! - turns revert and abort notifications into refunds, either paid
//!   directly (hub-chain users) or booked in the [`RefundLedger`] for later
//!   claim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use nexus_protocol::crypto::{verify_signer, RefundClaimIntent, SignatureError};
use nexus_protocol::ledger::LedgerError;
use nexus_protocol::swap::{SwapError, SwapRouter};
use nexus_protocol::transport::{
    AbortContext, InboundCall, RevertContext, RevertOptions, SendRequest, Transport, TransportError,
};
use nexus_protocol::types::{Address, AssetId, ChainId, DispatchId, VaultKey};
use nexus_protocol::wire::{
    CallbackMessage, CodecError, CompensationPayload, DepositContext, DepositMessage, HubMessage, Operation,
    WithdrawContext, WithdrawMessage,
};

use crate::access::{AccessControl, AccessError, Direction};
use crate::chain::ChainState;
use crate::compensation::{CompensationError, CompensationState, CompensationTracker};
use crate::refund::{RefundError, RefundLedger};
use crate::registry::{RegistryError, RoutingRegistry};
use crate::vault::{Payout, Vault, VaultError, WithdrawAuth, WithdrawReceipt, WithdrawRequest};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by the Hub's entry points and transport callbacks.
#[derive(Debug, Error)]
pub enum HubError {
    /// The Hub is paused for this direction, or the caller lacks the role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// No vault, Entry or target asset is configured for the route.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The refund ledger refused a credit or a claim.
    #[error(transparent)]
    Refund(#[from] RefundError),

    /// The dispatch is unknown or already settled.
    #[error(transparent)]
    Compensation(#[from] CompensationError),

    /// A hub-chain vault refused the call.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Normalization or gas purchase through the router failed.
    #[error(transparent)]
    Swap(#[from] SwapError),

    /// The gateway refused to dispatch the next leg.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A token movement on the hub chain failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A message or compensation payload did not decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The owner's signature on a relayed refund claim did not verify.
    #[error("bad refund claim signature: {0}")]
    Signature(#[from] SignatureError),

    /// An inbound leg not sent by the registered Entry of its chain.
    #[error("sender {sender} is not the entry of chain {chain}")]
    UnauthorizedSender {
        /// Chain the leg arrived from.
        chain: ChainId,
        /// Contract that sent it.
        sender: Address,
    },

    /// An abort for a leg neither this Hub nor any Entry ever registered
    /// for the chain sent.
    #[error("abort from unknown sender {sender} on chain {chain}")]
    UnknownAbortSender {
        /// Chain the failed leg was sent from.
        chain: ChainId,
        /// Contract named as its sender.
        sender: Address,
    },

    /// The decoded message names a different origin than the transport.
    #[error("message claims origin chain {claimed}, arrived from {actual}")]
    OriginMismatch {
        /// Origin written in the message.
        claimed: ChainId,
        /// Origin reported by the transport.
        actual: ChainId,
    },

    /// The registry points at a hub-chain vault that does not exist.
    #[error("vault {0} is registered on the hub chain but not deployed")]
    VaultNotDeployed(Address),

    /// A payout callback from a caller that is not a registered hub-chain vault.
    #[error("{0} is not a registered hub-chain vault")]
    NotAVault(Address),

    /// Principal cannot cover destination gas.
    #[error("gas costs {needed}, only {available} available")]
    InsufficientForGas {
        /// Principal needed to buy the missing gas.
        needed: u64,
        /// Principal carried by the leg.
        available: u64,
    },

    /// A hub-chain deposit of nothing.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// A relayed refund claim past its deadline.
    #[error("signature expired at {deadline}, now {now}")]
    Expired {
        /// Unix seconds the signature was valid until.
        deadline: i64,
        /// Unix seconds on the hub chain.
        now: i64,
    },

    /// A relayed refund claim signed for another nonce.
    #[error("nonce mismatch for {owner}: expected {expected}, got {got}")]
    NonceMismatch {
        /// Owner whose claim nonce was checked.
        owner: Address,
        /// Next unused nonce.
        expected: u64,
        /// Nonce in the claim.
        got: u64,
    },

    /// An Entry payload reached a Hub-only handler, or the reverse.
    #[error("compensation payload of the wrong kind for this handler")]
    UnexpectedPayload,
}

impl From<bincode::Error> for HubError {
    fn from(e: bincode::Error) -> Self {
        HubError::Signature(SignatureError::from(e))
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubConfig {
    pub address: Address,
    pub chain: ChainId,
    pub owner: Address,
}

/// A relayed claim on somebody's refund balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundClaim {
    pub owner: Address,
    pub asset: AssetId,
    pub recipient: Address,
    pub nonce: u64,
    pub deadline: i64,
    pub signature: Vec<u8>,
}

/// What a Hub call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubOutcome {
    /// Shares minted in a hub-chain vault.
    Deposited {
        vault: Address,
        beneficiary: Address,
        shares: u64,
    },
    /// Shares burned in a hub-chain vault. `forwarded` is the payout leg
    /// when the destination is another chain.
    Withdrawn {
        vault: Address,
        receipt: WithdrawReceipt,
        forwarded: Option<DispatchId>,
    },
    /// A payout handed to its receiver on the hub chain.
    Delivered { receiver: Address, amount: u64 },
    /// The next leg is in flight.
    Dispatched { dispatch: DispatchId, amount: u64 },
}

/// One leg the Hub sends.
struct Leg {
    destination: ChainId,
    receiver: Address,
    asset: AssetId,
    amount: u64,
    message: Option<HubMessage>,
    gas_limit: u64,
    payload: CompensationPayload,
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hub {
    address: Address,
    chain: ChainId,
    access: AccessControl,
    registry: RoutingRegistry,
    refunds: RefundLedger,
    tracker: CompensationTracker,
    claim_nonces: BTreeMap<Address, u64>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            address: config.address,
            chain: config.chain,
            access: AccessControl::new(config.owner),
            registry: RoutingRegistry::new(),
            refunds: RefundLedger::new(),
            tracker: CompensationTracker::new(),
            claim_nonces: BTreeMap::new(),
        }
    }

    // -- Hub-chain users ----------------------------------------------------

    /// Deposit made directly on the hub chain.
    pub fn deposit(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        caller: &Address,
        ctx: &DepositContext,
    ) -> Result<HubOutcome, HubError> {
        self.access.ensure_active(Direction::Deposit)?;
        if ctx.amount == 0 {
            return Err(HubError::ZeroAmount);
        }
        state.tokens.transfer(&ctx.asset, caller, &self.address, ctx.amount)?;
        let message = ctx.to_message(*caller, self.chain, ctx.gas_limit);
        self.route_deposit(state, vaults, &message, ctx.asset, ctx.amount)
    }

    /// Withdrawal requested directly on the hub chain.
    pub fn withdraw(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        caller: &Address,
        ctx: &WithdrawContext,
    ) -> Result<HubOutcome, HubError> {
        self.access.ensure_active(Direction::Withdraw)?;
        state
            .tokens
            .transfer(&ctx.gas_asset, caller, &self.address, ctx.gas_amount)?;
        let message = ctx.to_message(*caller, self.chain, ctx.gas_limit);
        self.route_withdraw(state, vaults, &message, ctx.gas_asset, ctx.gas_amount)
    }

    /// Pays the caller's whole refund balance in `asset`.
    pub fn claim_refund(&mut self, state: &mut ChainState, caller: &Address, asset: AssetId) -> Result<u64, HubError> {
        let amount = self.refunds.take(caller, &asset)?;
        state.tokens.transfer(&asset, &self.address, caller, amount)?;
        info!(owner = %caller, %asset, amount, "refund claimed");
        Ok(amount)
    }

    /// Pays `claim.owner`'s refund balance to `claim.recipient` on the
    /// strength of the owner's signature.
    pub fn claim_refund_for(&mut self, state: &mut ChainState, claim: &RefundClaim) -> Result<u64, HubError> {
        let now = state.now.timestamp();
        if now > claim.deadline {
            return Err(HubError::Expired {
                deadline: claim.deadline,
                now,
            });
        }
        let expected = self.claim_nonce(&claim.owner);
        if claim.nonce != expected {
            return Err(HubError::NonceMismatch {
                owner: claim.owner,
                expected,
                got: claim.nonce,
            });
        }
        let intent = RefundClaimIntent {
            hub: self.address,
            owner: claim.owner,
            asset: claim.asset,
            recipient: claim.recipient,
            nonce: claim.nonce,
            deadline: claim.deadline,
        };
        verify_signer(&claim.owner, &intent.digest()?, &claim.signature, &state.wallets)?;
        self.claim_nonces.insert(claim.owner, expected + 1);

        let amount = self.refunds.take(&claim.owner, &claim.asset)?;
        state
            .tokens
            .transfer(&claim.asset, &self.address, &claim.recipient, amount)?;
        info!(
            owner = %claim.owner,
            recipient = %claim.recipient,
            asset = %claim.asset,
            amount,
            "refund claimed by relayer"
        );
        Ok(amount)
    }

    // -- Transport callbacks ------------------------------------------------

    /// Handles a leg sent by an Entry.
    pub fn on_call(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        inbound: &InboundCall,
    ) -> Result<HubOutcome, HubError> {
        if !self.registry.is_entry(inbound.origin_chain, &inbound.sender) {
            return Err(HubError::UnauthorizedSender {
                chain: inbound.origin_chain,
                sender: inbound.sender,
            });
        }

        match HubMessage::decode(&inbound.message)? {
            HubMessage::Deposit(message) => {
                self.access.ensure_active(Direction::Deposit)?;
                check_origin(message.origin_chain, inbound.origin_chain)?;
                self.route_deposit(state, vaults, &message, inbound.asset, inbound.amount)
            }
            HubMessage::Withdraw(message) => {
                self.access.ensure_active(Direction::Withdraw)?;
                check_origin(message.origin_chain, inbound.origin_chain)?;
                self.route_withdraw(state, vaults, &message, inbound.asset, inbound.amount)
            }
            HubMessage::Callback(message) => {
                check_origin(message.source_chain, inbound.origin_chain)?;
                self.route_callback(state, &message, inbound.asset, inbound.amount)
            }
        }
    }

    /// A Hub-originated leg never took effect; the escrow is back here.
    pub fn on_revert(&mut self, state: &mut ChainState, ctx: &RevertContext) -> Result<(), HubError> {
        let CompensationPayload::Hub {
            refund_to,
            origin_chain,
            operation,
        } = CompensationPayload::decode(&ctx.revert_message)?
        else {
            return Err(HubError::UnexpectedPayload);
        };
        self.tracker
            .settle(ctx.dispatch, CompensationState::RevertedPreCustody)?;
        warn!(
            dispatch = %ctx.dispatch,
            %operation,
            %refund_to,
            amount = ctx.amount,
            "leg reverted"
        );
        self.refund(state, refund_to, origin_chain, ctx.asset, ctx.amount)
    }

    /// A leg failed after its destination took custody (or its revert
    /// failed). The value has been minted to this Hub; book it for the
    /// owner to claim.
    pub fn on_abort(&mut self, ctx: &AbortContext) -> Result<(), HubError> {
        let payload = CompensationPayload::decode(&ctx.revert_message)?;
        if ctx.outgoing && ctx.sender == self.address {
            self.tracker
                .settle(ctx.dispatch, CompensationState::AbortedPostCustody)?;
        } else if !ctx.outgoing && self.registry.was_entry(ctx.origin_chain, &ctx.sender) {
            // A replaced Entry still names the user its in-flight legs owe.
            self.tracker.record_foreign(
                ctx.dispatch,
                payload.clone(),
                ctx.asset,
                ctx.amount,
                CompensationState::AbortedPostCustody,
            )?;
        } else {
            return Err(HubError::UnknownAbortSender {
                chain: ctx.origin_chain,
                sender: ctx.sender,
            });
        }

        let owner = payload.refund_target();
        let balance = self.refunds.credit(owner, ctx.asset, ctx.amount)?;
        warn!(
            dispatch = %ctx.dispatch,
            operation = %payload.operation(),
            %owner,
            asset = %ctx.asset,
            amount = ctx.amount,
            balance,
            "leg aborted, refund booked"
        );
        Ok(())
    }

    /// A Hub-originated leg took effect on its destination.
    pub fn on_delivered(&mut self, dispatch: DispatchId) -> Result<(), HubError> {
        self.tracker.settle(dispatch, CompensationState::DeliveredOk)?;
        Ok(())
    }

    /// Payout handed over by a hub-chain vault whose receiver is elsewhere.
    pub fn callback(
        &mut self,
        state: &mut ChainState,
        caller: &Address,
        asset: AssetId,
        message: &CallbackMessage,
    ) -> Result<HubOutcome, HubError> {
        let registered = self
            .registry
            .vaults()
            .any(|(key, vault)| key.chain == self.chain && vault == caller);
        if !registered {
            return Err(HubError::NotAVault(*caller));
        }
        self.route_callback(state, message, asset, message.amount)
    }

    // -- Routing ------------------------------------------------------------

    fn route_deposit(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        message: &DepositMessage,
        asset_in: AssetId,
        amount_in: u64,
    ) -> Result<HubOutcome, HubError> {
        let target_asset = self.registry.target_asset(message.target_chain)?;
        let key = VaultKey::new(message.target_chain, message.protocol, target_asset);
        let vault = self.registry.vault(&key)?;

        let amount = state.router.swap_exact_in(
            &mut state.tokens,
            &self.address,
            &asset_in,
            amount_in,
            &target_asset,
            message.min_out,
        )?;

        if message.target_chain == self.chain {
            let local = vaults.get_mut(&vault).ok_or(HubError::VaultNotDeployed(vault))?;
            let shares = local.deposit(state, &self.address, amount, message.beneficiary)?;
            return Ok(HubOutcome::Deposited {
                vault,
                beneficiary: message.beneficiary,
                shares,
            });
        }

        let gas = self.fund_gas(state, message.target_chain, message.gas_limit, &target_asset, amount)?;
        let net = amount - gas;
        if net == 0 {
            return Err(HubError::InsufficientForGas {
                needed: gas,
                available: amount,
            });
        }

        let forwarded = DepositMessage {
            amount: net,
            ..message.clone()
        };
        let dispatch = self.dispatch(
            state,
            Leg {
                destination: message.target_chain,
                receiver: vault,
                asset: target_asset,
                amount: net,
                message: Some(HubMessage::Deposit(forwarded)),
                gas_limit: message.gas_limit,
                payload: CompensationPayload::Hub {
                    refund_to: message.sender,
                    origin_chain: message.origin_chain,
                    operation: Operation::Deposit,
                },
            },
        )?;
        Ok(HubOutcome::Dispatched { dispatch, amount: net })
    }

    /// `gas_funds` of `gas_asset` came with the request to pay for the leg
    /// to the vault. What is not spent goes back to the sender.
    fn route_withdraw(
        &mut self,
        state: &mut ChainState,
        vaults: &mut BTreeMap<Address, Vault>,
        message: &WithdrawMessage,
        gas_asset: AssetId,
        gas_funds: u64,
    ) -> Result<HubOutcome, HubError> {
        let target_asset = self.registry.target_asset(message.target_chain)?;
        let key = VaultKey::new(message.target_chain, message.protocol, target_asset);
        let vault = self.registry.vault(&key)?;

        if message.target_chain == self.chain {
            let local = vaults.get_mut(&vault).ok_or(HubError::VaultNotDeployed(vault))?;
            let request = WithdrawRequest {
                owner: message.sender,
                receiver: message.receiver,
                shares: message.shares,
                destination_chain: message.destination_chain,
                gas_limit: message.gas_limit,
            };
            let receipt = local.withdraw(
                state,
                &self.address,
                &request,
                &WithdrawAuth::Signed(message.authorization.clone()),
            )?;
            let forwarded = match &receipt.payout {
                Payout::Direct { .. } => None,
                Payout::Forward { asset, message, .. } => {
                    match self.route_callback(state, message, *asset, message.amount)? {
                        HubOutcome::Dispatched { dispatch, .. } => Some(dispatch),
                        _ => None,
                    }
                }
            };
            self.refund(state, message.sender, message.origin_chain, gas_asset, gas_funds)?;
            return Ok(HubOutcome::Withdrawn {
                vault,
                receipt,
                forwarded,
            });
        }

        let gas = self.fund_gas(state, message.target_chain, message.gas_limit, &gas_asset, gas_funds)?;
        let dispatch = self.dispatch(
            state,
            Leg {
                destination: message.target_chain,
                receiver: vault,
                asset: target_asset,
                amount: 0,
                message: Some(HubMessage::Withdraw(message.clone())),
                gas_limit: message.gas_limit,
                payload: CompensationPayload::Hub {
                    refund_to: message.sender,
                    origin_chain: message.origin_chain,
                    operation: Operation::Withdraw,
                },
            },
        )?;
        self.refund(state, message.sender, message.origin_chain, gas_asset, gas_funds - gas)?;
        Ok(HubOutcome::Dispatched { dispatch, amount: 0 })
    }

    fn route_callback(
        &mut self,
        state: &mut ChainState,
        message: &CallbackMessage,
        asset: AssetId,
        amount: u64,
    ) -> Result<HubOutcome, HubError> {
        if message.destination_chain == self.chain {
            state
                .tokens
                .transfer(&asset, &self.address, &message.receiver, amount)?;
            info!(receiver = %message.receiver, %asset, amount, "payout delivered on hub chain");
            return Ok(HubOutcome::Delivered {
                receiver: message.receiver,
                amount,
            });
        }

        let target_asset = self.registry.target_asset(message.destination_chain)?;
        let converted = state
            .router
            .swap_exact_in(&mut state.tokens, &self.address, &asset, amount, &target_asset, 0)?;
        let gas = self.fund_gas(
            state,
            message.destination_chain,
            message.gas_limit,
            &target_asset,
            converted,
        )?;
        let net = converted - gas;
        if net == 0 {
            return Err(HubError::InsufficientForGas {
                needed: gas,
                available: converted,
            });
        }

        let dispatch = self.dispatch(
            state,
            Leg {
                destination: message.destination_chain,
                receiver: message.receiver,
                asset: target_asset,
                amount: net,
                message: None,
                gas_limit: message.gas_limit,
                payload: CompensationPayload::Hub {
                    refund_to: message.receiver,
                    origin_chain: message.source_chain,
                    operation: Operation::Callback,
                },
            },
        )?;
        Ok(HubOutcome::Dispatched { dispatch, amount: net })
    }

    /// Makes sure the Hub can pay gas for a leg to `destination`, buying the
    /// shortfall with `principal_asset`. Returns how much principal that
    /// cost.
    fn fund_gas(
        &self,
        state: &mut ChainState,
        destination: ChainId,
        gas_limit: u64,
        principal_asset: &AssetId,
        available: u64,
    ) -> Result<u64, HubError> {
        let Some(quote) = state.gateway.gas_quote(destination, gas_limit)? else {
            return Ok(0);
        };

        if quote.asset == *principal_asset {
            if quote.fee > available {
                return Err(HubError::InsufficientForGas {
                    needed: quote.fee,
                    available,
                });
            }
            return Ok(quote.fee);
        }

        // Balances owed to refund claimants are not float.
        let held = state.tokens.balance_of(&quote.asset, &self.address) as u128;
        let free = held.saturating_sub(self.refunds.total_for_asset(&quote.asset));
        if free >= quote.fee as u128 {
            return Ok(0);
        }
        let shortfall = quote.fee - free as u64;
        let spent = state
            .router
            .swap_exact_out(
                &mut state.tokens,
                &self.address,
                principal_asset,
                available,
                &quote.asset,
                shortfall,
            )
            .map_err(|e| match e {
                SwapError::ExcessiveInput { required, max_in } => HubError::InsufficientForGas {
                    needed: required,
                    available: max_in,
                },
                other => other.into(),
            })?;
        info!(%destination, shortfall, spent, "bought destination gas");
        Ok(spent)
    }

    fn dispatch(&mut self, state: &mut ChainState, leg: Leg) -> Result<DispatchId, HubError> {
        let message = leg.message.as_ref().map(HubMessage::encode).transpose()?;
        let request = SendRequest {
            sender: self.address,
            destination_chain: leg.destination,
            receiver: leg.receiver,
            asset: leg.asset,
            amount: leg.amount,
            message,
            gas_limit: leg.gas_limit,
            revert: RevertOptions {
                revert_address: self.address,
                call_on_revert: true,
                abort_address: self.address,
                revert_message: leg.payload.encode()?,
            },
        };
        let dispatch = state.gateway.send(&mut state.tokens, request)?;
        info!(
            %dispatch,
            operation = %leg.payload.operation(),
            destination = %leg.destination,
            receiver = %leg.receiver,
            amount = leg.amount,
            "leg dispatched"
        );
        self.tracker.open(dispatch, leg.payload, leg.asset, leg.amount);
        Ok(dispatch)
    }

    /// Returns value to `to`: paid out here if the request started on the
    /// hub chain, otherwise booked for claim.
    fn refund(
        &mut self,
        state: &mut ChainState,
        to: Address,
        origin_chain: ChainId,
        asset: AssetId,
        amount: u64,
    ) -> Result<(), HubError> {
        if amount == 0 {
            return Ok(());
        }
        if origin_chain == self.chain {
            state.tokens.transfer(&asset, &self.address, &to, amount)?;
            info!(%to, %asset, amount, "refunded on hub chain");
        } else {
            let balance = self.refunds.credit(to, asset, amount)?;
            info!(%to, %asset, amount, balance, "refund booked");
        }
        Ok(())
    }

    // -- Admin --------------------------------------------------------------

    pub fn register_vault(&mut self, caller: &Address, key: VaultKey, vault: Address) -> Result<u64, HubError> {
        self.access.only_owner(caller)?;
        let version = self.registry.set_vault(key, vault)?;
        info!(%key, %vault, version, "vault registered");
        Ok(version)
    }

    pub fn register_entry(&mut self, caller: &Address, chain: ChainId, entry: Address) -> Result<u64, HubError> {
        self.access.only_owner(caller)?;
        let version = self.registry.set_entry(chain, entry)?;
        info!(%chain, %entry, version, "entry registered");
        Ok(version)
    }

    pub fn set_target_asset(&mut self, caller: &Address, chain: ChainId, asset: AssetId) -> Result<u64, HubError> {
        self.access.only_owner(caller)?;
        let version = self.registry.set_target_asset(chain, asset)?;
        info!(%chain, %asset, version, "target asset set");
        Ok(version)
    }

    pub fn pause(&mut self, caller: &Address, direction: Direction) -> Result<(), HubError> {
        Ok(self.access.pause(caller, direction)?)
    }

    pub fn unpause(&mut self, caller: &Address, direction: Direction) -> Result<(), HubError> {
        Ok(self.access.unpause(caller, direction)?)
    }

    pub fn set_guardian(&mut self, caller: &Address, guardian: Address, enabled: bool) -> Result<(), HubError> {
        Ok(self.access.set_guardian(caller, guardian, enabled)?)
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), HubError> {
        Ok(self.access.transfer_ownership(caller, new_owner)?)
    }

    // -- Views --------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn is_paused(&self, direction: Direction) -> bool {
        self.access.is_paused(direction)
    }

    pub fn registry(&self) -> &RoutingRegistry {
        &self.registry
    }

    pub fn refunds(&self) -> &RefundLedger {
        &self.refunds
    }

    pub fn tracker(&self) -> &CompensationTracker {
        &self.tracker
    }

    /// Next nonce a relayed refund claim by `owner` must carry.
    pub fn claim_nonce(&self, owner: &Address) -> u64 {
        self.claim_nonces.get(owner).copied().unwrap_or(0)
    }
}

fn check_origin(claimed: ChainId, actual: ChainId) -> Result<(), HubError> {
    if claimed != actual {
        return Err(HubError::OriginMismatch { claimed, actual });
    }
    Ok(())
}
