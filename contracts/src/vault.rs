//! # Vault
//!
//! One vault per `(chain, protocol, asset)`. It parks principal in an
//! external [`YieldSource`] and keeps the share ledger:
//!
//! - `shares[owner]`, `total_shares` (always the sum of the former)
//! - `last_observed`, the high-water mark of the underlying position
//! - `accumulated_fee`, the performance fee owed to the vault owner
//!
//! `total_assets = underlying − accumulated_fee`. Deposits convert with
//! `floor(amount · total_shares / total_assets)`, withdrawals with
//! `ceil(shares · total_assets / total_shares)`; both refuse a zero result.
//!
//! Withdrawals are authorized either by the share owner calling directly or
//! by a signed [`WithdrawIntent`] relayed by anybody (the Hub, an Entry).
//! Signed withdrawals consume a strictly sequential per-owner nonce.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use nexus_protocol::config::{BPS_DENOMINATOR, MAX_FEE_BPS};
use nexus_protocol::crypto::{verify_signer, SignatureError, WithdrawIntent};
use nexus_protocol::ledger::LedgerError;
use nexus_protocol::lending::{LendingError, YieldSource};
use nexus_protocol::transport::InboundCall;
use nexus_protocol::types::{Address, AssetId, ChainId};
use nexus_protocol::wire::{CallbackMessage, CodecError, HubMessage, Operation, WithdrawAuthorization};

use crate::access::{AccessControl, AccessError, Direction};
use crate::chain::ChainState;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault is paused for this direction, or the caller lacks the role.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The deposit is too small to be worth a single share.
    #[error("deposit of {amount} converts to zero shares")]
    ZeroShares {
        /// Asset amount offered.
        amount: u64,
    },

    /// The withdrawal is too small to be worth a single unit of asset.
    #[error("redeeming {shares} shares converts to zero assets")]
    ZeroAssets {
        /// Shares offered for redemption.
        shares: u64,
    },

    /// The owner holds fewer shares than the withdrawal burns.
    #[error("{owner} holds {available} shares, requested {requested}")]
    InsufficientShares {
        /// Share owner.
        owner: Address,
        /// Shares the owner holds.
        available: u64,
        /// Shares the withdrawal asked to burn.
        requested: u64,
    },

    /// Shares exist but nothing backs them (total loss, or everything is fee).
    #[error("vault has {total_shares} shares outstanding and no assets")]
    NoBackingAssets {
        /// Shares in circulation.
        total_shares: u64,
    },

    /// A signed withdrawal past its deadline.
    #[error("signature expired at {deadline}, now {now}")]
    Expired {
        /// Unix seconds the signature was valid until.
        deadline: i64,
        /// Unix seconds on the vault's chain.
        now: i64,
    },

    /// A signed withdrawal for another nonce, usually a replay.
    #[error("nonce mismatch for {owner}: expected {expected}, got {got}")]
    NonceMismatch {
        /// Share owner.
        owner: Address,
        /// Next unused nonce.
        expected: u64,
        /// Nonce in the authorization.
        got: u64,
    },

    /// The withdrawal signature does not belong to the share owner.
    #[error("bad withdrawal signature: {0}")]
    Signature(#[from] SignatureError),

    /// A direct withdrawal by someone other than the share owner.
    #[error("{caller} may not withdraw for {owner}")]
    NotShareOwner {
        /// Account that called the vault.
        caller: Address,
        /// Account holding the shares.
        owner: Address,
    },

    /// A cross-chain message not sent by the Hub.
    #[error("call from {sender} on chain {chain} is not from the hub")]
    UnauthorizedSender {
        /// Chain the call came from.
        chain: ChainId,
        /// Contract that sent it.
        sender: Address,
    },

    /// A deposit carrying an asset other than the vault's own.
    #[error("expected asset {expected}, got {got}")]
    WrongAsset {
        /// The vault's asset.
        expected: AssetId,
        /// Asset delivered.
        got: AssetId,
    },

    /// A message addressed to a vault on another chain.
    #[error("message for chain {got} delivered to vault on chain {expected}")]
    WrongChain {
        /// The vault's chain.
        expected: ChainId,
        /// Target chain named in the message.
        got: ChainId,
    },

    /// A callback message delivered to a vault.
    #[error("vault does not handle {0} messages")]
    UnexpectedOperation(Operation),

    /// A fee above the vault's cap.
    #[error("fee {requested} bps exceeds maximum {max} bps")]
    FeeTooHigh {
        /// Fee asked for, in basis points.
        requested: u16,
        /// Highest fee allowed, in basis points.
        max: u16,
    },

    /// Fee withdrawal with nothing accrued.
    #[error("no fees to withdraw")]
    NoFees,

    /// The vault's own asset can only be rescued with both directions paused.
    #[error("rescue of vault asset {0} requires both directions paused")]
    RescueRefused(AssetId),

    /// The configured lending pool is missing from the chain.
    #[error("lending pool {0} not deployed on this chain")]
    PoolNotFound(Address),

    /// Share conversion overflowed 64 bits.
    #[error("share arithmetic overflow")]
    Overflow,

    /// A delivered message did not decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A token movement on the vault's chain failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The lending pool refused a supply or redeem.
    #[error(transparent)]
    Lending(#[from] LendingError),
}

impl From<bincode::Error> for VaultError {
    fn from(e: bincode::Error) -> Self {
        VaultError::Signature(SignatureError::from(e))
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Assets → shares, rounding down.
pub fn convert_to_shares(amount: u64, total_shares: u64, total_assets: u64) -> Result<u64, VaultError> {
    if amount == 0 || total_shares == 0 {
        return Ok(amount);
    }
    if total_assets == 0 {
        return Err(VaultError::NoBackingAssets { total_shares });
    }
    let shares = amount as u128 * total_shares as u128 / total_assets as u128;
    u64::try_from(shares).map_err(|_| VaultError::Overflow)
}

/// Shares → assets, rounding up.
pub fn convert_to_assets(shares: u64, total_shares: u64, total_assets: u64) -> Result<u64, VaultError> {
    if total_shares == 0 {
        return Ok(shares);
    }
    let assets = (shares as u128 * total_assets as u128).div_ceil(total_shares as u128);
    u64::try_from(assets).map_err(|_| VaultError::Overflow)
}

/// Fee owed on growth from `last_observed` to `current`.
fn fee_on_growth(current: u64, last_observed: u64, fee_bps: u16) -> u64 {
    if current <= last_observed || fee_bps == 0 {
        return 0;
    }
    let delta = (current - last_observed) as u128;
    // fee_bps <= MAX_FEE_BPS < BPS_DENOMINATOR, so the result fits in delta.
    (delta * fee_bps as u128 / BPS_DENOMINATOR as u128) as u64
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Static wiring of a vault.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultConfig {
    pub address: Address,
    pub chain: ChainId,
    /// The underlying asset, as known on this chain.
    pub asset: AssetId,
    pub pool: Address,
    pub hub: Address,
    pub hub_chain: ChainId,
    /// Where cross-chain payouts are handed off: the chain's Entry, or the
    /// Hub itself when the vault lives on the hub chain.
    pub callback: Address,
    pub owner: Address,
    pub fee_bps: u16,
}

/// A withdrawal as requested by (or on behalf of) the share owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub owner: Address,
    pub receiver: Address,
    pub shares: u64,
    pub destination_chain: ChainId,
    pub gas_limit: u64,
}

/// How a withdrawal is authorized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WithdrawAuth {
    /// The caller is the share owner.
    Owner,
    /// A relayed, signed intent.
    Signed(WithdrawAuthorization),
}

/// Where a withdrawal's assets went.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payout {
    /// Paid to the receiver on this chain.
    Direct { receiver: Address, amount: u64 },
    /// Handed to `callback` for onward delivery to another chain.
    Forward {
        callback: Address,
        asset: AssetId,
        message: CallbackMessage,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub shares: u64,
    pub assets: u64,
    pub payout: Payout,
}

/// Result of a hub-delivered call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultCall {
    Deposited { beneficiary: Address, shares: u64 },
    Withdrawn(WithdrawReceipt),
}

/// Point-in-time view for APIs and tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub address: Address,
    pub chain: ChainId,
    pub asset: AssetId,
    pub total_shares: u64,
    pub total_assets: u64,
    pub underlying: u64,
    pub accumulated_fee: u64,
    pub last_observed: u64,
    pub fee_bps: u16,
    pub deposits_paused: bool,
    pub withdrawals_paused: bool,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vault {
    address: Address,
    chain: ChainId,
    asset: AssetId,
    pool: Address,
    hub: Address,
    hub_chain: ChainId,
    callback: Address,
    access: AccessControl,
    shares: BTreeMap<Address, u64>,
    total_shares: u64,
    last_observed: u64,
    accumulated_fee: u64,
    fee_bps: u16,
    nonces: BTreeMap<Address, u64>,
}

impl Vault {
    pub fn new(config: VaultConfig) -> Result<Self, VaultError> {
        if config.fee_bps > MAX_FEE_BPS {
            return Err(VaultError::FeeTooHigh {
                requested: config.fee_bps,
                max: MAX_FEE_BPS,
            });
        }
        Ok(Self {
            address: config.address,
            chain: config.chain,
            asset: config.asset,
            pool: config.pool,
            hub: config.hub,
            hub_chain: config.hub_chain,
            callback: config.callback,
            access: AccessControl::new(config.owner),
            shares: BTreeMap::new(),
            total_shares: 0,
            last_observed: 0,
            accumulated_fee: 0,
            fee_bps: config.fee_bps,
            nonces: BTreeMap::new(),
        })
    }

    // -- User surface -------------------------------------------------------

    /// Deposits `amount` taken from `source` and mints shares to
    /// `beneficiary`. `source` may be the vault itself for value that
    /// already arrived with a cross-chain call.
    pub fn deposit(
        &mut self,
        state: &mut ChainState,
        source: &Address,
        amount: u64,
        beneficiary: Address,
    ) -> Result<u64, VaultError> {
        self.access.ensure_active(Direction::Deposit)?;
        self.accrue(state)?;

        let shares = convert_to_shares(amount, self.total_shares, self.accrued_total_assets(state)?)?;
        if shares == 0 {
            return Err(VaultError::ZeroShares { amount });
        }

        state.tokens.transfer(&self.asset, source, &self.address, amount)?;
        let pool = state
            .pools
            .get_mut(&self.pool)
            .ok_or(VaultError::PoolNotFound(self.pool))?;
        pool.supply(&mut state.tokens, &self.address, amount)?;
        self.last_observed = pool.balance_of(&self.address);

        self.mint(beneficiary, shares)?;
        info!(
            vault = %self.address,
            chain = %self.chain,
            %beneficiary,
            amount,
            shares,
            "deposit"
        );
        Ok(shares)
    }

    /// Burns `request.shares` of `request.owner` and pays out the assets.
    pub fn withdraw(
        &mut self,
        state: &mut ChainState,
        caller: &Address,
        request: &WithdrawRequest,
        auth: &WithdrawAuth,
    ) -> Result<WithdrawReceipt, VaultError> {
        self.access.ensure_active(Direction::Withdraw)?;
        self.authorize(state, caller, request, auth)?;

        let available = self.share_balance(&request.owner);
        if request.shares > available {
            return Err(VaultError::InsufficientShares {
                owner: request.owner,
                available,
                requested: request.shares,
            });
        }

        self.accrue(state)?;
        let assets = convert_to_assets(request.shares, self.total_shares, self.accrued_total_assets(state)?)?;
        if assets == 0 {
            return Err(VaultError::ZeroAssets {
                shares: request.shares,
            });
        }

        self.burn(request.owner, request.shares)?;
        let pool = state
            .pools
            .get_mut(&self.pool)
            .ok_or(VaultError::PoolNotFound(self.pool))?;
        pool.withdraw(&mut state.tokens, &self.address, assets, &self.address)?;
        self.last_observed = pool.balance_of(&self.address);

        let payout = if request.destination_chain == self.chain {
            state
                .tokens
                .transfer(&self.asset, &self.address, &request.receiver, assets)?;
            Payout::Direct {
                receiver: request.receiver,
                amount: assets,
            }
        } else {
            state
                .tokens
                .transfer(&self.asset, &self.address, &self.callback, assets)?;
            Payout::Forward {
                callback: self.callback,
                asset: self.asset,
                message: CallbackMessage {
                    sender: request.owner,
                    receiver: request.receiver,
                    source_chain: self.chain,
                    destination_chain: request.destination_chain,
                    amount: assets,
                    gas_limit: request.gas_limit,
                },
            }
        };

        info!(
            vault = %self.address,
            chain = %self.chain,
            owner = %request.owner,
            shares = request.shares,
            assets,
            destination = %request.destination_chain,
            "withdraw"
        );
        Ok(WithdrawReceipt {
            shares: request.shares,
            assets,
            payout,
        })
    }

    /// Handles a leg delivered by the transport. Only the Hub may call.
    pub fn on_call(&mut self, state: &mut ChainState, inbound: &InboundCall) -> Result<VaultCall, VaultError> {
        if inbound.origin_chain != self.hub_chain || inbound.sender != self.hub {
            return Err(VaultError::UnauthorizedSender {
                chain: inbound.origin_chain,
                sender: inbound.sender,
            });
        }

        match HubMessage::decode(&inbound.message)? {
            HubMessage::Deposit(message) => {
                if message.target_chain != self.chain {
                    return Err(VaultError::WrongChain {
                        expected: self.chain,
                        got: message.target_chain,
                    });
                }
                if inbound.asset != self.asset {
                    return Err(VaultError::WrongAsset {
                        expected: self.asset,
                        got: inbound.asset,
                    });
                }
                let vault = self.address;
                let shares = self.deposit(state, &vault, inbound.amount, message.beneficiary)?;
                Ok(VaultCall::Deposited {
                    beneficiary: message.beneficiary,
                    shares,
                })
            }
            HubMessage::Withdraw(message) => {
                if message.target_chain != self.chain {
                    return Err(VaultError::WrongChain {
                        expected: self.chain,
                        got: message.target_chain,
                    });
                }
                let request = WithdrawRequest {
                    owner: message.sender,
                    receiver: message.receiver,
                    shares: message.shares,
                    destination_chain: message.destination_chain,
                    gas_limit: message.gas_limit,
                };
                let receipt = self.withdraw(
                    state,
                    &inbound.sender,
                    &request,
                    &WithdrawAuth::Signed(message.authorization),
                )?;
                Ok(VaultCall::Withdrawn(receipt))
            }
            HubMessage::Callback(_) => Err(VaultError::UnexpectedOperation(Operation::Callback)),
        }
    }

    // -- Accounting ---------------------------------------------------------

    /// Books the performance fee on growth since the last observation.
    fn accrue(&mut self, state: &ChainState) -> Result<(), VaultError> {
        let current = self.underlying(state)?;
        if current > self.last_observed {
            let fee = fee_on_growth(current, self.last_observed, self.fee_bps);
            self.accumulated_fee = self
                .accumulated_fee
                .checked_add(fee)
                .ok_or(VaultError::Overflow)?;
            debug!(
                vault = %self.address,
                growth = current - self.last_observed,
                fee,
                "yield accrued"
            );
            self.last_observed = current;
        }
        Ok(())
    }

    /// `underlying − accumulated_fee`, with accrual already applied.
    fn accrued_total_assets(&self, state: &ChainState) -> Result<u64, VaultError> {
        Ok(self.underlying(state)?.saturating_sub(self.accumulated_fee))
    }

    fn authorize(
        &mut self,
        state: &ChainState,
        caller: &Address,
        request: &WithdrawRequest,
        auth: &WithdrawAuth,
    ) -> Result<(), VaultError> {
        match auth {
            WithdrawAuth::Owner => {
                if *caller != request.owner {
                    return Err(VaultError::NotShareOwner {
                        caller: *caller,
                        owner: request.owner,
                    });
                }
                Ok(())
            }
            WithdrawAuth::Signed(authorization) => {
                let now = state.now.timestamp();
                if now > authorization.deadline {
                    return Err(VaultError::Expired {
                        deadline: authorization.deadline,
                        now,
                    });
                }
                let expected = self.nonce_of(&request.owner);
                if authorization.nonce != expected {
                    return Err(VaultError::NonceMismatch {
                        owner: request.owner,
                        expected,
                        got: authorization.nonce,
                    });
                }
                let intent = WithdrawIntent {
                    chain: self.chain,
                    vault: self.address,
                    sender: request.owner,
                    receiver: request.receiver,
                    shares: request.shares,
                    destination_chain: request.destination_chain,
                    nonce: authorization.nonce,
                    deadline: authorization.deadline,
                };
                verify_signer(
                    &request.owner,
                    &intent.digest()?,
                    &authorization.signature,
                    &state.wallets,
                )?;
                self.nonces.insert(request.owner, expected + 1);
                Ok(())
            }
        }
    }

    fn mint(&mut self, owner: Address, shares: u64) -> Result<(), VaultError> {
        let total = self
            .total_shares
            .checked_add(shares)
            .ok_or(VaultError::Overflow)?;
        let balance = self.share_balance(&owner) + shares;
        self.shares.insert(owner, balance);
        self.total_shares = total;
        Ok(())
    }

    fn burn(&mut self, owner: Address, shares: u64) -> Result<(), VaultError> {
        let available = self.share_balance(&owner);
        let remaining = available
            .checked_sub(shares)
            .ok_or(VaultError::InsufficientShares {
                owner,
                available,
                requested: shares,
            })?;
        if remaining == 0 {
            self.shares.remove(&owner);
        } else {
            self.shares.insert(owner, remaining);
        }
        self.total_shares -= shares;
        Ok(())
    }

    // -- Admin --------------------------------------------------------------

    /// Accrues at the old rate first, so a new rate only prices future yield.
    pub fn set_fee(&mut self, state: &ChainState, caller: &Address, fee_bps: u16) -> Result<(), VaultError> {
        self.access.only_owner(caller)?;
        if fee_bps > MAX_FEE_BPS {
            return Err(VaultError::FeeTooHigh {
                requested: fee_bps,
                max: MAX_FEE_BPS,
            });
        }
        self.accrue(state)?;
        info!(vault = %self.address, from = self.fee_bps, to = fee_bps, "fee updated");
        self.fee_bps = fee_bps;
        Ok(())
    }

    /// Pays the accumulated fee to `recipient`. Returns the amount.
    pub fn withdraw_fees(
        &mut self,
        state: &mut ChainState,
        caller: &Address,
        recipient: Address,
    ) -> Result<u64, VaultError> {
        self.access.only_owner(caller)?;
        self.accrue(state)?;
        // After a loss the booked fee can exceed the position.
        let amount = self.accumulated_fee.min(self.underlying(state)?);
        if amount == 0 {
            return Err(VaultError::NoFees);
        }
        let pool = state
            .pools
            .get_mut(&self.pool)
            .ok_or(VaultError::PoolNotFound(self.pool))?;
        pool.withdraw(&mut state.tokens, &self.address, amount, &recipient)?;
        self.last_observed = pool.balance_of(&self.address);
        self.accumulated_fee -= amount;
        info!(vault = %self.address, %recipient, amount, "fees withdrawn");
        Ok(amount)
    }

    /// Moves tokens the vault holds outright (not supplied) to `to`.
    pub fn rescue(
        &mut self,
        state: &mut ChainState,
        caller: &Address,
        asset: AssetId,
        amount: u64,
        to: Address,
    ) -> Result<(), VaultError> {
        self.access.only_owner(caller)?;
        if asset == self.asset && !self.access.fully_paused() {
            return Err(VaultError::RescueRefused(asset));
        }
        state.tokens.transfer(&asset, &self.address, &to, amount)?;
        info!(vault = %self.address, %asset, amount, %to, "tokens rescued");
        Ok(())
    }

    pub fn pause(&mut self, caller: &Address, direction: Direction) -> Result<(), VaultError> {
        Ok(self.access.pause(caller, direction)?)
    }

    pub fn unpause(&mut self, caller: &Address, direction: Direction) -> Result<(), VaultError> {
        Ok(self.access.unpause(caller, direction)?)
    }

    pub fn set_guardian(&mut self, caller: &Address, guardian: Address, enabled: bool) -> Result<(), VaultError> {
        Ok(self.access.set_guardian(caller, guardian, enabled)?)
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), VaultError> {
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

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn share_balance(&self, owner: &Address) -> u64 {
        self.shares.get(owner).copied().unwrap_or(0)
    }

    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    /// Next nonce a signed withdrawal by `owner` must carry.
    pub fn nonce_of(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    pub fn is_paused(&self, direction: Direction) -> bool {
        self.access.is_paused(direction)
    }

    /// Current value of the vault's position in the yield source.
    pub fn underlying(&self, state: &ChainState) -> Result<u64, VaultError> {
        state
            .pools
            .get(&self.pool)
            .map(|pool| pool.balance_of(&self.address))
            .ok_or(VaultError::PoolNotFound(self.pool))
    }

    /// Fee including growth not yet booked.
    pub fn accumulated_fee(&self, state: &ChainState) -> Result<u64, VaultError> {
        let pending = fee_on_growth(self.underlying(state)?, self.last_observed, self.fee_bps);
        self.accumulated_fee
            .checked_add(pending)
            .ok_or(VaultError::Overflow)
    }

    pub fn total_assets(&self, state: &ChainState) -> Result<u64, VaultError> {
        Ok(self
            .underlying(state)?
            .saturating_sub(self.accumulated_fee(state)?))
    }

    /// Shares a deposit of `amount` would mint right now.
    pub fn preview_deposit(&self, state: &ChainState, amount: u64) -> Result<u64, VaultError> {
        convert_to_shares(amount, self.total_shares, self.total_assets(state)?)
    }

    /// Assets redeeming `shares` would pay right now.
    pub fn preview_redeem(&self, state: &ChainState, shares: u64) -> Result<u64, VaultError> {
        convert_to_assets(shares, self.total_shares, self.total_assets(state)?)
    }

    /// Sum of every owner's shares. Equal to `total_shares` at all times.
    pub fn sum_of_balances(&self) -> u128 {
        self.shares.values().map(|s| *s as u128).sum()
    }

    pub fn snapshot(&self, state: &ChainState) -> Result<VaultSnapshot, VaultError> {
        Ok(VaultSnapshot {
            address: self.address,
            chain: self.chain,
            asset: self.asset,
            total_shares: self.total_shares,
            total_assets: self.total_assets(state)?,
            underlying: self.underlying(state)?,
            accumulated_fee: self.accumulated_fee(state)?,
            last_observed: self.last_observed,
            fee_bps: self.fee_bps,
            deposits_paused: self.is_paused(Direction::Deposit),
            withdrawals_paused: self.is_paused(Direction::Withdraw),
        })
    }
}
