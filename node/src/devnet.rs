//! # Devnet
//!
//! Builds a [`LocalNetwork`] from a [`Topology`] and offers the operations
//! the API exposes: deposits, withdrawals, relaying, yield, fault injection
//! and refund claims. Requests name users by devnet key label, so the node
//! can sign withdrawal authorizations on their behalf.

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use nexus_contracts::chain::{CallOutcome, Chain, ChainError, ChainState};
use nexus_contracts::compensation::CompensationState;
use nexus_contracts::entry::{Entry, EntryConfig, EntryOutcome};
use nexus_contracts::hub::{Hub, HubConfig, HubOutcome};
use nexus_contracts::network::{
    AssetBridge, DeliveryOutcome, DeliveryReport, Fault, LocalNetwork, NetworkError,
};
use nexus_contracts::vault::{Vault, VaultCall, VaultConfig, VaultSnapshot};
use nexus_protocol::crypto::{Keypair, WithdrawIntent};
use nexus_protocol::lending::{LendingError, LendingPool};
use nexus_protocol::swap::Rate;
use nexus_protocol::transport::GasPrice;
use nexus_protocol::types::{Address, AssetId, ChainId, DispatchId, VaultKey};
use nexus_protocol::wire::{CallContext, DepositContext, WithdrawAuthorization, WithdrawContext};

use crate::topology::{account_address, ChainSpec, Topology};

/// How long a node-signed withdrawal authorization stays valid.
const AUTHORIZATION_TTL_SECS: i64 = 3_600;

#[derive(Debug, Error)]
pub enum DevnetError {
    #[error("unknown chain {0}")]
    UnknownChain(ChainId),

    #[error("chain {0} has no vault")]
    NoVault(ChainId),

    #[error(transparent)]
    Rejected(#[from] ChainError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("yield source rejected the accrual: {0}")]
    Yield(#[from] LendingError),

    #[error("failed to sign authorization: {0}")]
    Signing(String),
}

// ---------------------------------------------------------------------------
// Requests / Views
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Chain the deposit is made on.
    pub chain: ChainId,
    pub user: String,
    pub amount: u64,
    pub target_chain: ChainId,
    /// Defaults to the user.
    #[serde(default)]
    pub beneficiary: Option<String>,
    #[serde(default)]
    pub gas_limit: u64,
    #[serde(default)]
    pub min_out: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Chain the request is made on.
    pub chain: ChainId,
    pub user: String,
    pub shares: u64,
    /// Chain hosting the vault.
    pub target_chain: ChainId,
    /// Chain the assets are paid out on.
    pub destination_chain: ChainId,
    /// Defaults to the user.
    #[serde(default)]
    pub receiver: Option<String>,
    /// Stable attached to pay for the hub-to-vault leg.
    #[serde(default)]
    pub gas_amount: u64,
    #[serde(default)]
    pub gas_limit: u64,
}

/// What a submitted request did on its first chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmitReceipt {
    Deposited {
        vault: Option<Address>,
        beneficiary: Address,
        shares: u64,
    },
    Withdrawn {
        vault: Option<Address>,
        shares: u64,
        assets: u64,
        forwarded: Option<DispatchId>,
    },
    Delivered {
        receiver: Address,
        amount: u64,
    },
    Dispatched {
        dispatch: DispatchId,
        amount: Option<u64>,
    },
}

impl From<&CallOutcome> for SubmitReceipt {
    fn from(outcome: &CallOutcome) -> Self {
        match outcome {
            CallOutcome::Entry(EntryOutcome::Deposited {
                vault,
                beneficiary,
                shares,
            })
            | CallOutcome::Hub(HubOutcome::Deposited {
                vault,
                beneficiary,
                shares,
            }) => SubmitReceipt::Deposited {
                vault: Some(*vault),
                beneficiary: *beneficiary,
                shares: *shares,
            },
            CallOutcome::Entry(EntryOutcome::Withdrawn {
                vault,
                receipt,
                forwarded,
            })
            | CallOutcome::Hub(HubOutcome::Withdrawn {
                vault,
                receipt,
                forwarded,
            }) => SubmitReceipt::Withdrawn {
                vault: Some(*vault),
                shares: receipt.shares,
                assets: receipt.assets,
                forwarded: *forwarded,
            },
            CallOutcome::Entry(EntryOutcome::Dispatched(dispatch)) => SubmitReceipt::Dispatched {
                dispatch: *dispatch,
                amount: None,
            },
            CallOutcome::Hub(HubOutcome::Dispatched { dispatch, amount }) => {
                SubmitReceipt::Dispatched {
                    dispatch: *dispatch,
                    amount: Some(*amount),
                }
            }
            CallOutcome::Hub(HubOutcome::Delivered { receiver, amount }) => {
                SubmitReceipt::Delivered {
                    receiver: *receiver,
                    amount: *amount,
                }
            }
            CallOutcome::Vault { call, forwarded } => match call {
                VaultCall::Deposited {
                    beneficiary,
                    shares,
                } => SubmitReceipt::Deposited {
                    vault: None,
                    beneficiary: *beneficiary,
                    shares: *shares,
                },
                VaultCall::Withdrawn(receipt) => SubmitReceipt::Withdrawn {
                    vault: None,
                    shares: receipt.shares,
                    assets: receipt.assets,
                    forwarded: *forwarded,
                },
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub id: ChainId,
    pub name: String,
    pub hub: bool,
    pub entry: Option<Address>,
    pub vaults: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerCounts {
    pub pending: usize,
    pub delivered: usize,
    pub reverted: usize,
    pub aborted: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevnetStatus {
    pub name: String,
    pub hub_chain: ChainId,
    pub time: i64,
    pub pending_legs: usize,
    pub registry_version: u64,
    pub refund_entries: usize,
    pub legs: TrackerCounts,
    pub chains: Vec<ChainStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEntry {
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub chain: ChainId,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub chain: ChainId,
    pub vault: Address,
    pub shares: u64,
    pub nonce: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub address: Address,
    pub holdings: Vec<Holding>,
    pub positions: Vec<Position>,
    pub refunds: Vec<RefundEntry>,
}

// ---------------------------------------------------------------------------
// Devnet
// ---------------------------------------------------------------------------

pub struct Devnet {
    topology: Topology,
    net: LocalNetwork,
    hub: Address,
}

impl Devnet {
    /// Deploys every contract the topology describes and mints the seed
    /// balances. The topology must already be valid.
    pub fn build(topology: &Topology) -> anyhow::Result<Self> {
        let hub_chain = topology.hub_chain;
        let hub_spec = topology.hub().context("hub chain is not in the topology")?;
        let owner = Address::derive(&topology.owner);
        let hub_address = Address::derive("hub");

        let mut bridge = AssetBridge::new();
        for spoke in topology.spokes() {
            bridge.link(&[
                (spoke.id, spoke.stable_asset()),
                (hub_chain, spoke.hub_asset(hub_chain)),
            ]);
        }
        let mut net = LocalNetwork::new(hub_chain, bridge);

        // Hub chain: router, gas pricing, gas float.
        let mut hub_state = ChainState::new(hub_chain);
        let stables: Vec<AssetId> = topology
            .chains
            .iter()
            .map(|c| c.hub_asset(hub_chain))
            .collect();
        let mut traded = stables.clone();
        for (i, a) in stables.iter().enumerate() {
            for b in &stables[i + 1..] {
                hub_state.router.set_pair(*a, *b, Rate::PAR);
            }
        }
        for spoke in topology.spokes() {
            let (Some(gas), Some(gas_asset)) = (&spoke.gas, spoke.gas_asset()) else {
                continue;
            };
            for stable in &stables {
                hub_state.router.set_pair(*stable, gas_asset, gas.rate);
            }
            hub_state.gateway.set_gas_price(
                spoke.id,
                GasPrice {
                    asset: gas_asset,
                    per_gas: gas.per_gas,
                },
            );
            hub_state
                .tokens
                .mint(&gas_asset, &hub_address, topology.gas_float)
                .with_context(|| format!("failed to fund gas float for {}", spoke.name))?;
            traded.push(gas_asset);
        }
        let router = hub_state.router.address();
        for asset in &traded {
            hub_state
                .tokens
                .mint(asset, &router, topology.router_reserve)
                .context("failed to fund router reserves")?;
        }

        let mut hub = Hub::new(HubConfig {
            address: hub_address,
            chain: hub_chain,
            owner,
        });
        for guardian in &topology.guardians {
            hub.set_guardian(&owner, Address::derive(guardian), true)
                .context("failed to set guardian")?;
        }
        for chain in &topology.chains {
            hub.set_target_asset(&owner, chain.id, chain.hub_asset(hub_chain))
                .with_context(|| format!("failed to set target asset of {}", chain.name))?;
            if chain.id != hub_chain && chain.entry {
                hub.register_entry(&owner, chain.id, chain.entry_address())
                    .with_context(|| format!("failed to register entry on {}", chain.name))?;
            }
            if chain.vault.is_some() {
                let key = VaultKey::new(chain.id, topology.protocol, chain.hub_asset(hub_chain));
                hub.register_vault(&owner, key, chain.vault_address())
                    .with_context(|| format!("failed to register vault on {}", chain.name))?;
            }
        }

        let mut hub_chain_env = Chain::new(hub_state);
        hub_chain_env.deploy_hub(hub);
        deploy_vault(&mut hub_chain_env, hub_spec, topology, hub_address, owner)?;
        net.add_chain(hub_chain_env);

        for spoke in topology.spokes() {
            let mut chain = Chain::new(ChainState::new(spoke.id));
            if spoke.entry {
                let mut entry = Entry::new(EntryConfig {
                    address: spoke.entry_address(),
                    chain: spoke.id,
                    hub: hub_address,
                    hub_chain,
                    asset: spoke.stable_asset(),
                    owner,
                });
                if spoke.vault.is_some() {
                    entry
                        .register_vault(&owner, topology.protocol, spoke.vault_address())
                        .with_context(|| format!("failed to wire vault on {}", spoke.name))?;
                }
                chain.deploy_entry(entry);
            }
            deploy_vault(&mut chain, spoke, topology, hub_address, owner)?;
            net.add_chain(chain);
        }

        for seed in &topology.balances {
            let spec = topology
                .chain(seed.chain)
                .with_context(|| format!("unknown chain {} in balances", seed.chain))?;
            net.chain_mut(seed.chain)?
                .state
                .tokens
                .mint(&spec.stable_asset(), &account_address(&seed.account), seed.amount)
                .with_context(|| format!("failed to seed {}", seed.account))?;
        }

        net.set_time(Utc::now());
        info!(
            name = %topology.name,
            chains = topology.chains.len(),
            hub_chain = %hub_chain,
            "devnet built"
        );

        Ok(Self {
            topology: topology.clone(),
            net,
            hub: hub_address,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn network(&self) -> &LocalNetwork {
        &self.net
    }

    pub fn hub_address(&self) -> Address {
        self.hub
    }

    fn spec(&self, chain: ChainId) -> Result<&ChainSpec, DevnetError> {
        self.topology
            .chain(chain)
            .ok_or(DevnetError::UnknownChain(chain))
    }

    fn hub(&self) -> Result<&Hub, DevnetError> {
        let hub_chain = self.net.hub_chain();
        self.net
            .chain(hub_chain)?
            .hub()
            .ok_or(DevnetError::Rejected(ChainError::NoHub(hub_chain)))
    }

    /// Moves every chain's clock to the wall clock.
    pub fn tick(&mut self) {
        self.net.set_time(Utc::now());
    }

    pub fn deposit(&mut self, req: &DepositRequest) -> Result<SubmitReceipt, DevnetError> {
        let spec = self.spec(req.chain)?;
        let user = account_address(&req.user);
        let beneficiary = req
            .beneficiary
            .as_deref()
            .map(account_address)
            .unwrap_or(user);
        let ctx = CallContext::Deposit(DepositContext {
            target_chain: req.target_chain,
            protocol: self.topology.protocol,
            beneficiary,
            asset: spec.stable_asset(),
            amount: req.amount,
            gas_limit: req.gas_limit,
            min_out: req.min_out,
        });

        let outcome = self.net.chain_mut(req.chain)?.submit(&user, &ctx)?;
        info!(
            chain = %req.chain,
            target = %req.target_chain,
            %user,
            amount = req.amount,
            "deposit accepted"
        );
        Ok(SubmitReceipt::from(&outcome))
    }

    /// Signs a withdrawal with the user's devnet key and submits it.
    pub fn withdraw(&mut self, req: &WithdrawRequest) -> Result<SubmitReceipt, DevnetError> {
        let origin = self.spec(req.chain)?;
        let gas_asset = origin.stable_asset();
        let target = self.spec(req.target_chain)?;
        if target.vault.is_none() {
            return Err(DevnetError::NoVault(req.target_chain));
        }
        let vault_address = target.vault_address();

        let key = Keypair::from_label(&req.user);
        let user = key.address();
        let receiver = req
            .receiver
            .as_deref()
            .map(account_address)
            .unwrap_or(user);

        let vault_chain = self.net.chain(req.target_chain)?;
        let nonce = vault_chain
            .vault(&vault_address)
            .ok_or(DevnetError::NoVault(req.target_chain))?
            .nonce_of(&user);
        let deadline = vault_chain.state.now.timestamp() + AUTHORIZATION_TTL_SECS;

        let intent = WithdrawIntent {
            chain: req.target_chain,
            vault: vault_address,
            sender: user,
            receiver,
            shares: req.shares,
            destination_chain: req.destination_chain,
            nonce,
            deadline,
        };
        let signature = intent
            .sign(&key)
            .map_err(|e| DevnetError::Signing(e.to_string()))?;

        let ctx = CallContext::Withdraw(WithdrawContext {
            target_chain: req.target_chain,
            protocol: self.topology.protocol,
            receiver,
            shares: req.shares,
            destination_chain: req.destination_chain,
            gas_asset,
            gas_amount: req.gas_amount,
            gas_limit: req.gas_limit,
            authorization: WithdrawAuthorization {
                nonce,
                deadline,
                signature: signature.into_bytes(),
            },
        });

        let outcome = self.net.chain_mut(req.chain)?.submit(&user, &ctx)?;
        info!(
            chain = %req.chain,
            target = %req.target_chain,
            destination = %req.destination_chain,
            %user,
            shares = req.shares,
            "withdrawal accepted"
        );
        Ok(SubmitReceipt::from(&outcome))
    }

    /// Delivers every pending leg, including the ones deliveries create.
    pub fn deliver(&mut self) -> Result<Vec<DeliveryReport>, DevnetError> {
        let reports = self.net.deliver_all()?;
        for report in &reports {
            match &report.outcome {
                DeliveryOutcome::Delivered => {}
                other => warn!(
                    dispatch = %report.dispatch,
                    origin = %report.origin,
                    destination = %report.destination,
                    outcome = other.label(),
                    "leg did not deliver"
                ),
            }
        }
        Ok(reports)
    }

    pub fn inject_fault(&mut self, chain: ChainId, fault: Fault) -> Result<(), DevnetError> {
        self.spec(chain)?;
        self.net.inject_fault(chain, fault);
        warn!(%chain, ?fault, "fault injected");
        Ok(())
    }

    /// Grows the vault's lending position on `chain`.
    pub fn add_yield(&mut self, chain: ChainId, amount: u64) -> Result<VaultSnapshot, DevnetError> {
        let spec = self.spec(chain)?;
        if spec.vault.is_none() {
            return Err(DevnetError::NoVault(chain));
        }
        let (vault, pool) = (spec.vault_address(), spec.pool_address());

        let env = self.net.chain_mut(chain)?;
        let state = &mut env.state;
        state
            .pools
            .get_mut(&pool)
            .ok_or(DevnetError::NoVault(chain))?
            .accrue_interest(&mut state.tokens, &vault, amount)?;
        info!(%chain, amount, "yield added");

        let snapshot = env
            .vault(&vault)
            .ok_or(DevnetError::NoVault(chain))?
            .snapshot(&env.state)
            .map_err(ChainError::from)?;
        Ok(snapshot)
    }

    /// Pays `user`'s refund balance of `asset` on the hub chain.
    pub fn claim(&mut self, user: &str, asset: AssetId) -> Result<u64, DevnetError> {
        let user = account_address(user);
        let hub_chain = self.net.hub_chain();
        let paid = self.net.chain_mut(hub_chain)?.claim_refund(&user, asset)?;
        Ok(paid)
    }

    pub fn vaults(&self) -> Result<Vec<VaultSnapshot>, DevnetError> {
        let mut out = Vec::new();
        for chain in self.net.chains() {
            for vault in chain.vaults() {
                out.push(vault.snapshot(&chain.state).map_err(ChainError::from)?);
            }
        }
        Ok(out)
    }

    pub fn refunds(&self, account: &Address) -> Result<Vec<RefundEntry>, DevnetError> {
        Ok(self
            .hub()?
            .refunds()
            .entries_for(account)
            .into_iter()
            .map(|(asset, amount)| RefundEntry { asset, amount })
            .collect())
    }

    pub fn account(&self, address: Address) -> Result<AccountView, DevnetError> {
        let mut holdings = Vec::new();
        let mut positions = Vec::new();
        for chain in self.net.chains() {
            for (asset, amount) in chain.state.tokens.holdings(&address) {
                holdings.push(Holding {
                    chain: chain.id(),
                    asset,
                    amount,
                });
            }
            for vault in chain.vaults() {
                let shares = vault.share_balance(&address);
                let nonce = vault.nonce_of(&address);
                if shares > 0 || nonce > 0 {
                    positions.push(Position {
                        chain: chain.id(),
                        vault: vault.address(),
                        shares,
                        nonce,
                    });
                }
            }
        }
        Ok(AccountView {
            address,
            holdings,
            positions,
            refunds: self.refunds(&address)?,
        })
    }

    pub fn status(&self) -> Result<DevnetStatus, DevnetError> {
        let hub = self.hub()?;
        let tracker = hub.tracker();
        let hub_chain = self.net.hub_chain();
        let time = self.net.chain(hub_chain)?.state.now.timestamp();

        let chains = self
            .net
            .chains()
            .map(|chain| ChainStatus {
                id: chain.id(),
                name: self
                    .topology
                    .chain(chain.id())
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                hub: chain.id() == hub_chain,
                entry: chain.entry().map(|e| e.address()),
                vaults: chain.vaults().count(),
            })
            .collect();

        Ok(DevnetStatus {
            name: self.topology.name.clone(),
            hub_chain,
            time,
            pending_legs: self.net.pending(),
            registry_version: hub.registry().version(),
            refund_entries: hub.refunds().len(),
            legs: TrackerCounts {
                pending: tracker.pending(),
                delivered: tracker.count(CompensationState::DeliveredOk),
                reverted: tracker.count(CompensationState::RevertedPreCustody),
                aborted: tracker.count(CompensationState::AbortedPostCustody),
            },
            chains,
        })
    }
}

fn deploy_vault(
    chain: &mut Chain,
    spec: &ChainSpec,
    topology: &Topology,
    hub: Address,
    owner: Address,
) -> anyhow::Result<()> {
    let Some(vault) = &spec.vault else {
        return Ok(());
    };
    let pool = spec.pool_address();
    chain
        .state
        .pools
        .insert(pool, LendingPool::new(pool, spec.stable_asset()));
    let callback = if spec.id == topology.hub_chain {
        hub
    } else {
        spec.entry_address()
    };
    let vault = Vault::new(VaultConfig {
        address: spec.vault_address(),
        chain: spec.id,
        asset: spec.stable_asset(),
        pool,
        hub,
        hub_chain: topology.hub_chain,
        callback,
        owner,
        fee_bps: vault.fee_bps,
    })
    .with_context(|| format!("failed to deploy vault on {}", spec.name))?;
    chain.deploy_vault(vault);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_protocol::config::{DEVNET_BSC, DEVNET_ETHEREUM, DEVNET_HUB_CHAIN};

    fn devnet() -> Devnet {
        Devnet::build(&Topology::devnet()).unwrap()
    }

    fn deposit(chain: ChainId, user: &str, amount: u64, target: ChainId) -> DepositRequest {
        DepositRequest {
            chain,
            user: user.into(),
            amount,
            target_chain: target,
            beneficiary: None,
            gas_limit: 50,
            min_out: 0,
        }
    }

    fn withdraw(chain: ChainId, user: &str, shares: u64, target: ChainId, to: ChainId) -> WithdrawRequest {
        WithdrawRequest {
            chain,
            user: user.into(),
            shares,
            target_chain: target,
            destination_chain: to,
            receiver: None,
            gas_amount: 0,
            gas_limit: 50,
        }
    }

    #[test]
    fn builds_every_chain_with_seed_balances() {
        let net = devnet();
        let status = net.status().unwrap();
        assert_eq!(status.chains.len(), 3);
        assert_eq!(status.pending_legs, 0);
        assert_eq!(net.vaults().unwrap().len(), 2);

        let alice = net.account(account_address("alice")).unwrap();
        assert_eq!(
            alice.holdings,
            vec![Holding {
                chain: DEVNET_ETHEREUM,
                asset: Address::derive("usdc.eth"),
                amount: 100_000,
            }]
        );
    }

    #[test]
    fn cross_chain_round_trip() {
        let mut net = devnet();
        let receipt = net
            .deposit(&deposit(DEVNET_ETHEREUM, "alice", 1_000, DEVNET_BSC))
            .unwrap();
        assert!(matches!(receipt, SubmitReceipt::Dispatched { amount: None, .. }));

        let reports = net.deliver().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.outcome == DeliveryOutcome::Delivered));

        let alice = account_address("alice");
        let view = net.account(alice).unwrap();
        assert_eq!(view.positions.len(), 1);
        assert_eq!(view.positions[0].shares, 1_000);

        net.withdraw(&withdraw(DEVNET_ETHEREUM, "alice", 1_000, DEVNET_BSC, DEVNET_ETHEREUM))
            .unwrap();
        net.deliver().unwrap();

        let view = net.account(alice).unwrap();
        assert_eq!(view.positions[0].shares, 0);
        assert_eq!(view.positions[0].nonce, 1);
        let usdc_eth = Address::derive("usdc.eth");
        assert!(view
            .holdings
            .iter()
            .any(|h| h.asset == usdc_eth && h.amount == 100_000));
        assert_eq!(net.status().unwrap().legs.pending, 0);
    }

    #[test]
    fn same_chain_deposit_settles_immediately() {
        let mut net = devnet();
        let receipt = net
            .deposit(&deposit(DEVNET_BSC, "bob", 500, DEVNET_BSC))
            .unwrap();
        assert_eq!(
            receipt,
            SubmitReceipt::Deposited {
                vault: Some(Address::derive("vault.bsc")),
                beneficiary: account_address("bob"),
                shares: 500,
            }
        );
        assert_eq!(net.network().pending(), 0);
    }

    #[test]
    fn aborted_leg_is_claimable() {
        let mut net = devnet();
        net.inject_fault(DEVNET_HUB_CHAIN, Fault::Abort).unwrap();
        net.deposit(&deposit(DEVNET_ETHEREUM, "alice", 700, DEVNET_BSC))
            .unwrap();
        let reports = net.deliver().unwrap();
        assert!(matches!(reports[0].outcome, DeliveryOutcome::Aborted { .. }));

        let alice = account_address("alice");
        let zusdc_eth = Address::derive("zrc20.usdc.eth");
        assert_eq!(
            net.refunds(&alice).unwrap(),
            vec![RefundEntry {
                asset: zusdc_eth,
                amount: 700,
            }]
        );
        assert_eq!(net.claim("alice", zusdc_eth).unwrap(), 700);
        assert!(net.refunds(&alice).unwrap().is_empty());
        assert!(matches!(
            net.claim("alice", zusdc_eth),
            Err(DevnetError::Rejected(_))
        ));
    }

    #[test]
    fn yield_raises_total_assets() {
        let mut net = devnet();
        net.deposit(&deposit(DEVNET_BSC, "bob", 1_000, DEVNET_BSC))
            .unwrap();
        let snapshot = net.add_yield(DEVNET_BSC, 100).unwrap();
        assert_eq!(snapshot.underlying, 1_100);
        // 10% of the growth is booked as fee.
        assert_eq!(snapshot.total_assets, 1_090);
    }

    #[test]
    fn unknown_chains_and_missing_vaults_are_reported() {
        let mut net = devnet();
        assert!(matches!(
            net.deposit(&deposit(ChainId(31337), "alice", 1, DEVNET_BSC)),
            Err(DevnetError::UnknownChain(ChainId(31337)))
        ));
        assert!(matches!(
            net.add_yield(DEVNET_ETHEREUM, 1),
            Err(DevnetError::NoVault(DEVNET_ETHEREUM))
        ));
        assert!(matches!(
            net.withdraw(&withdraw(DEVNET_ETHEREUM, "alice", 1, DEVNET_ETHEREUM, DEVNET_ETHEREUM)),
            Err(DevnetError::NoVault(DEVNET_ETHEREUM))
        ));
    }
}
