//! A three-chain world shared by the integration tests.
//!
//! ```text
//!   ethereum (1)            hub (7000)                 bsc (56)
//!   entry.eth  ──────────▶  hub  ◀─────────────────▶  entry.bsc
//!                           vault.hub (usdc.hub)      vault.bsc (usdc.bsc)
//! ```
//!
//! The hub holds a large gas float, so unless a test drains it no
//! principal is spent on gas.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};

use nexus_contracts::chain::{CallOutcome, Chain, ChainError, ChainState};
use nexus_contracts::entry::{Entry, EntryConfig};
use nexus_contracts::hub::{Hub, HubConfig};
use nexus_contracts::network::{AssetBridge, DeliveryReport, LocalNetwork};
use nexus_contracts::vault::{Vault, VaultConfig};
use nexus_protocol::config::{DEVNET_BSC, DEVNET_ETHEREUM, DEVNET_HUB_CHAIN};
use nexus_protocol::crypto::{Keypair, WithdrawIntent};
use nexus_protocol::lending::LendingPool;
use nexus_protocol::swap::Rate;
use nexus_protocol::transport::GasPrice;
use nexus_protocol::types::{Address, AssetId, ChainId, ProtocolId, VaultKey};
use nexus_protocol::wire::{CallContext, DepositContext, WithdrawAuthorization, WithdrawContext};

pub const HUB: ChainId = DEVNET_HUB_CHAIN;
pub const ETH: ChainId = DEVNET_ETHEREUM;
pub const BSC: ChainId = DEVNET_BSC;
pub const PROTOCOL: ProtocolId = ProtocolId(1);
pub const NOW: i64 = 1_700_000_000;
pub const GAS_LIMIT: u64 = 50;
pub const GAS_FLOAT: u64 = 1_000_000;

#[derive(Clone, Copy)]
pub struct Assets {
    pub usdc_eth: AssetId,
    pub usdc_bsc: AssetId,
    pub usdc_hub: AssetId,
    pub zusdc_eth: AssetId,
    pub zusdc_bsc: AssetId,
    pub zgas_eth: AssetId,
    pub zgas_bnb: AssetId,
}

#[derive(Clone, Copy)]
pub struct Contracts {
    pub owner: Address,
    pub guardian: Address,
    pub hub: Address,
    pub entry_eth: Address,
    pub entry_bsc: Address,
    pub vault_bsc: Address,
    pub vault_hub: Address,
    pub pool_bsc: Address,
    pub pool_hub: Address,
}

pub struct World {
    pub net: LocalNetwork,
    pub assets: Assets,
    pub contracts: Contracts,
}

impl World {
    pub fn new() -> Self {
        Self::with_fee(0)
    }

    pub fn with_fee(fee_bps: u16) -> Self {
        let assets = Assets {
            usdc_eth: Address::derive("usdc.eth"),
            usdc_bsc: Address::derive("usdc.bsc"),
            usdc_hub: Address::derive("usdc.hub"),
            zusdc_eth: Address::derive("zrc20.usdc.eth"),
            zusdc_bsc: Address::derive("zrc20.usdc.bsc"),
            zgas_eth: Address::derive("zrc20.eth"),
            zgas_bnb: Address::derive("zrc20.bnb"),
        };
        let c = Contracts {
            owner: Address::derive("protocol-owner"),
            guardian: Address::derive("guardian"),
            hub: Address::derive("hub"),
            entry_eth: Address::derive("entry.eth"),
            entry_bsc: Address::derive("entry.bsc"),
            vault_bsc: Address::derive("vault.bsc"),
            vault_hub: Address::derive("vault.hub"),
            pool_bsc: Address::derive("pool.bsc"),
            pool_hub: Address::derive("pool.hub"),
        };

        let mut bridge = AssetBridge::new();
        bridge.link(&[(ETH, assets.usdc_eth), (HUB, assets.zusdc_eth)]);
        bridge.link(&[(BSC, assets.usdc_bsc), (HUB, assets.zusdc_bsc)]);
        let mut net = LocalNetwork::new(HUB, bridge);

        // Hub chain.
        let mut hub_state = ChainState::new(HUB);
        let stables = [assets.usdc_hub, assets.zusdc_eth, assets.zusdc_bsc];
        for (i, a) in stables.iter().enumerate() {
            for b in &stables[i + 1..] {
                hub_state.router.set_pair(*a, *b, Rate::PAR);
            }
            hub_state.router.set_pair(*a, assets.zgas_eth, Rate::new(1, 2));
            hub_state.router.set_pair(*a, assets.zgas_bnb, Rate::new(1, 1));
        }
        let router = hub_state.router.address();
        for asset in stables.iter().chain([&assets.zgas_eth, &assets.zgas_bnb]) {
            hub_state.tokens.mint(asset, &router, 100_000_000).unwrap();
        }
        hub_state
            .gateway
            .set_gas_price(ETH, GasPrice { asset: assets.zgas_eth, per_gas: 1 });
        hub_state
            .gateway
            .set_gas_price(BSC, GasPrice { asset: assets.zgas_bnb, per_gas: 1 });
        hub_state.tokens.mint(&assets.zgas_eth, &c.hub, GAS_FLOAT).unwrap();
        hub_state.tokens.mint(&assets.zgas_bnb, &c.hub, GAS_FLOAT).unwrap();
        hub_state
            .pools
            .insert(c.pool_hub, LendingPool::new(c.pool_hub, assets.usdc_hub));

        let mut hub = Hub::new(HubConfig {
            address: c.hub,
            chain: HUB,
            owner: c.owner,
        });
        hub.register_entry(&c.owner, ETH, c.entry_eth).unwrap();
        hub.register_entry(&c.owner, BSC, c.entry_bsc).unwrap();
        hub.set_target_asset(&c.owner, ETH, assets.zusdc_eth).unwrap();
        hub.set_target_asset(&c.owner, BSC, assets.zusdc_bsc).unwrap();
        hub.set_target_asset(&c.owner, HUB, assets.usdc_hub).unwrap();
        hub.register_vault(&c.owner, VaultKey::new(BSC, PROTOCOL, assets.zusdc_bsc), c.vault_bsc)
            .unwrap();
        hub.register_vault(&c.owner, VaultKey::new(HUB, PROTOCOL, assets.usdc_hub), c.vault_hub)
            .unwrap();
        hub.set_guardian(&c.owner, c.guardian, true).unwrap();

        let mut hub_chain = Chain::new(hub_state);
        hub_chain.deploy_hub(hub);
        hub_chain.deploy_vault(
            Vault::new(VaultConfig {
                address: c.vault_hub,
                chain: HUB,
                asset: assets.usdc_hub,
                pool: c.pool_hub,
                hub: c.hub,
                hub_chain: HUB,
                callback: c.hub,
                owner: c.owner,
                fee_bps,
            })
            .unwrap(),
        );
        net.add_chain(hub_chain);

        // Ethereum: entry only.
        let mut eth_chain = Chain::new(ChainState::new(ETH));
        eth_chain.deploy_entry(Entry::new(EntryConfig {
            address: c.entry_eth,
            chain: ETH,
            hub: c.hub,
            hub_chain: HUB,
            asset: assets.usdc_eth,
            owner: c.owner,
        }));
        net.add_chain(eth_chain);

        // BSC: entry and vault.
        let mut bsc_state = ChainState::new(BSC);
        bsc_state
            .pools
            .insert(c.pool_bsc, LendingPool::new(c.pool_bsc, assets.usdc_bsc));
        let mut bsc_chain = Chain::new(bsc_state);
        let mut entry_bsc = Entry::new(EntryConfig {
            address: c.entry_bsc,
            chain: BSC,
            hub: c.hub,
            hub_chain: HUB,
            asset: assets.usdc_bsc,
            owner: c.owner,
        });
        entry_bsc.register_vault(&c.owner, PROTOCOL, c.vault_bsc).unwrap();
        bsc_chain.deploy_entry(entry_bsc);
        bsc_chain.deploy_vault(
            Vault::new(VaultConfig {
                address: c.vault_bsc,
                chain: BSC,
                asset: assets.usdc_bsc,
                pool: c.pool_bsc,
                hub: c.hub,
                hub_chain: HUB,
                callback: c.entry_bsc,
                owner: c.owner,
                fee_bps,
            })
            .unwrap(),
        );
        net.add_chain(bsc_chain);

        net.set_time(Utc.timestamp_opt(NOW, 0).unwrap());

        Self {
            net,
            assets,
            contracts: c,
        }
    }

    pub fn chain(&self, id: ChainId) -> &Chain {
        self.net.chain(id).unwrap()
    }

    pub fn chain_mut(&mut self, id: ChainId) -> &mut Chain {
        self.net.chain_mut(id).unwrap()
    }

    pub fn hub(&self) -> &Hub {
        self.chain(HUB).hub().unwrap()
    }

    /// The vault of `chain` (hub or bsc).
    pub fn vault_address(&self, chain: ChainId) -> Address {
        if chain == HUB {
            self.contracts.vault_hub
        } else {
            self.contracts.vault_bsc
        }
    }

    pub fn vault(&self, chain: ChainId) -> &Vault {
        self.chain(chain).vault(&self.vault_address(chain)).unwrap()
    }

    pub fn mint(&mut self, chain: ChainId, asset: AssetId, to: Address, amount: u64) {
        self.chain_mut(chain).state.tokens.mint(&asset, &to, amount).unwrap();
    }

    pub fn balance(&self, chain: ChainId, asset: AssetId, who: Address) -> u64 {
        self.chain(chain).state.tokens.balance_of(&asset, &who)
    }

    pub fn shares(&self, chain: ChainId, owner: Address) -> u64 {
        self.vault(chain).share_balance(&owner)
    }

    pub fn refund(&self, owner: Address, asset: AssetId) -> u64 {
        self.hub().refunds().outstanding(&owner, &asset)
    }

    /// Grows the vault's lending position on `chain` by `amount`.
    pub fn add_yield(&mut self, chain: ChainId, amount: u64) {
        let (vault, pool) = if chain == HUB {
            (self.contracts.vault_hub, self.contracts.pool_hub)
        } else {
            (self.contracts.vault_bsc, self.contracts.pool_bsc)
        };
        let state = &mut self.chain_mut(chain).state;
        state
            .pools
            .get_mut(&pool)
            .unwrap()
            .accrue_interest(&mut state.tokens, &vault, amount)
            .unwrap();
    }

    pub fn submit(&mut self, chain: ChainId, caller: Address, ctx: CallContext) -> Result<CallOutcome, ChainError> {
        self.chain_mut(chain).submit(&caller, &ctx)
    }

    pub fn deliver_all(&mut self) -> Vec<DeliveryReport> {
        self.net.deliver_all().unwrap()
    }

    pub fn deposit(&self, asset: AssetId, amount: u64, beneficiary: Address, target: ChainId) -> CallContext {
        CallContext::Deposit(DepositContext {
            target_chain: target,
            protocol: PROTOCOL,
            beneficiary,
            asset,
            amount,
            gas_limit: GAS_LIMIT,
            min_out: 0,
        })
    }

    /// A withdrawal submitted on `from`, signed by `owner` with its current
    /// vault nonce. No gas funds attached.
    pub fn withdraw(
        &self,
        owner: &Keypair,
        shares: u64,
        from: ChainId,
        target: ChainId,
        destination: ChainId,
    ) -> WithdrawContext {
        let nonce = self.vault(target).nonce_of(&owner.address());
        self.withdraw_with_nonce(owner, shares, from, target, destination, nonce)
    }

    pub fn withdraw_with_nonce(
        &self,
        owner: &Keypair,
        shares: u64,
        from: ChainId,
        target: ChainId,
        destination: ChainId,
        nonce: u64,
    ) -> WithdrawContext {
        let deadline = NOW + 3_600;
        let intent = WithdrawIntent {
            chain: target,
            vault: self.vault_address(target),
            sender: owner.address(),
            receiver: owner.address(),
            shares,
            destination_chain: destination,
            nonce,
            deadline,
        };
        WithdrawContext {
            target_chain: target,
            protocol: PROTOCOL,
            receiver: owner.address(),
            shares,
            destination_chain: destination,
            gas_asset: self.stable_on(from),
            gas_amount: 0,
            gas_limit: GAS_LIMIT,
            authorization: WithdrawAuthorization {
                nonce,
                deadline,
                signature: intent.sign(owner).unwrap().into_bytes(),
            },
        }
    }

    /// The stable asset users hold on `chain`.
    pub fn stable_on(&self, chain: ChainId) -> AssetId {
        match chain {
            c if c == ETH => self.assets.usdc_eth,
            c if c == BSC => self.assets.usdc_bsc,
            _ => self.assets.usdc_hub,
        }
    }
}
