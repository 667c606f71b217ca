//! # Devnet Topology
//!
//! The JSON description of a local network: which chains exist, what
//! stable asset each one uses, how legs toward each chain are priced, where
//! vaults live and who starts with funds.
//!
//! Contract, asset and pool addresses are not written out. They are derived
//! from labels (`entry.<chain>`, `vault.<chain>`, `zrc20.<stable>`, ...), so
//! a topology file stays short and two nodes loading the same file agree on
//! every address.
//!
//! ```json
//! {
//!   "name": "devnet",
//!   "hub_chain": 7000,
//!   "owner": "protocol-owner",
//!   "gas_float": 1000000,
//!   "router_reserve": 100000000,
//!   "chains": [
//!     { "id": 7000, "name": "hub", "stable": "usdc.hub", "vault": { "fee_bps": 1000 } },
//!     { "id": 1, "name": "ethereum", "stable": "usdc.eth",
//!       "gas": { "asset": "eth", "per_gas": 1, "rate": { "numerator": 1, "denominator": 2 } } }
//!   ],
//!   "balances": [ { "chain": 1, "account": "alice", "amount": 10000 } ]
//! }
//! ```

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use nexus_protocol::config::{
    chain_name, DEVNET_BSC, DEVNET_ETHEREUM, DEVNET_HUB_CHAIN, MAX_FEE_BPS,
};
use nexus_protocol::crypto::Keypair;
use nexus_protocol::swap::Rate;
use nexus_protocol::types::{Address, AssetId, ChainId, ProtocolId};

/// A whole network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Topology {
    pub name: String,
    pub hub_chain: ChainId,
    #[serde(default = "default_protocol")]
    pub protocol: ProtocolId,
    /// Label of the account that owns every contract.
    pub owner: String,
    #[serde(default)]
    pub guardians: Vec<String>,
    /// Gas tokens the hub starts with, per destination gas asset.
    pub gas_float: u64,
    /// Reserves the hub router holds of every asset it trades.
    pub router_reserve: u64,
    pub chains: Vec<ChainSpec>,
    /// Stable-asset balances minted at startup.
    #[serde(default)]
    pub balances: Vec<SeedBalance>,
}

/// One chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSpec {
    pub id: ChainId,
    pub name: String,
    /// Label of the stable asset users hold here.
    pub stable: String,
    /// How legs toward this chain are paid for. Required on spokes.
    #[serde(default)]
    pub gas: Option<GasSpec>,
    /// Whether a spoke gets an Entry. Ignored on the hub chain.
    #[serde(default = "default_true")]
    pub entry: bool,
    #[serde(default)]
    pub vault: Option<VaultSpec>,
}

/// Gas pricing toward a spoke.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GasSpec {
    /// Label of the native gas token. Its hub-side form is `zrc20.<asset>`.
    pub asset: String,
    pub per_gas: u64,
    /// Gas tokens received per unit of any stable on the hub router.
    pub rate: Rate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultSpec {
    pub fee_bps: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedBalance {
    pub chain: ChainId,
    /// Devnet key label of the holder.
    pub account: String,
    pub amount: u64,
}

fn default_protocol() -> ProtocolId {
    ProtocolId(1)
}

fn default_true() -> bool {
    true
}

/// Address of a devnet account: the public key of `Keypair::from_label`.
/// A `0x`-prefixed 64-digit hex string is taken as a literal address.
pub fn account_address(account: &str) -> Address {
    if account.starts_with("0x") {
        if let Ok(address) = account.parse() {
            return address;
        }
    }
    Keypair::from_label(account).address()
}

/// Hub-side form of an asset that lives on a spoke.
pub fn hub_representation(label: &str) -> AssetId {
    Address::derive(&format!("zrc20.{label}"))
}

impl ChainSpec {
    pub fn stable_asset(&self) -> AssetId {
        Address::derive(&self.stable)
    }

    /// The asset the hub uses for this chain's stable.
    pub fn hub_asset(&self, hub_chain: ChainId) -> AssetId {
        if self.id == hub_chain {
            self.stable_asset()
        } else {
            hub_representation(&self.stable)
        }
    }

    pub fn gas_asset(&self) -> Option<AssetId> {
        self.gas.as_ref().map(|g| hub_representation(&g.asset))
    }

    pub fn entry_address(&self) -> Address {
        Address::derive(&format!("entry.{}", self.name))
    }

    pub fn vault_address(&self) -> Address {
        Address::derive(&format!("vault.{}", self.name))
    }

    pub fn pool_address(&self) -> Address {
        Address::derive(&format!("pool.{}", self.name))
    }
}

impl Topology {
    /// Reads, parses and validates a topology file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read topology {}", path.display()))?;
        let topology: Topology = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse topology {}", path.display()))?;
        topology
            .validate()
            .with_context(|| format!("invalid topology {}", path.display()))?;
        Ok(topology)
    }

    /// The built-in three-chain network: the hub, ethereum (entry only)
    /// and bsc (entry and vault). The hub chain has a vault too.
    pub fn devnet() -> Self {
        let chain = |id: ChainId, stable: &str| ChainSpec {
            id,
            name: chain_name(id),
            stable: stable.to_string(),
            gas: None,
            entry: true,
            vault: None,
        };
        let hub = ChainSpec {
            vault: Some(VaultSpec { fee_bps: 1_000 }),
            ..chain(DEVNET_HUB_CHAIN, "usdc.hub")
        };
        let ethereum = ChainSpec {
            gas: Some(GasSpec {
                asset: "eth".into(),
                per_gas: 1,
                rate: Rate::new(1, 2),
            }),
            ..chain(DEVNET_ETHEREUM, "usdc.eth")
        };
        let bsc = ChainSpec {
            gas: Some(GasSpec {
                asset: "bnb".into(),
                per_gas: 1,
                rate: Rate::PAR,
            }),
            vault: Some(VaultSpec { fee_bps: 1_000 }),
            ..chain(DEVNET_BSC, "usdc.bsc")
        };

        Self {
            name: "devnet".into(),
            hub_chain: DEVNET_HUB_CHAIN,
            protocol: default_protocol(),
            owner: "protocol-owner".into(),
            guardians: vec!["guardian".into()],
            gas_float: 1_000_000,
            router_reserve: 100_000_000,
            chains: vec![hub, ethereum, bsc],
            balances: vec![
                SeedBalance {
                    chain: DEVNET_ETHEREUM,
                    account: "alice".into(),
                    amount: 100_000,
                },
                SeedBalance {
                    chain: DEVNET_BSC,
                    account: "bob".into(),
                    amount: 100_000,
                },
                SeedBalance {
                    chain: DEVNET_HUB_CHAIN,
                    account: "carol".into(),
                    amount: 100_000,
                },
            ],
        }
    }

    pub fn chain(&self, id: ChainId) -> Option<&ChainSpec> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn hub(&self) -> Option<&ChainSpec> {
        self.chain(self.hub_chain)
    }

    /// Spokes in file order.
    pub fn spokes(&self) -> impl Iterator<Item = &ChainSpec> {
        let hub_chain = self.hub_chain;
        self.chains.iter().filter(move |c| c.id != hub_chain)
    }

    /// Checks everything building the network relies on.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.chains.is_empty(), "topology has no chains");
        ensure!(
            self.hub().is_some(),
            "hub chain {} is not among the chains",
            self.hub_chain
        );

        let mut ids = BTreeSet::new();
        let mut names = BTreeSet::new();
        let mut stables = BTreeSet::new();
        for chain in &self.chains {
            ensure!(ids.insert(chain.id), "chain {} is listed twice", chain.id);
            ensure!(!chain.name.is_empty(), "chain {} has no name", chain.id);
            ensure!(names.insert(&chain.name), "chain name {} is used twice", chain.name);
            ensure!(
                stables.insert(&chain.stable),
                "stable asset {} is used by two chains",
                chain.stable
            );
            if let Some(vault) = &chain.vault {
                ensure!(
                    vault.fee_bps <= MAX_FEE_BPS,
                    "vault fee on {} is {} bps, the cap is {}",
                    chain.name,
                    vault.fee_bps,
                    MAX_FEE_BPS
                );
            }
        }

        for spoke in self.spokes() {
            let gas = spoke
                .gas
                .as_ref()
                .with_context(|| format!("spoke {} has no gas pricing", spoke.name))?;
            ensure!(
                gas.rate.numerator > 0 && gas.rate.denominator > 0,
                "gas rate toward {} must be positive",
                spoke.name
            );
            ensure!(
                spoke.vault.is_none() || spoke.entry,
                "spoke {} has a vault but no entry to call back through",
                spoke.name
            );
        }

        ensure!(
            self.chains.iter().any(|c| c.vault.is_some()),
            "topology has no vaults"
        );

        for seed in &self.balances {
            ensure!(
                self.chain(seed.chain).is_some(),
                "balance for {} on unknown chain {}",
                seed.account,
                seed.chain
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn builtin_devnet_is_valid() {
        let topology = Topology::devnet();
        topology.validate().unwrap();
        assert_eq!(topology.spokes().count(), 2);
        assert_eq!(topology.hub().unwrap().name, "hub");
    }

    #[test]
    fn file_roundtrip() {
        let topology = Topology::devnet();
        let file = write_temp(&serde_json::to_string_pretty(&topology).unwrap());
        let loaded = Topology::load(file.path()).unwrap();
        assert_eq!(loaded, topology);
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let file = write_temp(
            r#"{
                "name": "tiny",
                "hub_chain": 7000,
                "owner": "owner",
                "gas_float": 10,
                "router_reserve": 10,
                "chains": [
                    { "id": 7000, "name": "hub", "stable": "usdc.hub", "vault": { "fee_bps": 0 } }
                ]
            }"#,
        );
        let topology = Topology::load(file.path()).unwrap();
        assert_eq!(topology.protocol, ProtocolId(1));
        assert!(topology.guardians.is_empty());
        assert!(topology.balances.is_empty());
        assert!(topology.chains[0].entry);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_temp(r#"{ "name": "x", "hub_chain": 1, "validators": [] }"#);
        let err = Topology::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse topology"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = Topology::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn hub_chain_must_be_listed() {
        let mut topology = Topology::devnet();
        topology.hub_chain = ChainId(999);
        assert!(topology.validate().is_err());
    }

    #[test]
    fn duplicate_chain_ids_are_rejected() {
        let mut topology = Topology::devnet();
        let mut copy = topology.chains[1].clone();
        copy.name = "ethereum-2".into();
        copy.stable = "usdc.eth2".into();
        topology.chains.push(copy);
        let err = topology.validate().unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn spokes_need_gas_pricing() {
        let mut topology = Topology::devnet();
        topology.chains[1].gas = None;
        let err = topology.validate().unwrap_err();
        assert!(err.to_string().contains("no gas pricing"));
    }

    #[test]
    fn vault_fee_is_capped() {
        let mut topology = Topology::devnet();
        topology.chains[2].vault = Some(VaultSpec {
            fee_bps: MAX_FEE_BPS + 1,
        });
        assert!(topology.validate().is_err());
    }

    #[test]
    fn spoke_vault_needs_an_entry() {
        let mut topology = Topology::devnet();
        topology.chains[2].entry = false;
        assert!(topology.validate().is_err());
    }

    #[test]
    fn seed_balances_must_target_known_chains() {
        let mut topology = Topology::devnet();
        topology.balances.push(SeedBalance {
            chain: ChainId(31337),
            account: "dave".into(),
            amount: 1,
        });
        assert!(topology.validate().is_err());
    }

    #[test]
    fn derived_addresses() {
        let topology = Topology::devnet();
        let hub = topology.hub().unwrap();
        let bsc = topology.chain(DEVNET_BSC).unwrap();

        assert_eq!(hub.hub_asset(topology.hub_chain), Address::derive("usdc.hub"));
        assert_eq!(bsc.hub_asset(topology.hub_chain), Address::derive("zrc20.usdc.bsc"));
        assert_eq!(bsc.gas_asset(), Some(Address::derive("zrc20.bnb")));
        assert_eq!(bsc.vault_address(), Address::derive("vault.bsc"));
    }

    #[test]
    fn accounts_resolve_from_labels_or_hex() {
        let alice = Keypair::from_label("alice").address();
        assert_eq!(account_address("alice"), alice);
        assert_eq!(account_address(&alice.to_hex()), alice);
    }
}
