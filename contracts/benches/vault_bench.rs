// Vault accounting benchmarks.
//
// Share conversions, a deposit/redeem cycle against a lending pool, and
// the signed withdrawal path that dominates cross-chain redemptions.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use nexus_contracts::chain::ChainState;
use nexus_contracts::vault::{
    convert_to_assets, convert_to_shares, Vault, VaultConfig, WithdrawAuth, WithdrawRequest,
};
use nexus_protocol::crypto::{Keypair, WithdrawIntent};
use nexus_protocol::lending::LendingPool;
use nexus_protocol::types::{Address, ChainId};
use nexus_protocol::wire::WithdrawAuthorization;

const CHAIN: ChainId = ChainId(56);

fn vault_with_depositors(depositors: usize) -> (ChainState, Vault) {
    let usdc = Address::derive("usdc.bsc");
    let pool = Address::derive("pool.bsc");
    let mut state = ChainState::new(CHAIN);
    state.pools.insert(pool, LendingPool::new(pool, usdc));
    let mut vault = Vault::new(VaultConfig {
        address: Address::derive("vault.bsc"),
        chain: CHAIN,
        asset: usdc,
        pool,
        hub: Address::derive("hub"),
        hub_chain: ChainId(7000),
        callback: Address::derive("entry.bsc"),
        owner: Address::derive("owner"),
        fee_bps: 1_000,
    })
    .unwrap();

    for i in 0..depositors {
        let user = Address::derive(&format!("user-{i}"));
        state.tokens.mint(&usdc, &user, 1_000_000).unwrap();
        vault.deposit(&mut state, &user, 1_000_000, user).unwrap();
    }
    (state, vault)
}

fn bench_conversions(c: &mut Criterion) {
    c.bench_function("vault/convert_to_shares", |b| {
        b.iter(|| convert_to_shares(black_box(123_456_789), black_box(9_876_543_210), black_box(10_123_456_789)))
    });
    c.bench_function("vault/convert_to_assets", |b| {
        b.iter(|| convert_to_assets(black_box(123_456_789), black_box(9_876_543_210), black_box(10_123_456_789)))
    });
}

fn bench_deposit_redeem(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/deposit_redeem");
    for depositors in [1usize, 100, 1_000] {
        let (state, vault) = vault_with_depositors(depositors);
        let alice = Address::derive("alice");
        let request = WithdrawRequest {
            owner: alice,
            receiver: alice,
            shares: 0,
            destination_chain: CHAIN,
            gas_limit: 0,
        };

        group.bench_with_input(BenchmarkId::from_parameter(depositors), &depositors, |b, _| {
            b.iter_batched(
                || (state.clone(), vault.clone()),
                |(mut state, mut vault)| {
                    state.tokens.mint(&vault.asset(), &alice, 50_000).unwrap();
                    let shares = vault.deposit(&mut state, &alice, 50_000, alice).unwrap();
                    let request = WithdrawRequest { shares, ..request.clone() };
                    vault
                        .withdraw(&mut state, &alice, &request, &WithdrawAuth::Owner)
                        .unwrap()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_signed_withdraw(c: &mut Criterion) {
    let alice = Keypair::from_label("alice");
    let (mut state, mut vault) = vault_with_depositors(10);
    state.tokens.mint(&vault.asset(), &alice.address(), 1_000_000).unwrap();
    vault
        .deposit(&mut state, &alice.address(), 1_000_000, alice.address())
        .unwrap();

    let deadline = state.now.timestamp() + 3_600;
    let intent = WithdrawIntent {
        chain: CHAIN,
        vault: vault.address(),
        sender: alice.address(),
        receiver: alice.address(),
        shares: 10_000,
        destination_chain: ChainId(1),
        nonce: 0,
        deadline,
    };
    let auth = WithdrawAuth::Signed(WithdrawAuthorization {
        nonce: 0,
        deadline,
        signature: intent.sign(&alice).unwrap().into_bytes(),
    });
    let request = WithdrawRequest {
        owner: alice.address(),
        receiver: alice.address(),
        shares: 10_000,
        destination_chain: ChainId(1),
        gas_limit: 0,
    };
    let hub = Address::derive("hub");

    c.bench_function("vault/signed_withdraw_forward", |b| {
        b.iter_batched(
            || (state.clone(), vault.clone()),
            |(mut state, mut vault)| vault.withdraw(&mut state, &hub, &request, &auth).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_conversions, bench_deposit_redeem, bench_signed_withdraw);
criterion_main!(benches);
