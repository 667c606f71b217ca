//! Integration tests for withdrawals.
//!
//! A withdrawal can start on any chain, burn shares on any vault chain and
//! pay out on any chain. These tests walk the interesting combinations and
//! check signature replay protection along the way.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use nexus_contracts::chain::{CallOutcome, ChainError};
use nexus_contracts::compensation::CompensationState;
use nexus_contracts::entry::{EntryError, EntryOutcome};
use nexus_contracts::hub::HubOutcome;
use nexus_contracts::network::DeliveryOutcome;
use nexus_contracts::vault::{Payout, VaultError};
use nexus_protocol::crypto::Keypair;
use nexus_protocol::wire::{CallContext, Operation};

/// Alice deposits `amount` from ethereum into the bsc vault.
fn funded(amount: u64) -> (World, Keypair) {
    let mut w = World::new();
    let alice = Keypair::from_label("alice");
    w.mint(ETH, w.assets.usdc_eth, alice.address(), amount);
    w.submit(ETH, alice.address(), w.deposit(w.assets.usdc_eth, amount, alice.address(), BSC))
        .unwrap();
    w.deliver_all();
    assert_eq!(w.shares(BSC, alice.address()), amount);
    (w, alice)
}

// ---------------------------------------------------------------------------
// Cross-chain
// ---------------------------------------------------------------------------

#[test]
fn withdraw_from_remote_vault_pays_out_on_origin_chain() {
    let (mut w, alice) = funded(1_000);
    w.mint(ETH, w.assets.usdc_eth, alice.address(), 100);

    let mut ctx = w.withdraw(&alice, 500, ETH, BSC, ETH);
    ctx.gas_amount = 100;
    let outcome = w.submit(ETH, alice.address(), CallContext::Withdraw(ctx)).unwrap();
    assert!(matches!(outcome, CallOutcome::Entry(EntryOutcome::Dispatched(_))));

    let reports = w.deliver_all();
    let legs: Vec<_> = reports
        .iter()
        .map(|r| (r.origin, r.destination, r.operation))
        .collect();
    assert_eq!(
        legs,
        vec![
            (ETH, HUB, Some(Operation::Withdraw)),
            (HUB, BSC, Some(Operation::Withdraw)),
            (BSC, HUB, Some(Operation::Callback)),
            (HUB, ETH, None),
        ]
    );
    assert!(reports.iter().all(|r| r.outcome == DeliveryOutcome::Delivered));

    assert_eq!(w.shares(BSC, alice.address()), 500);
    assert_eq!(w.balance(ETH, w.assets.usdc_eth, alice.address()), 500);
    assert_eq!(w.vault(BSC).nonce_of(&alice.address()), 1);

    // The hub paid gas from its float; the attached gas funds are owed back.
    assert_eq!(w.refund(alice.address(), w.assets.zusdc_eth), 100);
    assert_eq!(w.hub().tracker().count(CompensationState::DeliveredOk), 3);
    assert_eq!(w.hub().tracker().pending(), 0);
}

#[test]
fn unspent_gas_funds_are_claimable_on_the_hub_chain() {
    let (mut w, alice) = funded(1_000);
    w.mint(ETH, w.assets.usdc_eth, alice.address(), 100);
    let mut ctx = w.withdraw(&alice, 1_000, ETH, BSC, ETH);
    ctx.gas_amount = 100;
    w.submit(ETH, alice.address(), CallContext::Withdraw(ctx)).unwrap();
    w.deliver_all();

    let zusdc_eth = w.assets.zusdc_eth;
    let claimed = w.chain_mut(HUB).claim_refund(&alice.address(), zusdc_eth).unwrap();
    assert_eq!(claimed, 100);
    assert_eq!(w.balance(HUB, zusdc_eth, alice.address()), 100);
    assert_eq!(w.refund(alice.address(), zusdc_eth), 0);
    assert!(w.hub().refunds().is_empty());
}

#[test]
fn withdraw_to_the_hub_chain_lands_on_the_hub() {
    let (mut w, alice) = funded(600);

    let ctx = w.withdraw(&alice, 600, BSC, BSC, HUB);
    let outcome = w.submit(BSC, alice.address(), CallContext::Withdraw(ctx)).unwrap();
    match outcome {
        CallOutcome::Entry(EntryOutcome::Withdrawn {
            receipt, forwarded, ..
        }) => {
            assert_eq!(receipt.assets, 600);
            assert!(matches!(receipt.payout, Payout::Forward { .. }));
            assert!(forwarded.is_some());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let reports = w.deliver_all();
    assert_eq!(reports.len(), 1);
    assert_eq!(w.balance(HUB, w.assets.zusdc_bsc, alice.address()), 600);
    assert_eq!(w.vault(BSC).total_shares(), 0);
}

#[test]
fn hub_chain_vault_pays_out_on_a_spoke() {
    let mut w = World::new();
    let alice = Keypair::from_label("alice");
    w.mint(ETH, w.assets.usdc_eth, alice.address(), 1_000);
    w.submit(ETH, alice.address(), w.deposit(w.assets.usdc_eth, 1_000, alice.address(), HUB))
        .unwrap();
    w.deliver_all();

    let ctx = w.withdraw(&alice, 400, HUB, HUB, ETH);
    let outcome = w.submit(HUB, alice.address(), CallContext::Withdraw(ctx)).unwrap();
    assert!(matches!(
        outcome,
        CallOutcome::Hub(HubOutcome::Withdrawn {
            forwarded: Some(_),
            ..
        })
    ));

    w.deliver_all();
    assert_eq!(w.shares(HUB, alice.address()), 600);
    assert_eq!(w.balance(ETH, w.assets.usdc_eth, alice.address()), 400);
}

#[test]
fn hub_chain_user_gets_leftover_gas_back_directly() {
    let mut w = World::new();
    let carol = Keypair::from_label("carol");
    w.mint(HUB, w.assets.usdc_hub, carol.address(), 730);
    w.submit(HUB, carol.address(), w.deposit(w.assets.usdc_hub, 700, carol.address(), BSC))
        .unwrap();
    w.deliver_all();

    let mut ctx = w.withdraw(&carol, 700, HUB, BSC, HUB);
    ctx.gas_amount = 30;
    w.submit(HUB, carol.address(), CallContext::Withdraw(ctx)).unwrap();
    w.deliver_all();

    assert_eq!(w.balance(HUB, w.assets.usdc_hub, carol.address()), 30);
    assert_eq!(w.balance(HUB, w.assets.zusdc_bsc, carol.address()), 700);
    assert!(w.hub().refunds().is_empty());
}

// ---------------------------------------------------------------------------
// Same chain
// ---------------------------------------------------------------------------

#[test]
fn same_chain_withdraw_includes_yield_net_of_fee() {
    let mut w = World::with_fee(1_000);
    let alice = Keypair::from_label("alice");
    w.mint(BSC, w.assets.usdc_bsc, alice.address(), 1_000);
    w.submit(BSC, alice.address(), w.deposit(w.assets.usdc_bsc, 1_000, alice.address(), BSC))
        .unwrap();
    w.add_yield(BSC, 100);

    let ctx = w.withdraw(&alice, 1_000, BSC, BSC, BSC);
    let outcome = w.submit(BSC, alice.address(), CallContext::Withdraw(ctx)).unwrap();
    match outcome {
        CallOutcome::Entry(EntryOutcome::Withdrawn {
            receipt, forwarded, ..
        }) => {
            assert_eq!(receipt.assets, 1_090);
            assert!(forwarded.is_none());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(w.balance(BSC, w.assets.usdc_bsc, alice.address()), 1_090);
    let bsc = w.chain(BSC);
    assert_eq!(w.vault(BSC).accumulated_fee(&bsc.state).unwrap(), 10);
    assert_eq!(w.net.pending(), 0);
}

#[test]
fn withdrawing_more_than_owned_fails() {
    let (mut w, alice) = funded(100);
    let ctx = w.withdraw(&alice, 101, BSC, BSC, BSC);
    let err = w
        .submit(BSC, alice.address(), CallContext::Withdraw(ctx))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Entry(EntryError::Vault(VaultError::InsufficientShares { .. }))
    ));
    assert_eq!(w.shares(BSC, alice.address()), 100);
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn consumed_authorization_cannot_be_replayed_locally() {
    let (mut w, alice) = funded(1_000);
    let ctx = w.withdraw(&alice, 100, BSC, BSC, BSC);

    w.submit(BSC, alice.address(), CallContext::Withdraw(ctx.clone()))
        .unwrap();
    let err = w
        .submit(BSC, alice.address(), CallContext::Withdraw(ctx))
        .unwrap_err();

    assert!(matches!(
        err,
        ChainError::Entry(EntryError::Vault(VaultError::NonceMismatch { expected: 1, got: 0, .. }))
    ));
    assert_eq!(w.shares(BSC, alice.address()), 900);
}

#[test]
fn replayed_cross_chain_withdraw_reverts_at_the_vault() {
    let (mut w, alice) = funded(1_000);
    let ctx = w.withdraw(&alice, 300, ETH, BSC, ETH);

    w.submit(ETH, alice.address(), CallContext::Withdraw(ctx.clone()))
        .unwrap();
    w.deliver_all();
    w.submit(ETH, alice.address(), CallContext::Withdraw(ctx)).unwrap();
    let reports = w.deliver_all();

    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[1].outcome, DeliveryOutcome::Reverted { .. }));
    assert_eq!(w.shares(BSC, alice.address()), 700);
    assert_eq!(w.balance(ETH, w.assets.usdc_eth, alice.address()), 300);
    assert_eq!(w.hub().tracker().count(CompensationState::RevertedPreCustody), 1);
}

#[test]
fn expired_authorization_is_rejected() {
    let (mut w, alice) = funded(1_000);
    let ctx = w.withdraw(&alice, 100, BSC, BSC, BSC);
    w.net.set_time(Utc.timestamp_opt(NOW + 7_200, 0).unwrap());

    let err = w
        .submit(BSC, alice.address(), CallContext::Withdraw(ctx))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Entry(EntryError::Vault(VaultError::Expired { .. }))
    ));
}

#[test]
fn authorization_signed_by_someone_else_is_rejected() {
    let (mut w, alice) = funded(1_000);
    let mallory = Keypair::from_label("mallory");

    // Mallory signs a request to withdraw Alice's shares and submits it as Alice.
    let mut ctx = w.withdraw(&mallory, 1_000, BSC, BSC, BSC);
    ctx.receiver = alice.address();
    let err = w
        .submit(BSC, alice.address(), CallContext::Withdraw(ctx))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Entry(EntryError::Vault(VaultError::Signature(_)))
    ));
    assert_eq!(w.shares(BSC, alice.address()), 1_000);
}
